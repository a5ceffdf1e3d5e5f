//! Pluggable payload codecs
//!
//! Drivers never interpret record payloads themselves. Keys and values cross the
//! driver boundary through a [`Serializer`] (producer side) or a
//! [`Deserializer`] (consumer side). Both are told the topic the payload belongs
//! to, and both treat an absent payload as absent: `None` in, `None` out.
//!
//! # Built-in codecs
//!
//! - [`YamlCodec`]: structured text, any serde value rendered as YAML
//! - [`JsonCodec`]: JSON text
//! - [`StringCodec`]: UTF-8 strings, no transformation
//! - [`KeywordCodec`]: symbolic [`Keyword`] names, typically for keys
//! - [`BytesCodec`]: raw bytes
//!
//! # Custom codecs
//!
//! Any function of `(topic, payload)` can be turned into a codec:
//!
//! ```rust
//! use streamdriver::serialization::{make_serializer, Serializer};
//!
//! let upper = make_serializer(|_topic: &str, value: &String| Ok(value.to_uppercase().into_bytes()));
//! let bytes = upper.serialize("events", Some(&"hi".to_string())).unwrap();
//! assert_eq!(bytes, Some(b"HI".to_vec()));
//! ```

mod error;
mod json_codec;
mod keyword_codec;
mod string_codec;
mod yaml_codec;

pub use error::SerializationError;
pub use json_codec::JsonCodec;
pub use keyword_codec::{Keyword, KeywordCodec};
pub use string_codec::{BytesCodec, StringCodec};
pub use yaml_codec::YamlCodec;

use std::collections::HashMap;
use std::marker::PhantomData;

/// Encodes values of type `T` into payload bytes.
///
/// `configure` and `close` are lifecycle hooks invoked by the producer factory
/// and by `ProducerDriver::close`. Codecs in this crate are stateless, so the
/// default implementations do nothing.
pub trait Serializer<T>: Send + Sync {
    fn serialize(&self, topic: &str, data: Option<&T>) -> Result<Option<Vec<u8>>, SerializationError>;

    fn configure(&self, _configs: &HashMap<String, String>, _is_key: bool) {}

    fn close(&self) {}
}

/// Decodes payload bytes into values of type `T`.
pub trait Deserializer<T>: Send + Sync {
    fn deserialize(&self, topic: &str, data: Option<&[u8]>) -> Result<Option<T>, SerializationError>;

    fn configure(&self, _configs: &HashMap<String, String>, _is_key: bool) {}

    fn close(&self) {}
}

/// Adapter holding an encode function as its only state.
pub struct FnSerializer<T, F> {
    encode: F,
    _phantom: PhantomData<fn(&T)>,
}

/// Adapter holding a decode function as its only state.
pub struct FnDeserializer<T, F> {
    decode: F,
    _phantom: PhantomData<fn() -> T>,
}

/// Wraps `(topic, value) -> bytes` into a [`Serializer`].
///
/// The function only sees present values; an absent payload stays absent.
pub fn make_serializer<T, F>(encode: F) -> FnSerializer<T, F>
where
    F: Fn(&str, &T) -> Result<Vec<u8>, SerializationError> + Send + Sync,
{
    FnSerializer {
        encode,
        _phantom: PhantomData,
    }
}

/// Wraps `(topic, bytes) -> value` into a [`Deserializer`].
pub fn make_deserializer<T, F>(decode: F) -> FnDeserializer<T, F>
where
    F: Fn(&str, &[u8]) -> Result<T, SerializationError> + Send + Sync,
{
    FnDeserializer {
        decode,
        _phantom: PhantomData,
    }
}

impl<T, F> Serializer<T> for FnSerializer<T, F>
where
    F: Fn(&str, &T) -> Result<Vec<u8>, SerializationError> + Send + Sync,
{
    fn serialize(&self, topic: &str, data: Option<&T>) -> Result<Option<Vec<u8>>, SerializationError> {
        data.map(|value| (self.encode)(topic, value)).transpose()
    }
}

impl<T, F> Deserializer<T> for FnDeserializer<T, F>
where
    F: Fn(&str, &[u8]) -> Result<T, SerializationError> + Send + Sync,
{
    fn deserialize(&self, topic: &str, data: Option<&[u8]>) -> Result<Option<T>, SerializationError> {
        data.map(|bytes| (self.decode)(topic, bytes)).transpose()
    }
}
