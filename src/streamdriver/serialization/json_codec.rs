//! JSON codec
//!
//! The decode target type decides how maps come back: `serde_json::Value` or a
//! `String`-keyed map gives string keys, a map keyed by [`Keyword`] gives
//! keyword keys.
//!
//! [`Keyword`]: super::Keyword

use super::{Deserializer, SerializationError, Serializer};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;

/// JSON text codec for any serde type
pub struct JsonCodec<T> {
    _phantom: PhantomData<fn() -> T>,
}

impl<T> JsonCodec<T> {
    pub fn new() -> Self {
        JsonCodec {
            _phantom: PhantomData,
        }
    }
}

impl<T> Default for JsonCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for JsonCodec<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T: Serialize> Serializer<T> for JsonCodec<T> {
    fn serialize(&self, _topic: &str, data: Option<&T>) -> Result<Option<Vec<u8>>, SerializationError> {
        match data {
            Some(value) => Ok(Some(serde_json::to_vec(value)?)),
            None => Ok(None),
        }
    }
}

impl<T: DeserializeOwned> Deserializer<T> for JsonCodec<T> {
    fn deserialize(&self, _topic: &str, data: Option<&[u8]>) -> Result<Option<T>, SerializationError> {
        match data {
            Some(bytes) => Ok(Some(serde_json::from_slice(bytes)?)),
            None => Ok(None),
        }
    }
}
