//! Structured-text codec
//!
//! Renders any serde value as YAML text, a generic data-literal syntax that
//! covers maps, sequences, strings, numbers and booleans without a schema.

use super::{Deserializer, SerializationError, Serializer};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;

pub struct YamlCodec<T> {
    _phantom: PhantomData<fn() -> T>,
}

impl<T> YamlCodec<T> {
    pub fn new() -> Self {
        YamlCodec {
            _phantom: PhantomData,
        }
    }
}

impl<T> Default for YamlCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for YamlCodec<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T: Serialize> Serializer<T> for YamlCodec<T> {
    fn serialize(&self, _topic: &str, data: Option<&T>) -> Result<Option<Vec<u8>>, SerializationError> {
        match data {
            Some(value) => Ok(Some(serde_yaml::to_string(value)?.into_bytes())),
            None => Ok(None),
        }
    }
}

impl<T: DeserializeOwned> Deserializer<T> for YamlCodec<T> {
    fn deserialize(&self, _topic: &str, data: Option<&[u8]>) -> Result<Option<T>, SerializationError> {
        match data {
            Some(bytes) => {
                let text = std::str::from_utf8(bytes)?;
                Ok(Some(serde_yaml::from_str(text)?))
            }
            None => Ok(None),
        }
    }
}
