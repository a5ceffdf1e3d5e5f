//! Keyword codec
//!
//! A [`Keyword`] is a compact symbolic identity. On the wire it is nothing but
//! its UTF-8 name, which makes it a good fit for record keys.

use super::{Deserializer, SerializationError, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Symbolic name, cheap to clone and compared by name.
///
/// Serializes as a plain string so it can key maps decoded by other codecs.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Keyword(Arc<str>);

impl Keyword {
    pub fn new(name: impl AsRef<str>) -> Self {
        Keyword(Arc::from(name.as_ref()))
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Keyword {
    fn from(name: &str) -> Self {
        Keyword::new(name)
    }
}

impl From<String> for Keyword {
    fn from(name: String) -> Self {
        Keyword(Arc::from(name))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordCodec;

impl Serializer<Keyword> for KeywordCodec {
    fn serialize(&self, _topic: &str, data: Option<&Keyword>) -> Result<Option<Vec<u8>>, SerializationError> {
        Ok(data.map(|keyword| keyword.name().as_bytes().to_vec()))
    }
}

impl Deserializer<Keyword> for KeywordCodec {
    fn deserialize(&self, _topic: &str, data: Option<&[u8]>) -> Result<Option<Keyword>, SerializationError> {
        data.map(|bytes| -> Result<Keyword, SerializationError> {
            Ok(Keyword::new(std::str::from_utf8(bytes)?))
        })
        .transpose()
    }
}
