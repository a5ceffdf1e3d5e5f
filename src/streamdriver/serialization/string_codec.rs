use super::{Deserializer, SerializationError, Serializer};

/// UTF-8 string codec that performs no transformation
#[derive(Debug, Clone, Copy, Default)]
pub struct StringCodec;

impl Serializer<String> for StringCodec {
    fn serialize(&self, _topic: &str, data: Option<&String>) -> Result<Option<Vec<u8>>, SerializationError> {
        Ok(data.map(|value| value.as_bytes().to_vec()))
    }
}

impl Deserializer<String> for StringCodec {
    fn deserialize(&self, _topic: &str, data: Option<&[u8]>) -> Result<Option<String>, SerializationError> {
        data.map(|bytes| -> Result<String, SerializationError> {
            Ok(String::from_utf8(bytes.to_vec())?)
        })
        .transpose()
    }
}

/// Raw bytes codec that hands payloads through untouched
#[derive(Debug, Clone, Copy, Default)]
pub struct BytesCodec;

impl Serializer<Vec<u8>> for BytesCodec {
    fn serialize(&self, _topic: &str, data: Option<&Vec<u8>>) -> Result<Option<Vec<u8>>, SerializationError> {
        Ok(data.cloned())
    }
}

impl Deserializer<Vec<u8>> for BytesCodec {
    fn deserialize(&self, _topic: &str, data: Option<&[u8]>) -> Result<Option<Vec<u8>>, SerializationError> {
        Ok(data.map(<[u8]>::to_vec))
    }
}
