use rdkafka::message::{Header, Headers as KafkaHeaders, OwnedHeaders};
use std::sync::Arc;

/// Record headers in broker delivery order
///
/// Kafka allows a key to repeat, so headers are an ordered list rather than a
/// map; [`Headers::get`] returns the last value written for a key. Values are
/// raw bytes and may be null. Cloning shares the underlying list.
///
/// ```rust
/// # use streamdriver::Headers;
/// let headers = Headers::new()
///     .insert("source", "web-api")
///     .insert("source", "retry")
///     .insert_null("trace");
///
/// assert_eq!(headers.get("source"), Some(&b"retry"[..]));
/// assert_eq!(headers.get_str("source"), Some("retry"));
/// assert_eq!(headers.len(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Headers {
    inner: Arc<Vec<(String, Option<Vec<u8>>)>>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a header, keeping earlier entries with the same key
    pub fn insert(mut self, key: impl Into<String>, value: impl AsRef<[u8]>) -> Self {
        Arc::make_mut(&mut self.inner).push((key.into(), Some(value.as_ref().to_vec())));
        self
    }

    /// Append a header with a null value
    pub fn insert_null(mut self, key: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.inner).push((key.into(), None));
        self
    }

    /// Last value written for `key`; `None` when absent or null
    pub fn get(&self, key: &str) -> Option<&[u8]> {
        self.inner
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| v.as_deref())
    }

    /// Like [`Headers::get`], for values that are valid UTF-8
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|v| std::str::from_utf8(v).ok())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.iter().any(|(k, _)| k == key)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&[u8]>)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    pub(crate) fn to_rdkafka_headers(&self) -> OwnedHeaders {
        self.inner.iter().fold(
            OwnedHeaders::new_with_capacity(self.inner.len()),
            |headers, (key, value)| {
                headers.insert(Header {
                    key,
                    value: value.as_deref(),
                })
            },
        )
    }

    pub(crate) fn from_rdkafka_headers<H: KafkaHeaders>(kafka_headers: &H) -> Self {
        let entries = (0..kafka_headers.count())
            .map(|i| {
                let header = kafka_headers.get(i);
                (header.key.to_string(), header.value.map(<[u8]>::to_vec))
            })
            .collect();
        Self {
            inner: Arc::new(entries),
        }
    }
}
