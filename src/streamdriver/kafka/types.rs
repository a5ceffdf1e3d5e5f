//! Canonical data shapes exchanged between drivers and application code
//!
//! Everything here is plain data: no handle to the broker client, no lazily
//! fetched state. Consumer-side shapes are built fresh by the translator and
//! never mutated afterwards.

use crate::streamdriver::kafka::headers::Headers;
use std::fmt;

/// Identity of one partition of one topic
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TopicPartitionKey {
    pub topic: String,
    pub partition: i32,
}

impl TopicPartitionKey {
    pub fn new(topic: impl Into<String>, partition: i32) -> Self {
        Self {
            topic: topic.into(),
            partition,
        }
    }
}

impl fmt::Display for TopicPartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.topic, self.partition)
    }
}

impl<T: Into<String>> From<(T, i32)> for TopicPartitionKey {
    fn from((topic, partition): (T, i32)) -> Self {
        Self::new(topic, partition)
    }
}

/// One entry of an explicit offset commit request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetCommit {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub metadata: Option<String>,
}

impl OffsetCommit {
    pub fn new(topic: impl Into<String>, partition: i32, offset: i64) -> Self {
        Self {
            topic: topic.into(),
            partition,
            offset,
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: impl Into<String>) -> Self {
        self.metadata = Some(metadata.into());
        self
    }

    pub fn topic_partition(&self) -> TopicPartitionKey {
        TopicPartitionKey::new(self.topic.clone(), self.partition)
    }
}

/// Offset plus optional metadata, the value side of a merged commit map
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetAndMetadata {
    pub offset: i64,
    pub metadata: Option<String>,
}

/// Broker node snapshot
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeDescriptor {
    pub host: String,
    pub id: i32,
    pub port: i32,
}

impl NodeDescriptor {
    /// Placeholder used when a partition currently has no leader
    pub fn no_node() -> Self {
        Self {
            host: String::new(),
            id: -1,
            port: -1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.id < 0
    }
}

/// Partition metadata snapshot, rebuilt on every `partitions_for` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionInfo {
    pub topic: String,
    pub partition: i32,
    pub leader: NodeDescriptor,
    pub replicas: Vec<NodeDescriptor>,
    pub isr: Vec<NodeDescriptor>,
}

/// One consumed record
///
/// `key` and `value` hold whatever the configured deserializers produce;
/// with `BytesCodec` that is the raw payload.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalRecord<K, V> {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub key: Option<K>,
    pub value: Option<V>,
    pub timestamp: Option<i64>,
    pub headers: Headers,
}

impl<K, V> CanonicalRecord<K, V> {
    pub fn topic_partition(&self) -> TopicPartitionKey {
        TopicPartitionKey::new(self.topic.clone(), self.partition)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RebalanceKind {
    Assigned,
    Revoked,
}

impl fmt::Display for RebalanceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RebalanceKind::Assigned => f.write_str("assigned"),
            RebalanceKind::Revoked => f.write_str("revoked"),
        }
    }
}

/// Partitions gained or lost in one rebalance notification, in broker order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebalanceEvent {
    pub event: RebalanceKind,
    pub partitions: Vec<TopicPartitionKey>,
}

/// What application code asks the producer to send
///
/// The topic is optional here only so that its absence can be reported as
/// `MissingTopic` when the record is built.
#[derive(Debug, Clone, PartialEq)]
pub struct ProducerSendRequest<K, V> {
    pub topic: Option<String>,
    pub partition: Option<i32>,
    pub key: Option<K>,
    pub value: Option<V>,
    pub timestamp: Option<i64>,
    pub headers: Option<Headers>,
}

impl<K, V> Default for ProducerSendRequest<K, V> {
    fn default() -> Self {
        Self {
            topic: None,
            partition: None,
            key: None,
            value: None,
            timestamp: None,
            headers: None,
        }
    }
}

impl<K, V> ProducerSendRequest<K, V> {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: Some(topic.into()),
            ..Default::default()
        }
    }

    pub fn partition(mut self, partition: i32) -> Self {
        self.partition = Some(partition);
        self
    }

    pub fn key(mut self, key: K) -> Self {
        self.key = Some(key);
        self
    }

    pub fn value(mut self, value: V) -> Self {
        self.value = Some(value);
        self
    }

    pub fn timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn headers(mut self, headers: Headers) -> Self {
        self.headers = Some(headers);
        self
    }
}

/// Fully formed record as handed to the broker client
///
/// Key and payload are already encoded. A `None` partition leaves the choice to
/// the broker client's partitioner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProducerRecord {
    pub topic: String,
    pub partition: Option<i32>,
    pub key: Option<Vec<u8>>,
    pub payload: Option<Vec<u8>>,
    pub timestamp: Option<i64>,
    pub headers: Option<Headers>,
}

impl ProducerRecord {
    pub fn new(topic: impl Into<String>, payload: Option<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            partition: None,
            key: None,
            payload,
            timestamp: None,
            headers: None,
        }
    }

    pub fn with_key(topic: impl Into<String>, key: Option<Vec<u8>>, payload: Option<Vec<u8>>) -> Self {
        Self {
            key,
            ..Self::new(topic, payload)
        }
    }

    pub fn with_partition(
        topic: impl Into<String>,
        partition: i32,
        key: Option<Vec<u8>>,
        payload: Option<Vec<u8>>,
    ) -> Self {
        Self {
            partition: Some(partition),
            ..Self::with_key(topic, key, payload)
        }
    }
}

/// Where a record landed once the broker acknowledged it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordMetadata {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
}
