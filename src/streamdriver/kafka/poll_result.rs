//! Poll results and record flattening
//!
//! A [`PollResult`] is the consumer-facing snapshot of one successful poll.
//! Records are reachable grouped by partition or by topic, and as one flat
//! sequence. Each record is shared between the views, never copied.
//!
//! ```rust
//! # use streamdriver::PollResult;
//! fn process(result: &PollResult<String, String>) {
//!     for record in result.records() {
//!         println!("{}@{}: {:?}", record.topic, record.offset, record.value);
//!     }
//! }
//! ```

use crate::streamdriver::kafka::types::{CanonicalRecord, TopicPartitionKey};
use indexmap::IndexMap;
use std::iter::Flatten;
use std::sync::Arc;

pub type SharedRecord<K, V> = Arc<CanonicalRecord<K, V>>;

/// Snapshot of one poll, never mutated after construction
#[derive(Debug, Clone)]
pub struct PollResult<K, V> {
    partitions: Vec<TopicPartitionKey>,
    count: usize,
    by_partition: IndexMap<TopicPartitionKey, Vec<SharedRecord<K, V>>>,
    by_topic: IndexMap<String, Vec<SharedRecord<K, V>>>,
}

impl<K, V> PollResult<K, V> {
    pub fn empty() -> Self {
        Self {
            partitions: Vec::new(),
            count: 0,
            by_partition: IndexMap::new(),
            by_topic: IndexMap::new(),
        }
    }

    pub(crate) fn from_parts(
        count: usize,
        by_partition: IndexMap<TopicPartitionKey, Vec<SharedRecord<K, V>>>,
        by_topic: IndexMap<String, Vec<SharedRecord<K, V>>>,
    ) -> Self {
        Self {
            partitions: by_partition.keys().cloned().collect(),
            count,
            by_partition,
            by_topic,
        }
    }

    /// Partitions present in this batch, in broker enumeration order
    pub fn partitions(&self) -> &[TopicPartitionKey] {
        &self.partitions
    }

    /// Topics present in this batch
    pub fn topics(&self) -> impl Iterator<Item = &str> {
        self.by_topic.keys().map(String::as_str)
    }

    /// Total number of records, as reported by the broker client
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn by_partition(&self) -> &IndexMap<TopicPartitionKey, Vec<SharedRecord<K, V>>> {
        &self.by_partition
    }

    pub fn by_topic(&self) -> &IndexMap<String, Vec<SharedRecord<K, V>>> {
        &self.by_topic
    }

    /// Records of one partition in delivery order
    pub fn records_for_partition(&self, partition: &TopicPartitionKey) -> &[SharedRecord<K, V>] {
        self.by_partition
            .get(partition)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn records_for_topic(&self, topic: &str) -> &[SharedRecord<K, V>] {
        self.by_topic
            .get(topic)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Flat, lazy sequence over every record, partition by partition
    ///
    /// Each call starts a fresh walk over the same snapshot.
    pub fn records(&self) -> Records<'_, K, V> {
        Records {
            inner: self.by_partition.values().flatten(),
        }
    }

    /// Owned flat sequence, consuming the snapshot
    pub fn into_records(self) -> impl Iterator<Item = SharedRecord<K, V>> {
        self.by_partition.into_values().flatten()
    }
}

impl<K, V> Default for PollResult<K, V> {
    fn default() -> Self {
        Self::empty()
    }
}

/// Iterator returned by [`PollResult::records`]
pub struct Records<'a, K, V> {
    inner: Flatten<indexmap::map::Values<'a, TopicPartitionKey, Vec<SharedRecord<K, V>>>>,
}

impl<'a, K, V> Iterator for Records<'a, K, V> {
    type Item = &'a CanonicalRecord<K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(Arc::as_ref)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a, K, V> IntoIterator for &'a PollResult<K, V> {
    type Item = &'a CanonicalRecord<K, V>;
    type IntoIter = Records<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.records()
    }
}
