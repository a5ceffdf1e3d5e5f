//! Data model translator
//!
//! Pure functions between the broker client's native structures and the
//! canonical shapes in [`types`](super::types). Nothing here talks to a broker.

use crate::streamdriver::error::DriverError;
use crate::streamdriver::kafka::client::{NativeBatch, NativeNode, NativePartitionInfo, Subscription};
use crate::streamdriver::kafka::headers::Headers;
use crate::streamdriver::kafka::poll_result::{PollResult, SharedRecord};
use crate::streamdriver::kafka::types::{
    CanonicalRecord, NodeDescriptor, OffsetAndMetadata, OffsetCommit, PartitionInfo, TopicPartitionKey,
};
use crate::streamdriver::serialization::Deserializer;
use indexmap::IndexMap;
use rdkafka::message::{Message, OwnedMessage};
use rdkafka::topic_partition_list::TopicPartitionListElem;
use rdkafka::{Offset, TopicPartitionList};
use regex::Regex;
use std::sync::Arc;

// Topic partitions
//=================

pub fn to_native_topic_partition(key: &TopicPartitionKey, list: &mut TopicPartitionList) {
    list.add_partition(&key.topic, key.partition);
}

pub fn to_native_topic_partitions<'a, I>(keys: I) -> TopicPartitionList
where
    I: IntoIterator<Item = &'a TopicPartitionKey>,
{
    let mut list = TopicPartitionList::new();
    for key in keys {
        to_native_topic_partition(key, &mut list);
    }
    list
}

pub fn from_native_topic_partition(elem: &TopicPartitionListElem<'_>) -> TopicPartitionKey {
    TopicPartitionKey::new(elem.topic(), elem.partition())
}

/// Translate every element, preserving list order
pub fn from_native_topic_partitions(list: &TopicPartitionList) -> Vec<TopicPartitionKey> {
    list.elements()
        .iter()
        .map(from_native_topic_partition)
        .collect()
}

// Offsets
//========

/// Add one offset entry to a native commit list
pub fn to_native_offset_commit(
    key: &TopicPartitionKey,
    offset: &OffsetAndMetadata,
    list: &mut TopicPartitionList,
) -> Result<(), DriverError> {
    let mut elem = list.add_partition(&key.topic, key.partition);
    elem.set_offset(Offset::Offset(offset.offset))?;
    if let Some(metadata) = &offset.metadata {
        elem.set_metadata(metadata.clone());
    }
    Ok(())
}

/// Merge commit entries into one mapping keyed by partition.
///
/// Entries sharing a partition are last-write-wins in iteration order; the
/// merged entry keeps the position of the first occurrence.
pub fn merge_offset_commits(commits: &[OffsetCommit]) -> IndexMap<TopicPartitionKey, OffsetAndMetadata> {
    let mut merged = IndexMap::with_capacity(commits.len());
    for commit in commits {
        merged.insert(
            commit.topic_partition(),
            OffsetAndMetadata {
                offset: commit.offset,
                metadata: commit.metadata.clone(),
            },
        );
    }
    merged
}

/// Merge commit entries and build the native commit list
pub fn to_native_offsets(commits: &[OffsetCommit]) -> Result<TopicPartitionList, DriverError> {
    let mut list = TopicPartitionList::with_capacity(commits.len());
    for (key, offset) in &merge_offset_commits(commits) {
        to_native_offset_commit(key, offset, &mut list)?;
    }
    Ok(list)
}

// Metadata
//=========

pub fn from_native_node(node: &NativeNode) -> NodeDescriptor {
    NodeDescriptor {
        host: node.host.clone(),
        id: node.id,
        port: node.port,
    }
}

pub fn from_native_partition_info(info: &NativePartitionInfo) -> PartitionInfo {
    PartitionInfo {
        topic: info.topic.clone(),
        partition: info.partition,
        leader: info
            .leader
            .as_ref()
            .map(from_native_node)
            .unwrap_or_else(NodeDescriptor::no_node),
        replicas: info.replicas.iter().map(from_native_node).collect(),
        isr: info.isr.iter().map(from_native_node).collect(),
    }
}

// Records
//========

pub fn from_native_record<K, V>(
    message: &OwnedMessage,
    key_deserializer: &dyn Deserializer<K>,
    value_deserializer: &dyn Deserializer<V>,
) -> Result<CanonicalRecord<K, V>, DriverError> {
    let topic = message.topic();
    let key = key_deserializer.deserialize(topic, message.key())?;
    let value = value_deserializer.deserialize(topic, message.payload())?;

    Ok(CanonicalRecord {
        topic: topic.to_string(),
        partition: message.partition(),
        offset: message.offset(),
        key,
        value,
        timestamp: message.timestamp().to_millis(),
        headers: message
            .headers()
            .map(Headers::from_rdkafka_headers)
            .unwrap_or_default(),
    })
}

/// Build the canonical poll snapshot.
///
/// Each native record is decoded once; the by-partition and by-topic views
/// share the decoded record. `count` is taken from the batch itself.
pub fn from_native_poll_batch<K, V>(
    batch: &NativeBatch,
    key_deserializer: &dyn Deserializer<K>,
    value_deserializer: &dyn Deserializer<V>,
) -> Result<PollResult<K, V>, DriverError> {
    let mut by_partition: IndexMap<TopicPartitionKey, Vec<SharedRecord<K, V>>> = IndexMap::new();
    for (topic, partition) in batch.partitions() {
        let records = batch
            .records(topic, partition)
            .iter()
            .map(|message| {
                from_native_record(message, key_deserializer, value_deserializer).map(Arc::new)
            })
            .collect::<Result<Vec<_>, _>>()?;
        by_partition.insert(TopicPartitionKey::new(topic, partition), records);
    }

    let mut by_topic: IndexMap<String, Vec<SharedRecord<K, V>>> = IndexMap::new();
    for topic in batch.topics() {
        let records = by_partition
            .iter()
            .filter(|(key, _)| key.topic == topic)
            .flat_map(|(_, records)| records.iter().cloned())
            .collect();
        by_topic.insert(topic.to_string(), records);
    }

    Ok(PollResult::from_parts(batch.count(), by_partition, by_topic))
}

// Subscriptions
//==============

/// Anything a caller may hand to `subscribe`
///
/// `Value` admits dynamically shaped input (for instance topics read from a
/// configuration document); it is only accepted when it holds a string or an
/// array of strings.
#[derive(Debug, Clone)]
pub enum SubscriptionTarget {
    Topic(String),
    Topics(Vec<String>),
    /// Topic pattern, matched by librdkafka rather than by `regex`.
    ///
    /// librdkafka compiles the pattern with its own POSIX-style engine, so
    /// only syntax both engines agree on is safe. Perl classes such as `\d`
    /// and look-arounds are not.
    Pattern(Regex),
    Value(serde_json::Value),
}

impl From<&str> for SubscriptionTarget {
    fn from(topic: &str) -> Self {
        SubscriptionTarget::Topic(topic.to_string())
    }
}

impl From<String> for SubscriptionTarget {
    fn from(topic: String) -> Self {
        SubscriptionTarget::Topic(topic)
    }
}

impl From<Vec<String>> for SubscriptionTarget {
    fn from(topics: Vec<String>) -> Self {
        SubscriptionTarget::Topics(topics)
    }
}

impl From<Vec<&str>> for SubscriptionTarget {
    fn from(topics: Vec<&str>) -> Self {
        SubscriptionTarget::Topics(topics.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for SubscriptionTarget {
    fn from(topics: &[&str]) -> Self {
        SubscriptionTarget::Topics(topics.iter().map(|t| t.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for SubscriptionTarget {
    fn from(topics: [&str; N]) -> Self {
        SubscriptionTarget::Topics(topics.iter().map(|t| t.to_string()).collect())
    }
}

impl From<Regex> for SubscriptionTarget {
    fn from(pattern: Regex) -> Self {
        SubscriptionTarget::Pattern(pattern)
    }
}

impl From<serde_json::Value> for SubscriptionTarget {
    fn from(value: serde_json::Value) -> Self {
        SubscriptionTarget::Value(value)
    }
}

/// Normalize a subscription target into what the broker client subscribes to.
///
/// A single topic becomes a one-element list, lists and patterns pass through
/// unchanged. Any other shape fails with `InvalidArgument` carrying the value.
pub fn normalize_subscription_target(target: SubscriptionTarget) -> Result<Subscription, DriverError> {
    match target {
        SubscriptionTarget::Topic(topic) => Ok(Subscription::Topics(vec![topic])),
        SubscriptionTarget::Topics(topics) => Ok(Subscription::Topics(topics)),
        SubscriptionTarget::Pattern(pattern) => Ok(Subscription::Pattern(pattern)),
        SubscriptionTarget::Value(serde_json::Value::String(topic)) => {
            Ok(Subscription::Topics(vec![topic]))
        }
        SubscriptionTarget::Value(serde_json::Value::Array(items)) => {
            let topics = items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect::<Option<Vec<String>>>();
            match topics {
                Some(topics) => Ok(Subscription::Topics(topics)),
                None => Err(DriverError::invalid_argument(
                    serde_json::Value::Array(items).to_string(),
                )),
            }
        }
        SubscriptionTarget::Value(other) => Err(DriverError::invalid_argument(other.to_string())),
    }
}
