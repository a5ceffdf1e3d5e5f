//! Broker client contract
//!
//! The drivers never talk to librdkafka directly. They drive a [`BrokerConsumer`]
//! or a [`BrokerProducer`] through a handful of primitive operations and
//! translate what comes back. `rdkafka_client` provides the real
//! implementations; anything else satisfying these traits (an in-memory fake,
//! a recording proxy) can stand in.
//!
//! The "native" shapes are those of the broker client: rdkafka's
//! `TopicPartitionList` and `OwnedMessage`, plus the small metadata structs
//! defined here.

use crate::streamdriver::error::DriverError;
use crate::streamdriver::kafka::rebalance::RebalanceListener;
use crate::streamdriver::kafka::types::{ProducerRecord, RecordMetadata};
use futures::future::{BoxFuture, FutureExt};
use indexmap::IndexMap;
use rdkafka::TopicPartitionList;
use rdkafka::message::{Message, OwnedMessage};
use regex::Regex;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll};
use std::time::Duration;

/// What the broker client can subscribe to
#[derive(Debug, Clone)]
pub enum Subscription {
    Topics(Vec<String>),
    Pattern(Regex),
}

impl PartialEq for Subscription {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Subscription::Topics(a), Subscription::Topics(b)) => a == b,
            (Subscription::Pattern(a), Subscription::Pattern(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

/// Broker node as reported by a metadata response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeNode {
    pub id: i32,
    pub host: String,
    pub port: i32,
}

/// Partition metadata with replica ids already resolved to nodes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativePartitionInfo {
    pub topic: String,
    pub partition: i32,
    /// `None` while the partition has no elected leader
    pub leader: Option<NativeNode>,
    pub replicas: Vec<NativeNode>,
    pub isr: Vec<NativeNode>,
}

/// Records returned by one poll, grouped by partition
///
/// Partitions are enumerated in the order their first record arrived; records
/// within a partition keep delivery order.
#[derive(Debug, Default)]
pub struct NativeBatch {
    records: IndexMap<(String, i32), Vec<OwnedMessage>>,
    count: usize,
}

impl NativeBatch {
    pub fn new(messages: impl IntoIterator<Item = OwnedMessage>) -> Self {
        let mut records: IndexMap<(String, i32), Vec<OwnedMessage>> = IndexMap::new();
        let mut count = 0;
        for message in messages {
            count += 1;
            records
                .entry((message.topic().to_string(), message.partition()))
                .or_default()
                .push(message);
        }
        Self { records, count }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Total number of records in the batch
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Distinct partitions present in the batch
    pub fn partitions(&self) -> impl Iterator<Item = (&str, i32)> {
        self.records
            .keys()
            .map(|(topic, partition)| (topic.as_str(), *partition))
    }

    pub fn records(&self, topic: &str, partition: i32) -> &[OwnedMessage] {
        self.records
            .get(&(topic.to_string(), partition))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Distinct topics present in the batch
    pub fn topics(&self) -> Vec<&str> {
        let mut topics: Vec<&str> = Vec::new();
        for (topic, _) in self.records.keys() {
            if !topics.contains(&topic.as_str()) {
                topics.push(topic);
            }
        }
        topics
    }
}

/// Cross-thread interrupt for a blocked poll
///
/// A wake-up requested while no poll is running stays pending and interrupts
/// the next poll.
#[derive(Debug, Clone, Default)]
pub struct WakeupHandle {
    pending: Arc<AtomicBool>,
}

impl WakeupHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn wake_up(&self) {
        self.pending.store(true, Ordering::Release);
    }

    /// Consume a pending wake-up, returning whether there was one
    pub fn take(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }
}

/// Consumer primitives the consumer driver is built on
///
/// Implementations are not required to support concurrent calls other than
/// `wake_up`, which must be callable from any thread while `poll` blocks.
pub trait BrokerConsumer: Send + Sync {
    /// Block up to `timeout` for records. Fails with
    /// `DriverError::WakeupInterrupt` when woken.
    ///
    /// A broker error met after some records were gathered does not discard
    /// them: the records are returned and the error fails the next call.
    fn poll(&self, timeout: Duration) -> Result<NativeBatch, DriverError>;

    /// Replace the current subscription; `listener` replaces any previous listener.
    fn subscribe(
        &self,
        subscription: &Subscription,
        listener: Option<Arc<dyn RebalanceListener>>,
    ) -> Result<(), DriverError>;

    fn unsubscribe(&self);

    fn pause(&self, partitions: &TopicPartitionList) -> Result<(), DriverError>;

    fn resume(&self, partitions: &TopicPartitionList) -> Result<(), DriverError>;

    /// Synchronously commit the offsets of everything consumed so far
    fn commit_consumed(&self) -> Result<(), DriverError>;

    /// Synchronously commit exactly the given offsets
    fn commit(&self, offsets: &TopicPartitionList) -> Result<(), DriverError>;

    fn wakeup_handle(&self) -> WakeupHandle;

    fn wake_up(&self) {
        self.wakeup_handle().wake_up();
    }

    fn assignment(&self) -> Result<TopicPartitionList, DriverError>;

    fn subscription(&self) -> Result<TopicPartitionList, DriverError>;

    fn seek(&self, topic: &str, partition: i32, offset: i64) -> Result<(), DriverError>;

    /// Fresh metadata round trip; never cached
    fn partitions_for(&self, topic: &str) -> Result<Vec<NativePartitionInfo>, DriverError>;
}

/// Producer primitives the producer driver is built on
///
/// `send` must be safe to call concurrently and must not block.
pub trait BrokerProducer: Send + Sync {
    fn send(&self, record: ProducerRecord) -> Result<DeliveryHandle, DriverError>;

    /// Block until every buffered record is delivered or failed; `None` waits forever
    fn flush(&self, timeout: Option<Duration>) -> Result<(), DriverError>;

    /// Flush and release the client; `None` waits forever
    fn close(&self, timeout: Option<Duration>) -> Result<(), DriverError>;

    /// Fresh metadata round trip; never cached
    fn partitions_for(&self, topic: &str) -> Result<Vec<NativePartitionInfo>, DriverError>;
}

/// Eventual delivery result of one send
///
/// Await it from async code or call [`DeliveryHandle::wait`] to block.
pub struct DeliveryHandle {
    inner: BoxFuture<'static, Result<RecordMetadata, DriverError>>,
}

impl DeliveryHandle {
    pub fn new<F>(future: F) -> Self
    where
        F: Future<Output = Result<RecordMetadata, DriverError>> + Send + 'static,
    {
        Self {
            inner: future.boxed(),
        }
    }

    /// Handle whose outcome is already known
    pub fn ready(result: Result<RecordMetadata, DriverError>) -> Self {
        Self::new(futures::future::ready(result))
    }

    pub fn wait(self) -> Result<RecordMetadata, DriverError> {
        futures::executor::block_on(self)
    }
}

impl Future for DeliveryHandle {
    type Output = Result<RecordMetadata, DriverError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.poll_unpin(cx)
    }
}

impl fmt::Debug for DeliveryHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeliveryHandle").finish_non_exhaustive()
    }
}
