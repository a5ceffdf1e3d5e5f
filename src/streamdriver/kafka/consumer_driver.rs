//! Consumer driver
//!
//! [`BrokerConsumerDriver`] owns one broker consumer and the key/value
//! deserializers, and exposes the [`ConsumerDriver`] operations in canonical
//! terms: poll results, topic-partition keys, offset commits.
//!
//! A consumer is meant to be driven from a single thread. The one exception is
//! waking it up: [`ConsumerDriver::wake_up`], or a [`WakeupHandle`] moved to
//! another thread, interrupts a blocked poll.
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use streamdriver::{consumer, ConsumerDriver, StringCodec};
//!
//! # fn main() -> Result<(), streamdriver::DriverError> {
//! let driver = consumer(
//!     [("bootstrap.servers", "localhost:9092"), ("group.id", "billing")],
//!     StringCodec,
//!     StringCodec,
//! )?;
//! driver.subscribe("invoices".into())?;
//!
//! loop {
//!     let Some(batch) = driver.safe_poll(Duration::from_millis(500))? else {
//!         break;
//!     };
//!     for record in &batch {
//!         println!("{}: {:?}", record.offset, record.value);
//!     }
//!     driver.commit()?;
//! }
//! # Ok(())
//! # }
//! ```

use crate::streamdriver::error::DriverError;
use crate::streamdriver::kafka::client::{BrokerConsumer, NativeBatch, WakeupHandle};
use crate::streamdriver::kafka::client_config_builder::ClientConfigBuilder;
use crate::streamdriver::kafka::common_config::{DriverSettings, normalize_config};
use crate::streamdriver::kafka::metadata_driver::{MetadataDriver, translate_partitions};
use crate::streamdriver::kafka::poll_result::PollResult;
use crate::streamdriver::kafka::rdkafka_client::RdKafkaConsumer;
use crate::streamdriver::kafka::rebalance::{Listener, make_listener};
use crate::streamdriver::kafka::translator::{
    SubscriptionTarget, from_native_poll_batch, from_native_topic_partitions,
    normalize_subscription_target, to_native_offsets, to_native_topic_partitions,
};
use crate::streamdriver::kafka::types::{OffsetCommit, PartitionInfo, TopicPartitionKey};
use crate::streamdriver::serialization::Deserializer;
use log::{debug, warn};
use rdkafka::message::Message;
use std::fmt::Display;
use std::time::Duration;

/// Callback run by [`ConsumerDriver::stop`] before the consumer is woken up
pub type StopSignal = Box<dyn Fn(Option<Duration>) + Send + Sync>;

pub trait ConsumerDriver<K, V>: MetadataDriver {
    /// Block up to `timeout` for records.
    ///
    /// Fails with [`DriverError::WakeupInterrupt`] when woken up, including by
    /// a wake-up requested before the call.
    fn poll(&self, timeout: Duration) -> Result<PollResult<K, V>, DriverError>;

    /// Like [`poll`](ConsumerDriver::poll), but a wake-up yields `Ok(None)`.
    ///
    /// Every other failure still propagates.
    fn safe_poll(&self, timeout: Duration) -> Result<Option<PollResult<K, V>>, DriverError> {
        match self.poll(timeout) {
            Ok(result) => Ok(Some(result)),
            Err(e) if e.is_wakeup() => {
                debug!("Poll woken up, returning no result");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Subscribe to a topic, a list of topics or a pattern, replacing any
    /// previous subscription and listener
    fn subscribe(&self, topics: SubscriptionTarget) -> Result<(), DriverError>;

    /// Subscribe and receive rebalance notifications through `listener`
    fn subscribe_with_listener(
        &self,
        topics: SubscriptionTarget,
        listener: Listener,
    ) -> Result<(), DriverError>;

    fn unsubscribe(&self);

    fn pause(&self, partitions: &[TopicPartitionKey]) -> Result<(), DriverError>;

    fn resume(&self, partitions: &[TopicPartitionKey]) -> Result<(), DriverError>;

    /// Synchronously commit the offsets of everything consumed so far
    fn commit(&self) -> Result<(), DriverError>;

    /// Synchronously commit explicit offsets.
    ///
    /// Entries are expected to name distinct partitions. When two entries name
    /// the same partition the later one wins.
    fn commit_offsets(&self, offsets: &[OffsetCommit]) -> Result<(), DriverError>;

    /// Interrupt a blocked poll; safe to call from any thread
    fn wake_up(&self);

    /// Handle performing [`wake_up`](ConsumerDriver::wake_up) without access to the driver
    fn wakeup_handle(&self) -> WakeupHandle;

    /// Run the stop signal, if any, then wake the consumer up
    fn stop(&self, timeout: Option<Duration>);

    /// Partitions currently assigned to this consumer
    fn assignment(&self) -> Result<Vec<TopicPartitionKey>, DriverError>;

    /// Topic names and patterns currently subscribed to
    fn subscription(&self) -> Result<Vec<String>, DriverError>;

    /// Move the fetch position of one assigned partition
    fn seek(&self, partition: &TopicPartitionKey, offset: i64) -> Result<(), DriverError>;
}

pub struct BrokerConsumerDriver<K, V> {
    client: Box<dyn BrokerConsumer>,
    key_deserializer: Box<dyn Deserializer<K>>,
    value_deserializer: Box<dyn Deserializer<V>>,
    stop_signal: Option<StopSignal>,
}

impl<K, V> BrokerConsumerDriver<K, V> {
    pub fn new(
        client: Box<dyn BrokerConsumer>,
        key_deserializer: impl Deserializer<K> + 'static,
        value_deserializer: impl Deserializer<V> + 'static,
    ) -> Self {
        Self {
            client,
            key_deserializer: Box::new(key_deserializer),
            value_deserializer: Box::new(value_deserializer),
            stop_signal: None,
        }
    }

    pub fn with_stop_signal<F>(mut self, signal: F) -> Self
    where
        F: Fn(Option<Duration>) + Send + Sync + 'static,
    {
        self.stop_signal = Some(Box::new(signal));
        self
    }
}

impl<K, V> BrokerConsumerDriver<K, V> {
    /// Move every partition of an undelivered batch back to its first record,
    /// so the records are fetched again and a later `commit` cannot pass them
    fn rewind(&self, batch: &NativeBatch) {
        for (topic, partition) in batch.partitions() {
            let Some(first) = batch.records(topic, partition).first() else {
                continue;
            };
            if let Err(e) = self.client.seek(topic, partition, first.offset()) {
                warn!(
                    "Failed to rewind {}-{} to {} after a decode failure: {}",
                    topic,
                    partition,
                    first.offset(),
                    e
                );
            }
        }
    }
}

impl<K, V> MetadataDriver for BrokerConsumerDriver<K, V> {
    fn partitions_for(&self, topic: &str) -> Result<Vec<PartitionInfo>, DriverError> {
        Ok(translate_partitions(&self.client.partitions_for(topic)?))
    }
}

impl<K, V> ConsumerDriver<K, V> for BrokerConsumerDriver<K, V> {
    fn poll(&self, timeout: Duration) -> Result<PollResult<K, V>, DriverError> {
        let batch = self.client.poll(timeout)?;
        from_native_poll_batch(
            &batch,
            self.key_deserializer.as_ref(),
            self.value_deserializer.as_ref(),
        )
        .inspect_err(|_| self.rewind(&batch))
    }

    fn subscribe(&self, topics: SubscriptionTarget) -> Result<(), DriverError> {
        let subscription = normalize_subscription_target(topics)?;
        self.client.subscribe(&subscription, None)
    }

    fn subscribe_with_listener(
        &self,
        topics: SubscriptionTarget,
        listener: Listener,
    ) -> Result<(), DriverError> {
        let subscription = normalize_subscription_target(topics)?;
        self.client
            .subscribe(&subscription, Some(make_listener(listener)))
    }

    fn unsubscribe(&self) {
        self.client.unsubscribe();
    }

    fn pause(&self, partitions: &[TopicPartitionKey]) -> Result<(), DriverError> {
        self.client.pause(&to_native_topic_partitions(partitions))
    }

    fn resume(&self, partitions: &[TopicPartitionKey]) -> Result<(), DriverError> {
        self.client.resume(&to_native_topic_partitions(partitions))
    }

    fn commit(&self) -> Result<(), DriverError> {
        self.client.commit_consumed()
    }

    fn commit_offsets(&self, offsets: &[OffsetCommit]) -> Result<(), DriverError> {
        if offsets.is_empty() {
            debug!("No offsets to commit");
            return Ok(());
        }
        self.client.commit(&to_native_offsets(offsets)?)
    }

    fn wake_up(&self) {
        debug!("Wake-up requested");
        self.client.wake_up();
    }

    fn wakeup_handle(&self) -> WakeupHandle {
        self.client.wakeup_handle()
    }

    fn stop(&self, timeout: Option<Duration>) {
        if let Some(signal) = &self.stop_signal {
            signal(timeout);
        }
        self.wake_up();
    }

    fn assignment(&self) -> Result<Vec<TopicPartitionKey>, DriverError> {
        Ok(from_native_topic_partitions(&self.client.assignment()?))
    }

    fn subscription(&self) -> Result<Vec<String>, DriverError> {
        let mut topics: Vec<String> = Vec::new();
        for key in from_native_topic_partitions(&self.client.subscription()?) {
            if !topics.contains(&key.topic) {
                topics.push(key.topic);
            }
        }
        Ok(topics)
    }

    fn seek(&self, partition: &TopicPartitionKey, offset: i64) -> Result<(), DriverError> {
        self.client.seek(&partition.topic, partition.partition, offset)
    }
}

/// Build a consumer driver backed by rdkafka.
///
/// `options` are normalized to string pairs; `max.poll.records` and
/// `default.api.timeout.ms` are consumed here, everything else goes to
/// librdkafka untouched. Both deserializers see the normalized options through
/// their `configure` hook.
pub fn consumer<O, N, S, K, V>(
    options: O,
    key_deserializer: impl Deserializer<K> + 'static,
    value_deserializer: impl Deserializer<V> + 'static,
) -> Result<BrokerConsumerDriver<K, V>, DriverError>
where
    O: IntoIterator<Item = (N, S)>,
    N: Display,
    S: Display,
{
    let mut options = normalize_config(options);
    let settings = DriverSettings::extract(&mut options);

    let config = ClientConfigBuilder::new()
        .options(&options)
        .log_level_from_facade()
        .build();
    let client = RdKafkaConsumer::new(&config, settings)?;

    key_deserializer.configure(&options, true);
    value_deserializer.configure(&options, false);
    Ok(BrokerConsumerDriver::new(
        Box::new(client),
        key_deserializer,
        value_deserializer,
    ))
}
