//! rdkafka-backed broker clients
//!
//! [`RdKafkaConsumer`] wraps a `BaseConsumer` whose context forwards rebalance
//! callbacks to the current [`RebalanceListener`]. [`RdKafkaProducer`] wraps a
//! `ThreadedProducer` whose context completes one [`DeliveryHandle`] per record.
//! Both bridge librdkafka's own log lines into the `log` facade.

use crate::streamdriver::error::DriverError;
use crate::streamdriver::kafka::client::{
    BrokerConsumer, BrokerProducer, DeliveryHandle, NativeBatch, NativeNode, NativePartitionInfo,
    Subscription, WakeupHandle,
};
use crate::streamdriver::kafka::common_config::DriverSettings;
use crate::streamdriver::kafka::rebalance::RebalanceListener;
use crate::streamdriver::kafka::types::{ProducerRecord, RecordMetadata};
use crate::streamdriver::kafka::utils::{convert_kafka_log_level, to_rdkafka_timeout};
use futures::channel::oneshot;
use regex::Regex;
use log::{debug, error, warn};
use rdkafka::config::{ClientConfig, RDKafkaLogLevel};
use rdkafka::consumer::{BaseConsumer, CommitMode, Consumer, ConsumerContext, Rebalance};
use rdkafka::error::{KafkaError, KafkaResult, RDKafkaErrorCode};
use rdkafka::message::{DeliveryResult, Message, OwnedMessage};
use rdkafka::metadata::Metadata;
use rdkafka::producer::{BaseRecord, Producer, ProducerContext, ThreadedProducer};
use rdkafka::{ClientContext, Offset, TopicPartitionList};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::{Duration, Instant};

/// Longest stretch a poll blocks inside librdkafka before checking for a wake-up
const WAKEUP_CHECK_INTERVAL: Duration = Duration::from_millis(100);

fn log_kafka_message(level: RDKafkaLogLevel, fac: &str, message: &str) {
    log::log!(
        target: "rdkafka",
        convert_kafka_log_level(level),
        "Kafka log ({}): {}",
        fac,
        message
    );
}

// Consumer
//=========

/// Consumer context holding the listener installed by the last `subscribe`
#[derive(Default)]
pub struct ConsumerClientContext {
    listener: RwLock<Option<Arc<dyn RebalanceListener>>>,
}

impl ConsumerClientContext {
    fn set_listener(&self, listener: Option<Arc<dyn RebalanceListener>>) {
        *self.listener.write().unwrap_or_else(PoisonError::into_inner) = listener;
    }

    fn listener(&self) -> Option<Arc<dyn RebalanceListener>> {
        self.listener
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Run `subscribe` and install `listener` only once it succeeded
    ///
    /// Rebalance callbacks fire from inside `poll`, so no event can fall
    /// between the subscription change and the listener swap.
    fn subscribe_with<F>(
        &self,
        listener: Option<Arc<dyn RebalanceListener>>,
        subscribe: F,
    ) -> Result<(), DriverError>
    where
        F: FnOnce() -> KafkaResult<()>,
    {
        subscribe()?;
        self.set_listener(listener);
        Ok(())
    }
}

impl ClientContext for ConsumerClientContext {
    fn log(&self, level: RDKafkaLogLevel, fac: &str, log_message: &str) {
        log_kafka_message(level, fac, log_message);
    }

    fn error(&self, error: KafkaError, reason: &str) {
        error!("Kafka consumer error: {:?}, reason: {}", error, reason);
    }
}

impl ConsumerContext for ConsumerClientContext {
    fn pre_rebalance(&self, _base_consumer: &BaseConsumer<Self>, rebalance: &Rebalance<'_>) {
        match rebalance {
            Rebalance::Revoke(partitions) => {
                if let Some(listener) = self.listener() {
                    listener.on_partitions_revoked(partitions);
                }
            }
            Rebalance::Assign(_) => {}
            Rebalance::Error(e) => error!(target: "rebalance", "Rebalance failed: {}", e),
        }
    }

    fn post_rebalance(&self, _base_consumer: &BaseConsumer<Self>, rebalance: &Rebalance<'_>) {
        if let Rebalance::Assign(partitions) = rebalance {
            if let Some(listener) = self.listener() {
                listener.on_partitions_assigned(partitions);
            }
        }
    }
}

/// Broker error taken off librdkafka's queue while a batch was being filled
///
/// The batch gathered so far is returned; the error is reported by the next poll.
#[derive(Debug, Default)]
struct DeferredError {
    slot: Mutex<Option<KafkaError>>,
}

impl DeferredError {
    fn defer(&self, error: KafkaError) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(error);
    }

    fn take(&self) -> Option<KafkaError> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).take()
    }
}

/// Append up to `max_records` messages from `next` behind `first`.
///
/// Stops at the first empty poll. An error ends the batch and is parked in
/// `deferred` rather than dropped.
fn drain_batch<F>(
    first: OwnedMessage,
    max_records: usize,
    deferred: &DeferredError,
    mut next: F,
) -> Vec<OwnedMessage>
where
    F: FnMut() -> Option<KafkaResult<OwnedMessage>>,
{
    let mut messages = vec![first];
    while messages.len() < max_records {
        match next() {
            Some(Ok(message)) => messages.push(message),
            Some(Err(e)) => {
                debug!(
                    "Consumer error after {} records, reporting on next poll: {}",
                    messages.len(),
                    e
                );
                deferred.defer(e);
                break;
            }
            None => break,
        }
    }
    messages
}

/// Subscription string for librdkafka, which treats a leading `^` as a regex
fn librdkafka_pattern(pattern: &Regex) -> String {
    if pattern.as_str().starts_with('^') {
        pattern.as_str().to_string()
    } else {
        format!("^{}", pattern.as_str())
    }
}

/// `BrokerConsumer` over an rdkafka `BaseConsumer`
pub struct RdKafkaConsumer {
    consumer: BaseConsumer<ConsumerClientContext>,
    wakeup: WakeupHandle,
    deferred: DeferredError,
    settings: DriverSettings,
}

impl RdKafkaConsumer {
    pub fn new(config: &ClientConfig, settings: DriverSettings) -> Result<Self, DriverError> {
        let consumer: BaseConsumer<ConsumerClientContext> =
            config.create_with_context(ConsumerClientContext::default())?;
        debug!(
            "Created consumer (max.poll.records={}, api timeout={:?})",
            settings.max_poll_records, settings.api_timeout
        );
        Ok(Self {
            consumer,
            wakeup: WakeupHandle::new(),
            deferred: DeferredError::default(),
            settings,
        })
    }

    /// Wait for the first message, in slices short enough to notice a wake-up
    fn poll_first(&self, timeout: Duration) -> Result<Option<OwnedMessage>, DriverError> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.wakeup.take() {
                return Err(DriverError::WakeupInterrupt);
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.consumer.poll(remaining.min(WAKEUP_CHECK_INTERVAL)) {
                Some(Ok(message)) => return Ok(Some(message.detach())),
                Some(Err(e)) => return Err(e.into()),
                None if Instant::now() >= deadline => return Ok(None),
                None => {}
            }
        }
    }
}

impl BrokerConsumer for RdKafkaConsumer {
    fn poll(&self, timeout: Duration) -> Result<NativeBatch, DriverError> {
        if let Some(e) = self.deferred.take() {
            return Err(e.into());
        }
        let Some(first) = self.poll_first(timeout)? else {
            return Ok(NativeBatch::empty());
        };

        let messages = drain_batch(
            first,
            self.settings.max_poll_records,
            &self.deferred,
            || {
                self.consumer
                    .poll(Duration::ZERO)
                    .map(|result| result.map(|message| message.detach()))
            },
        );
        Ok(NativeBatch::new(messages))
    }

    fn subscribe(
        &self,
        subscription: &Subscription,
        listener: Option<Arc<dyn RebalanceListener>>,
    ) -> Result<(), DriverError> {
        let context = self.consumer.context();
        match subscription {
            Subscription::Topics(topics) => {
                let topics: Vec<&str> = topics.iter().map(String::as_str).collect();
                debug!("Subscribing to topics {:?}", topics);
                context.subscribe_with(listener, || self.consumer.subscribe(&topics))
            }
            Subscription::Pattern(pattern) => {
                let pattern = librdkafka_pattern(pattern);
                debug!("Subscribing to pattern {}", pattern);
                context.subscribe_with(listener, || self.consumer.subscribe(&[pattern.as_str()]))
            }
        }
    }

    fn unsubscribe(&self) {
        debug!("Unsubscribing");
        self.consumer.unsubscribe();
        self.consumer.context().set_listener(None);
    }

    fn pause(&self, partitions: &TopicPartitionList) -> Result<(), DriverError> {
        Ok(self.consumer.pause(partitions)?)
    }

    fn resume(&self, partitions: &TopicPartitionList) -> Result<(), DriverError> {
        Ok(self.consumer.resume(partitions)?)
    }

    fn commit_consumed(&self) -> Result<(), DriverError> {
        match self.consumer.commit_consumer_state(CommitMode::Sync) {
            Ok(()) => Ok(()),
            Err(KafkaError::ConsumerCommit(RDKafkaErrorCode::NoOffset)) => {
                debug!("Nothing consumed since the last commit");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn commit(&self, offsets: &TopicPartitionList) -> Result<(), DriverError> {
        Ok(self.consumer.commit(offsets, CommitMode::Sync)?)
    }

    fn wakeup_handle(&self) -> WakeupHandle {
        self.wakeup.clone()
    }

    fn assignment(&self) -> Result<TopicPartitionList, DriverError> {
        Ok(self.consumer.assignment()?)
    }

    fn subscription(&self) -> Result<TopicPartitionList, DriverError> {
        Ok(self.consumer.subscription()?)
    }

    fn seek(&self, topic: &str, partition: i32, offset: i64) -> Result<(), DriverError> {
        Ok(self.consumer.seek(
            topic,
            partition,
            Offset::Offset(offset),
            self.settings.api_timeout,
        )?)
    }

    fn partitions_for(&self, topic: &str) -> Result<Vec<NativePartitionInfo>, DriverError> {
        let metadata = self
            .consumer
            .fetch_metadata(Some(topic), self.settings.api_timeout)?;
        partitions_from_metadata(&metadata, topic)
    }
}

// Producer
//=========

type DeliverySender = oneshot::Sender<Result<RecordMetadata, DriverError>>;

/// Producer context completing the delivery handle attached to each record
pub struct ProducerClientContext;

impl ClientContext for ProducerClientContext {
    fn log(&self, level: RDKafkaLogLevel, fac: &str, log_message: &str) {
        log_kafka_message(level, fac, log_message);
    }

    fn error(&self, error: KafkaError, reason: &str) {
        error!("Kafka producer error: {:?}, reason: {}", error, reason);
    }
}

impl ProducerContext for ProducerClientContext {
    type DeliveryOpaque = Box<DeliverySender>;

    fn delivery(&self, delivery_result: &DeliveryResult<'_>, sender: Self::DeliveryOpaque) {
        let outcome = match delivery_result {
            Ok(message) => Ok(RecordMetadata {
                topic: message.topic().to_string(),
                partition: message.partition(),
                offset: message.offset(),
            }),
            Err((e, message)) => {
                warn!("Delivery to {} failed: {}", message.topic(), e);
                Err(DriverError::Kafka(e.clone()))
            }
        };
        // The caller may have dropped its handle; the outcome is then discarded.
        let _ = (*sender).send(outcome);
    }
}

/// `BrokerProducer` over an rdkafka `ThreadedProducer`
pub struct RdKafkaProducer {
    producer: RwLock<Option<ThreadedProducer<ProducerClientContext>>>,
    settings: DriverSettings,
}

impl RdKafkaProducer {
    pub fn new(config: &ClientConfig, settings: DriverSettings) -> Result<Self, DriverError> {
        let producer: ThreadedProducer<ProducerClientContext> =
            config.create_with_context(ProducerClientContext)?;
        debug!("Created producer");
        Ok(Self {
            producer: RwLock::new(Some(producer)),
            settings,
        })
    }
}

impl BrokerProducer for RdKafkaProducer {
    fn send(&self, record: ProducerRecord) -> Result<DeliveryHandle, DriverError> {
        let guard = self.producer.read().unwrap_or_else(PoisonError::into_inner);
        let producer = guard.as_ref().ok_or(DriverError::ProducerClosed)?;

        let (sender, receiver) = oneshot::channel();
        let mut native: BaseRecord<'_, [u8], [u8], Box<DeliverySender>> =
            BaseRecord::with_opaque_to(&record.topic, Box::new(sender));
        if let Some(partition) = record.partition {
            native = native.partition(partition);
        }
        if let Some(key) = record.key.as_deref() {
            native = native.key(key);
        }
        if let Some(payload) = record.payload.as_deref() {
            native = native.payload(payload);
        }
        if let Some(timestamp) = record.timestamp {
            native = native.timestamp(timestamp);
        }
        if let Some(headers) = &record.headers {
            native = native.headers(headers.to_rdkafka_headers());
        }

        producer.send(native).map_err(|(e, _)| DriverError::Kafka(e))?;
        Ok(DeliveryHandle::new(async move {
            receiver.await.unwrap_or(Err(DriverError::DeliveryCanceled))
        }))
    }

    fn flush(&self, timeout: Option<Duration>) -> Result<(), DriverError> {
        let guard = self.producer.read().unwrap_or_else(PoisonError::into_inner);
        match guard.as_ref() {
            Some(producer) => Ok(producer.flush(to_rdkafka_timeout(timeout))?),
            None => Ok(()),
        }
    }

    fn close(&self, timeout: Option<Duration>) -> Result<(), DriverError> {
        let producer = self
            .producer
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match producer {
            Some(producer) => {
                debug!("Closing producer");
                producer.flush(to_rdkafka_timeout(timeout))?;
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn partitions_for(&self, topic: &str) -> Result<Vec<NativePartitionInfo>, DriverError> {
        let guard = self.producer.read().unwrap_or_else(PoisonError::into_inner);
        let producer = guard.as_ref().ok_or(DriverError::ProducerClosed)?;
        let metadata = producer
            .client()
            .fetch_metadata(Some(topic), self.settings.api_timeout)?;
        partitions_from_metadata(&metadata, topic)
    }
}

// Metadata
//=========

/// Resolve the partitions of `topic`, replacing broker ids with nodes
///
/// A topic absent from the response yields no partitions; a topic-level error
/// is returned as `KafkaError::MetadataFetch`.
fn partitions_from_metadata(
    metadata: &Metadata,
    topic: &str,
) -> Result<Vec<NativePartitionInfo>, DriverError> {
    let nodes: HashMap<i32, NativeNode> = metadata
        .brokers()
        .iter()
        .map(|broker| {
            (
                broker.id(),
                NativeNode {
                    id: broker.id(),
                    host: broker.host().to_string(),
                    port: broker.port(),
                },
            )
        })
        .collect();
    let resolve = |id: i32| {
        nodes.get(&id).cloned().unwrap_or(NativeNode {
            id,
            host: String::new(),
            port: -1,
        })
    };

    let Some(entry) = metadata.topics().iter().find(|t| t.name() == topic) else {
        return Ok(Vec::new());
    };
    if let Some(e) = entry.error() {
        return Err(KafkaError::MetadataFetch(RDKafkaErrorCode::from(e)).into());
    }

    Ok(entry
        .partitions()
        .iter()
        .map(|partition| NativePartitionInfo {
            topic: topic.to_string(),
            partition: partition.id(),
            leader: (partition.leader() >= 0).then(|| resolve(partition.leader())),
            replicas: partition.replicas().iter().map(|id| resolve(*id)).collect(),
            isr: partition.isr().iter().map(|id| resolve(*id)).collect(),
        })
        .collect())
}
