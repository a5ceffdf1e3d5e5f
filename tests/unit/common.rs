// Common imports and in-memory broker clients for driver tests
// The mocks share their state through an Arc so a test keeps a handle after
// the client has been moved into a driver.

pub use serde_json::json;
pub use std::sync::Arc;
pub use std::time::{Duration, Instant};
pub use streamdriver::streamdriver::kafka::client::{NativeBatch, NativeNode, NativePartitionInfo};
pub use streamdriver::{
    BrokerConsumer, BrokerConsumerDriver, BrokerProducer, BrokerProducerDriver, ConsumerDriver,
    DeliveryHandle, DriverError, Headers, Listener, MetadataDriver, OffsetCommit, PollResult,
    ProducerDriver, ProducerRecord, ProducerSendRequest, RebalanceEvent, RebalanceKind,
    RebalanceListener, RecordMetadata, SendInput, SerializationError, Serializer, StringCodec,
    Subscription, SubscriptionTarget, TopicPartitionKey, WakeupHandle,
};

use futures::channel::oneshot;
use rdkafka::message::OwnedMessage;
use rdkafka::{Offset, Timestamp, TopicPartitionList};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;

pub(crate) fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub(crate) fn message(topic: &str, partition: i32, offset: i64, key: Option<&str>, value: &str) -> OwnedMessage {
    OwnedMessage::new(
        Some(value.as_bytes().to_vec()),
        key.map(|k| k.as_bytes().to_vec()),
        topic.to_string(),
        Timestamp::CreateTime(1_700_000_000_000 + offset),
        partition,
        offset,
        None,
    )
}

pub(crate) fn node(id: i32) -> NativeNode {
    NativeNode {
        id,
        host: format!("broker-{}", id),
        port: 9092,
    }
}

fn tpl(partitions: &[(&str, i32)]) -> TopicPartitionList {
    let mut list = TopicPartitionList::new();
    for (topic, partition) in partitions {
        list.add_partition(topic, *partition);
    }
    list
}

// Consumer
//=========

#[derive(Default)]
pub struct MockConsumerState {
    pub batches: Mutex<VecDeque<Vec<OwnedMessage>>>,
    pub subscription: Mutex<Option<Subscription>>,
    pub listener: Mutex<Option<Arc<dyn RebalanceListener>>>,
    pub subscribe_calls: AtomicUsize,
    pub unsubscribed: AtomicBool,
    pub paused: Mutex<Vec<TopicPartitionKey>>,
    pub resumed: Mutex<Vec<TopicPartitionKey>>,
    pub consumed_commits: AtomicUsize,
    pub commits: Mutex<Vec<Vec<OffsetCommit>>>,
    pub assignment: Mutex<Vec<TopicPartitionKey>>,
    pub seeks: Mutex<Vec<(String, i32, i64)>>,
    pub partitions: Mutex<Vec<NativePartitionInfo>>,
}

impl MockConsumerState {
    /// Queue the records returned by one future poll
    pub fn push_batch(&self, messages: Vec<OwnedMessage>) {
        self.batches.lock().unwrap().push_back(messages);
    }

    /// Simulate the broker assigning partitions to this consumer
    pub fn assign(&self, partitions: &[(&str, i32)]) {
        *self.assignment.lock().unwrap() = partitions
            .iter()
            .map(|(topic, partition)| TopicPartitionKey::new(*topic, *partition))
            .collect();
        if let Some(listener) = self.listener.lock().unwrap().clone() {
            listener.on_partitions_assigned(&tpl(partitions));
        }
    }

    /// Simulate the broker revoking partitions from this consumer
    pub fn revoke(&self, partitions: &[(&str, i32)]) {
        if let Some(listener) = self.listener.lock().unwrap().clone() {
            listener.on_partitions_revoked(&tpl(partitions));
        }
        self.assignment.lock().unwrap().clear();
    }
}

pub struct MockConsumer {
    pub state: Arc<MockConsumerState>,
    wakeup: WakeupHandle,
}

impl MockConsumer {
    pub fn new() -> (Self, Arc<MockConsumerState>) {
        let state = Arc::new(MockConsumerState::default());
        let consumer = Self {
            state: Arc::clone(&state),
            wakeup: WakeupHandle::new(),
        };
        (consumer, state)
    }
}

impl BrokerConsumer for MockConsumer {
    fn poll(&self, timeout: Duration) -> Result<NativeBatch, DriverError> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.wakeup.take() {
                return Err(DriverError::WakeupInterrupt);
            }
            if let Some(messages) = self.state.batches.lock().unwrap().pop_front() {
                return Ok(NativeBatch::new(messages));
            }
            if Instant::now() >= deadline {
                return Ok(NativeBatch::empty());
            }
            thread::sleep(Duration::from_millis(5));
        }
    }

    fn subscribe(
        &self,
        subscription: &Subscription,
        listener: Option<Arc<dyn RebalanceListener>>,
    ) -> Result<(), DriverError> {
        self.state.subscribe_calls.fetch_add(1, Ordering::SeqCst);
        *self.state.subscription.lock().unwrap() = Some(subscription.clone());
        *self.state.listener.lock().unwrap() = listener;
        Ok(())
    }

    fn unsubscribe(&self) {
        self.state.unsubscribed.store(true, Ordering::SeqCst);
        *self.state.subscription.lock().unwrap() = None;
        *self.state.listener.lock().unwrap() = None;
    }

    fn pause(&self, partitions: &TopicPartitionList) -> Result<(), DriverError> {
        self.state.paused.lock().unwrap().extend(keys(partitions));
        Ok(())
    }

    fn resume(&self, partitions: &TopicPartitionList) -> Result<(), DriverError> {
        self.state.resumed.lock().unwrap().extend(keys(partitions));
        Ok(())
    }

    fn commit_consumed(&self) -> Result<(), DriverError> {
        self.state.consumed_commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn commit(&self, offsets: &TopicPartitionList) -> Result<(), DriverError> {
        let commits = offsets
            .elements()
            .iter()
            .map(|elem| {
                let offset = match elem.offset() {
                    Offset::Offset(offset) => offset,
                    other => panic!("unexpected offset {:?}", other),
                };
                let commit = OffsetCommit::new(elem.topic(), elem.partition(), offset);
                match elem.metadata() {
                    "" => commit,
                    metadata => commit.with_metadata(metadata),
                }
            })
            .collect();
        self.state.commits.lock().unwrap().push(commits);
        Ok(())
    }

    fn wakeup_handle(&self) -> WakeupHandle {
        self.wakeup.clone()
    }

    fn assignment(&self) -> Result<TopicPartitionList, DriverError> {
        let assignment = self.state.assignment.lock().unwrap();
        let mut list = TopicPartitionList::new();
        for key in assignment.iter() {
            list.add_partition(&key.topic, key.partition);
        }
        Ok(list)
    }

    fn subscription(&self) -> Result<TopicPartitionList, DriverError> {
        let mut list = TopicPartitionList::new();
        match self.state.subscription.lock().unwrap().as_ref() {
            Some(Subscription::Topics(topics)) => {
                for topic in topics {
                    list.add_partition(topic, -1);
                }
            }
            Some(Subscription::Pattern(pattern)) => {
                list.add_partition(&format!("^{}", pattern.as_str()), -1);
            }
            None => {}
        }
        Ok(list)
    }

    fn seek(&self, topic: &str, partition: i32, offset: i64) -> Result<(), DriverError> {
        self.state
            .seeks
            .lock()
            .unwrap()
            .push((topic.to_string(), partition, offset));
        Ok(())
    }

    fn partitions_for(&self, topic: &str) -> Result<Vec<NativePartitionInfo>, DriverError> {
        Ok(self
            .state
            .partitions
            .lock()
            .unwrap()
            .iter()
            .filter(|info| info.topic == topic)
            .cloned()
            .collect())
    }
}

fn keys(list: &TopicPartitionList) -> Vec<TopicPartitionKey> {
    list.elements()
        .iter()
        .map(|elem| TopicPartitionKey::new(elem.topic(), elem.partition()))
        .collect()
}

pub(crate) fn string_consumer() -> (BrokerConsumerDriver<String, String>, Arc<MockConsumerState>) {
    let (client, state) = MockConsumer::new();
    (
        BrokerConsumerDriver::new(Box::new(client), StringCodec, StringCodec),
        state,
    )
}

// Producer
//=========

#[derive(Default)]
pub struct MockProducerState {
    pub sent: Mutex<Vec<ProducerRecord>>,
    pub flushes: AtomicUsize,
    pub closes: Mutex<Vec<Option<Duration>>>,
    pub partitions: Mutex<Vec<NativePartitionInfo>>,
}

/// Producer acknowledging every record from a background thread
pub struct MockProducer {
    pub state: Arc<MockProducerState>,
}

impl MockProducer {
    pub fn new() -> (Self, Arc<MockProducerState>) {
        let state = Arc::new(MockProducerState::default());
        (
            Self {
                state: Arc::clone(&state),
            },
            state,
        )
    }
}

impl BrokerProducer for MockProducer {
    fn send(&self, record: ProducerRecord) -> Result<DeliveryHandle, DriverError> {
        let mut sent = self.state.sent.lock().unwrap();
        let metadata = RecordMetadata {
            topic: record.topic.clone(),
            partition: record.partition.unwrap_or(0),
            offset: sent.len() as i64,
        };
        sent.push(record);

        let (sender, receiver) = oneshot::channel();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            let _ = sender.send(Ok(metadata));
        });
        Ok(DeliveryHandle::new(async move {
            receiver.await.unwrap_or(Err(DriverError::DeliveryCanceled))
        }))
    }

    fn flush(&self, _timeout: Option<Duration>) -> Result<(), DriverError> {
        self.state.flushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn close(&self, timeout: Option<Duration>) -> Result<(), DriverError> {
        self.state.closes.lock().unwrap().push(timeout);
        Ok(())
    }

    fn partitions_for(&self, topic: &str) -> Result<Vec<NativePartitionInfo>, DriverError> {
        Ok(self
            .state
            .partitions
            .lock()
            .unwrap()
            .iter()
            .filter(|info| info.topic == topic)
            .cloned()
            .collect())
    }
}

/// String serializer counting its lifecycle hook calls
#[derive(Clone, Default)]
pub struct CountingSerializer {
    pub configured: Arc<AtomicUsize>,
    pub closed: Arc<AtomicUsize>,
}

impl Serializer<String> for CountingSerializer {
    fn serialize(&self, topic: &str, data: Option<&String>) -> Result<Option<Vec<u8>>, SerializationError> {
        StringCodec.serialize(topic, data)
    }

    fn configure(&self, _configs: &std::collections::HashMap<String, String>, _is_key: bool) {
        self.configured.fetch_add(1, Ordering::SeqCst);
    }

    fn close(&self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

pub(crate) fn string_producer() -> (BrokerProducerDriver<String, String>, Arc<MockProducerState>) {
    let (client, state) = MockProducer::new();
    (
        BrokerProducerDriver::new(Box::new(client), StringCodec, StringCodec),
        state,
    )
}
