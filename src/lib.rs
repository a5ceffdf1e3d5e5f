//! # streamdriver
//!
//! A thin driver layer over Apache Kafka. Consumers and producers are used
//! through plain Rust data: poll results grouped by partition and by topic,
//! topic-partition keys, offset commits, rebalance events and send requests.
//! Payloads cross the boundary through pluggable codecs.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use streamdriver::{
//!     consumer, producer, ConsumerDriver, ProducerDriver, RebalanceEvent, StringCodec, YamlCodec,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let orders = producer(
//!     [("bootstrap.servers", "localhost:9092")],
//!     StringCodec,
//!     YamlCodec::<serde_yaml::Value>::new(),
//! )?;
//! orders
//!     .send_to("orders", Some("o-1".to_string()), Some(serde_yaml::from_str("{qty: 3}")?))?
//!     .wait()?;
//!
//! let driver = consumer(
//!     [("bootstrap.servers", "localhost:9092"), ("group.id", "shipping")],
//!     StringCodec,
//!     YamlCodec::<serde_yaml::Value>::new(),
//! )?;
//! driver.subscribe_with_listener(
//!     "orders".into(),
//!     (|event: RebalanceEvent| println!("{} {:?}", event.event, event.partitions)).into(),
//! )?;
//!
//! if let Some(batch) = driver.safe_poll(Duration::from_secs(1))? {
//!     for record in batch.records() {
//!         println!("{:?} => {:?}", record.key, record.value);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod streamdriver;

pub use streamdriver::error::DriverError;
pub use streamdriver::kafka::{
    BrokerConsumer, BrokerConsumerDriver, BrokerProducer,
    BrokerProducerDriver, CanonicalRecord, ConsumerDriver, DeliveryHandle, DriverConfig, Headers,
    Listener, MetadataDriver, NodeDescriptor, OffsetAndMetadata, OffsetCommit, PartitionInfo,
    PollResult, ProducerDriver, ProducerRecord, ProducerSendRequest, RebalanceEvent,
    RebalanceKind, RebalanceListener, RecordMetadata, Records, SendInput, SharedRecord,
    StopSignal, Subscription, SubscriptionTarget, TopicPartitionKey, WakeupHandle, build_record,
    consumer, make_listener, normalize_config, producer,
};
pub use streamdriver::serialization;
pub use streamdriver::serialization::{
    BytesCodec, Deserializer, JsonCodec, Keyword, KeywordCodec, SerializationError, Serializer,
    StringCodec, YamlCodec, make_deserializer, make_serializer,
};
