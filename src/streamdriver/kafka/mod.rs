// Broker client contract and its rdkafka implementation
pub mod client;
pub mod client_config_builder;
pub mod common_config;
pub mod rdkafka_client;
pub mod utils;

// Canonical data model and translation
pub mod headers;
pub mod poll_result;
pub mod rebalance;
pub mod translator;
pub mod types;

// Drivers
pub mod consumer_driver;
pub mod metadata_driver;
pub mod producer_driver;

pub use client::{BrokerConsumer, BrokerProducer, DeliveryHandle, Subscription, WakeupHandle};
pub use common_config::{DriverConfig, normalize_config};
pub use consumer_driver::{BrokerConsumerDriver, ConsumerDriver, StopSignal, consumer};
pub use headers::Headers;
pub use metadata_driver::MetadataDriver;
pub use poll_result::{PollResult, Records, SharedRecord};
pub use producer_driver::{BrokerProducerDriver, ProducerDriver, SendInput, build_record, producer};
pub use rebalance::{Listener, RebalanceListener, make_listener};
pub use translator::SubscriptionTarget;
pub use types::{
    CanonicalRecord, NodeDescriptor, OffsetAndMetadata, OffsetCommit, PartitionInfo,
    ProducerRecord, ProducerSendRequest, RebalanceEvent, RebalanceKind, RecordMetadata,
    TopicPartitionKey,
};
