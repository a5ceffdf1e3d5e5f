//! Producer driver
//!
//! [`BrokerProducerDriver`] owns one broker producer plus the key/value
//! serializers. Sends never block: each returns a [`DeliveryHandle`] that
//! resolves once the broker acknowledges or rejects the record.
//!
//! ```rust,no_run
//! use streamdriver::{producer, JsonCodec, ProducerDriver, ProducerSendRequest, StringCodec};
//!
//! # async fn run() -> Result<(), streamdriver::DriverError> {
//! let driver = producer(
//!     [("bootstrap.servers", "localhost:9092")],
//!     StringCodec,
//!     JsonCodec::<serde_json::Value>::new(),
//! )?;
//!
//! let request = ProducerSendRequest::new("invoices")
//!     .key("inv-17".to_string())
//!     .value(serde_json::json!({"amount": 120}));
//! let metadata = driver.send(request.into())?.await?;
//! println!("stored at {}-{}@{}", metadata.topic, metadata.partition, metadata.offset);
//!
//! driver.close(None)?;
//! # Ok(())
//! # }
//! ```

use crate::streamdriver::error::DriverError;
use crate::streamdriver::kafka::client::{BrokerProducer, DeliveryHandle};
use crate::streamdriver::kafka::client_config_builder::ClientConfigBuilder;
use crate::streamdriver::kafka::common_config::{DriverSettings, normalize_config};
use crate::streamdriver::kafka::metadata_driver::{MetadataDriver, translate_partitions};
use crate::streamdriver::kafka::rdkafka_client::RdKafkaProducer;
use crate::streamdriver::kafka::types::{PartitionInfo, ProducerRecord, ProducerSendRequest};
use crate::streamdriver::serialization::Serializer;
use log::debug;
use std::fmt::Display;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// What [`ProducerDriver::send`] accepts
#[derive(Debug, Clone)]
pub enum SendInput<K, V> {
    /// Already encoded, forwarded unchanged
    Record(ProducerRecord),
    /// Encoded with the driver's serializers first
    Request(ProducerSendRequest<K, V>),
}

impl<K, V> From<ProducerRecord> for SendInput<K, V> {
    fn from(record: ProducerRecord) -> Self {
        SendInput::Record(record)
    }
}

impl<K, V> From<ProducerSendRequest<K, V>> for SendInput<K, V> {
    fn from(request: ProducerSendRequest<K, V>) -> Self {
        SendInput::Request(request)
    }
}

pub trait ProducerDriver<K, V>: MetadataDriver {
    /// Hand one record to the broker client without waiting for delivery
    fn send(&self, input: SendInput<K, V>) -> Result<DeliveryHandle, DriverError>;

    /// Shorthand for sending `{topic, key, value}`
    fn send_to(
        &self,
        topic: &str,
        key: Option<K>,
        value: Option<V>,
    ) -> Result<DeliveryHandle, DriverError> {
        self.send(SendInput::Request(ProducerSendRequest {
            topic: Some(topic.to_string()),
            key,
            value,
            ..Default::default()
        }))
    }

    /// Block until every record sent so far is delivered or failed
    fn flush(&self) -> Result<(), DriverError>;

    /// Flush, release the broker client and close both serializers.
    ///
    /// `None` waits as long as delivery takes. Closing twice is a no-op.
    fn close(&self, timeout: Option<Duration>) -> Result<(), DriverError>;
}

/// Build the record handed to the broker client.
///
/// The topic is required and checked before anything is encoded. A partition
/// is only honored together with a key; a keyless request always leaves the
/// partition to the partitioner.
pub fn build_record<K, V>(
    request: ProducerSendRequest<K, V>,
    key_serializer: &dyn Serializer<K>,
    value_serializer: &dyn Serializer<V>,
) -> Result<ProducerRecord, DriverError> {
    let topic = request.topic.as_deref().ok_or(DriverError::MissingTopic)?;
    let value = value_serializer.serialize(topic, request.value.as_ref())?;

    let mut record = match (&request.key, request.partition) {
        (Some(key), Some(partition)) => {
            let key = key_serializer.serialize(topic, Some(key))?;
            ProducerRecord::with_partition(topic, partition, key, value)
        }
        (Some(key), None) => {
            let key = key_serializer.serialize(topic, Some(key))?;
            ProducerRecord::with_key(topic, key, value)
        }
        (None, _) => ProducerRecord::new(topic, value),
    };
    record.timestamp = request.timestamp;
    record.headers = request.headers;
    Ok(record)
}

pub struct BrokerProducerDriver<K, V> {
    client: Box<dyn BrokerProducer>,
    key_serializer: Box<dyn Serializer<K>>,
    value_serializer: Box<dyn Serializer<V>>,
    closed: AtomicBool,
}

impl<K, V> BrokerProducerDriver<K, V> {
    pub fn new(
        client: Box<dyn BrokerProducer>,
        key_serializer: impl Serializer<K> + 'static,
        value_serializer: impl Serializer<V> + 'static,
    ) -> Self {
        Self {
            client,
            key_serializer: Box::new(key_serializer),
            value_serializer: Box::new(value_serializer),
            closed: AtomicBool::new(false),
        }
    }
}

impl<K, V> MetadataDriver for BrokerProducerDriver<K, V> {
    fn partitions_for(&self, topic: &str) -> Result<Vec<PartitionInfo>, DriverError> {
        Ok(translate_partitions(&self.client.partitions_for(topic)?))
    }
}

impl<K, V> ProducerDriver<K, V> for BrokerProducerDriver<K, V> {
    fn send(&self, input: SendInput<K, V>) -> Result<DeliveryHandle, DriverError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(DriverError::ProducerClosed);
        }
        let record = match input {
            SendInput::Record(record) => record,
            SendInput::Request(request) => build_record(
                request,
                self.key_serializer.as_ref(),
                self.value_serializer.as_ref(),
            )?,
        };
        self.client.send(record)
    }

    fn flush(&self) -> Result<(), DriverError> {
        self.client.flush(None)
    }

    fn close(&self, timeout: Option<Duration>) -> Result<(), DriverError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        debug!("Closing producer driver (timeout {:?})", timeout);
        let result = self.client.close(timeout);
        self.key_serializer.close();
        self.value_serializer.close();
        result
    }
}

/// Build a producer driver backed by rdkafka.
///
/// Options are handled as for [`consumer`](crate::consumer); both serializers
/// see the normalized options through their `configure` hook.
pub fn producer<O, N, S, K, V>(
    options: O,
    key_serializer: impl Serializer<K> + 'static,
    value_serializer: impl Serializer<V> + 'static,
) -> Result<BrokerProducerDriver<K, V>, DriverError>
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
    let client = RdKafkaProducer::new(&config, settings)?;

    key_serializer.configure(&options, true);
    value_serializer.configure(&options, false);
    Ok(BrokerProducerDriver::new(
        Box::new(client),
        key_serializer,
        value_serializer,
    ))
}
