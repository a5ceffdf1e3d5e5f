use crate::streamdriver::serialization::SerializationError;
use rdkafka::error::KafkaError;

/// Unified error type for consumer, producer and metadata driver operations
///
/// Validation failures (`InvalidArgument`, `MissingTopic`) are raised before
/// anything reaches the broker client. Broker and codec failures are carried
/// through unchanged.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// Subscription target was not a topic name, a list of topic names or a pattern
    #[error("Invalid argument: {value}")]
    InvalidArgument { value: String },

    /// Producer record requested without a topic
    #[error("Producer record requires a topic")]
    MissingTopic,

    /// A blocked poll was interrupted by `wake_up`
    #[error("Poll interrupted by wake-up")]
    WakeupInterrupt,

    /// Send attempted after the producer was closed
    #[error("Producer is closed")]
    ProducerClosed,

    /// The broker client dropped a delivery report before completing it
    #[error("Delivery report canceled")]
    DeliveryCanceled,

    #[error("Kafka error: {0}")]
    Kafka(#[from] KafkaError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] SerializationError),
}

impl DriverError {
    pub fn invalid_argument(value: impl Into<String>) -> Self {
        DriverError::InvalidArgument {
            value: value.into(),
        }
    }

    /// Whether this is the wake-up control condition rather than a failure
    pub fn is_wakeup(&self) -> bool {
        matches!(self, DriverError::WakeupInterrupt)
    }
}
