use rdkafka::config::RDKafkaLogLevel;
use std::time::Duration;

pub fn convert_kafka_log_level(kafka_level: RDKafkaLogLevel) -> log::Level {
    match kafka_level {
        RDKafkaLogLevel::Emerg | RDKafkaLogLevel::Alert | RDKafkaLogLevel::Critical => {
            log::Level::Error
        }
        RDKafkaLogLevel::Error => log::Level::Error,
        RDKafkaLogLevel::Warning => log::Level::Warn,
        RDKafkaLogLevel::Notice | RDKafkaLogLevel::Info => log::Level::Info,
        RDKafkaLogLevel::Debug => log::Level::Debug,
    }
}

/// `None` means wait forever, the way the broker client reads an absent timeout.
pub fn to_rdkafka_timeout(timeout: Option<Duration>) -> rdkafka::util::Timeout {
    match timeout {
        Some(duration) => rdkafka::util::Timeout::After(duration),
        None => rdkafka::util::Timeout::Never,
    }
}
