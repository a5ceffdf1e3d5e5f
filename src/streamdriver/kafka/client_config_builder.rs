use rdkafka::config::{ClientConfig, RDKafkaLogLevel};
use std::collections::HashMap;

/// Builds the rdkafka `ClientConfig` out of a normalized option map.
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: ClientConfig::new(),
        }
    }

    /// Copy every normalized option verbatim
    pub fn options(mut self, options: &HashMap<String, String>) -> Self {
        for (key, value) in options {
            self.config.set(key, value);
        }
        self
    }

    /// Forward librdkafka logs at the verbosity the `log` facade currently admits
    pub fn log_level_from_facade(mut self) -> Self {
        let level = match log::max_level() {
            log::LevelFilter::Off | log::LevelFilter::Error => RDKafkaLogLevel::Error,
            log::LevelFilter::Warn => RDKafkaLogLevel::Warning,
            log::LevelFilter::Info => RDKafkaLogLevel::Info,
            log::LevelFilter::Debug | log::LevelFilter::Trace => RDKafkaLogLevel::Debug,
        };
        self.config.set_log_level(level);
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}

impl Default for ClientConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
