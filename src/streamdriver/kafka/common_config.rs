use std::collections::HashMap;
use std::fmt::Display;
use std::time::Duration;

/// Maximum number of records gathered into one poll batch
pub const MAX_POLL_RECORDS: &str = "max.poll.records";
/// Timeout applied to blocking metadata queries
pub const DEFAULT_API_TIMEOUT_MS: &str = "default.api.timeout.ms";

const DEFAULT_MAX_POLL_RECORDS: usize = 500;
const DEFAULT_API_TIMEOUT: Duration = Duration::from_secs(60);

/// Converts an option mapping into the flat string map the broker client expects.
///
/// Keys are rendered through `Display` (a `Keyword` renders as its bare name),
/// values likewise. No option names are validated.
pub fn normalize_config<I, K, V>(options: I) -> HashMap<String, String>
where
    I: IntoIterator<Item = (K, V)>,
    K: Display,
    V: Display,
{
    options
        .into_iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

/// Options consumed by the drivers themselves, never passed to librdkafka
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverSettings {
    pub max_poll_records: usize,
    pub api_timeout: Duration,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            max_poll_records: DEFAULT_MAX_POLL_RECORDS,
            api_timeout: DEFAULT_API_TIMEOUT,
        }
    }
}

impl DriverSettings {
    /// Removes driver-level options from a normalized map and parses them.
    ///
    /// Unparseable values fall back to the defaults with a warning.
    pub fn extract(options: &mut HashMap<String, String>) -> Self {
        let mut settings = Self::default();

        if let Some(raw) = options.remove(MAX_POLL_RECORDS) {
            match raw.parse::<usize>() {
                Ok(n) if n > 0 => settings.max_poll_records = n,
                _ => log::warn!("Ignoring invalid {}='{}'", MAX_POLL_RECORDS, raw),
            }
        }
        if let Some(raw) = options.remove(DEFAULT_API_TIMEOUT_MS) {
            match raw.parse::<u64>() {
                Ok(ms) => settings.api_timeout = Duration::from_millis(ms),
                Err(_) => log::warn!("Ignoring invalid {}='{}'", DEFAULT_API_TIMEOUT_MS, raw),
            }
        }

        settings
    }
}

/// Common configuration shared between consumer and producer drivers
///
/// A typed front for the handful of options almost every client sets. Anything
/// else goes through `custom_property`; `to_options` yields the normalized map
/// handed to the driver factories.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Kafka broker list (e.g., "localhost:9092" or "broker1:9092,broker2:9092")
    pub brokers: String,
    pub client_id: Option<String>,
    /// Consumer group; ignored by producers
    pub group_id: Option<String>,
    pub request_timeout: Duration,
    /// Additional custom configuration properties
    pub custom_config: HashMap<String, String>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            brokers: "localhost:9092".to_string(),
            client_id: None,
            group_id: None,
            request_timeout: Duration::from_secs(30),
            custom_config: HashMap::new(),
        }
    }
}

impl DriverConfig {
    pub fn new(brokers: impl Into<String>) -> Self {
        Self {
            brokers: brokers.into(),
            ..Default::default()
        }
    }

    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    pub fn group_id(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = Some(group_id.into());
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Add custom configuration property
    pub fn custom_property(mut self, key: impl Display, value: impl Display) -> Self {
        self.custom_config.insert(key.to_string(), value.to_string());
        self
    }

    /// Add multiple custom properties
    pub fn custom_properties<I, K, V>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Display,
        V: Display,
    {
        self.custom_config.extend(normalize_config(properties));
        self
    }

    /// Render into the normalized string map; custom properties win over typed fields.
    pub fn to_options(&self) -> HashMap<String, String> {
        let mut options = HashMap::new();
        options.insert("bootstrap.servers".to_string(), self.brokers.clone());
        options.insert(
            "request.timeout.ms".to_string(),
            self.request_timeout.as_millis().to_string(),
        );
        if let Some(id) = &self.client_id {
            options.insert("client.id".to_string(), id.clone());
        }
        if let Some(group) = &self.group_id {
            options.insert("group.id".to_string(), group.clone());
        }
        options.extend(self.custom_config.clone());
        options
    }
}
