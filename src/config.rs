// config.rs
use serde::Deserialize;

use crate::error::Result;

/// Histogram ladder used when no buckets are configured, in seconds.
pub const DEFAULT_BUCKETS: [f64; 15] = [
    0.0005,
    0.001, // 1ms
    0.002,
    0.005,
    0.01, // 10ms
    0.02,
    0.05,
    0.1, // 100ms
    0.2,
    0.5,
    1.0, // 1s
    2.0,
    5.0,
    10.0,
    30.0,
];

pub const DEFAULT_NAMESPACE: &str = "echo";
pub const DEFAULT_SUBSYSTEM: &str = "http";

/// Settings for the request metrics middleware.
///
/// Values are taken as given: an empty or unordered `buckets` list is
/// passed through and left to the registry to accept or reject.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct MetricsConfig {
    pub namespace: String,
    pub subsystem: String,
    pub buckets: Vec<f64>,
    pub normalize_http_status: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            subsystem: DEFAULT_SUBSYSTEM.to_string(),
            buckets: DEFAULT_BUCKETS.to_vec(),
            normalize_http_status: true,
        }
    }
}

impl MetricsConfig {
    pub fn with_namespace(self, namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ..self
        }
    }

    pub fn with_subsystem(self, subsystem: impl Into<String>) -> Self {
        Self {
            subsystem: subsystem.into(),
            ..self
        }
    }

    pub fn with_buckets(self, buckets: impl Into<Vec<f64>>) -> Self {
        Self {
            buckets: buckets.into(),
            ..self
        }
    }

    pub fn with_normalize_http_status(self, normalize_http_status: bool) -> Self {
        Self {
            normalize_http_status,
            ..self
        }
    }

    /// Load config from `config/metrics` and `METRICS__*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::load("config/metrics")
    }

    /// Load config from an optional file, then environment variables.
    ///
    /// `METRICS__BUCKETS` is read as a comma separated list.
    pub fn load(file: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(file).required(false))
            .add_source(
                config::Environment::with_prefix("METRICS")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("buckets"),
            )
            .build()?;

        let cfg: MetricsConfig = settings.try_deserialize()?;
        Ok(cfg)
    }
}
