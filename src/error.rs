use metrics_exporter_prometheus::BuildError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("Metric already registered: {0}")]
    AlreadyRegistered(String),

    #[error("Recorder build error: {0}")]
    Build(#[from] BuildError),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
}

pub type Result<T> = std::result::Result<T, MetricsError>;
