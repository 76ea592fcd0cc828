use thiserror::Error;

#[derive(Error, Debug)]
pub enum BoardError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Kubernetes error: {0}")]
    KubernetesError(String),

    #[error("Query {query} failed: {reason}")]
    QueryFailed { query: String, reason: String },

    #[error("Query {query} result type {result_type} is not vector")]
    UnexpectedResultType { query: String, result_type: String },

    #[error("Invalid sample value {0:?}")]
    InvalidSampleValue(String),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Metrics error: {0}")]
    MetricsError(#[from] prometheus::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, BoardError>;
