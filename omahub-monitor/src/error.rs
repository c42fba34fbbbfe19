use thiserror::Error;

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serde JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service worker channel closed")]
    WorkerUnavailable,

    #[error("service worker did not answer within {0} ms")]
    WorkerTimeout(u64),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, MonitorError>;
