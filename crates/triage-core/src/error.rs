use thiserror::Error;

/// Cross-stage error kinds. Per-stage crates define their own narrower
/// error enums and convert into/out of these where they touch shared
/// collaborators (config, broker).
#[derive(Debug, Error)]
pub enum TriageError {
    #[error("config error: {0}")]
    Config(String),

    #[error("broker error: {0}")]
    Broker(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid regex: {0}")]
    Regex(#[from] regex::Error),
}

pub type Result<T> = std::result::Result<T, TriageError>;
