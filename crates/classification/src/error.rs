use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum ClassificationError {
    #[error("model server request failed: {0}")]
    RequestFailed(String),

    #[error("malformed model server response: {0}")]
    Decode(String),
}
