use thiserror::Error;

/// Platform-API failure kinds. A 404 is permanent per §7's
/// `NotFoundError`; everything else is transient until the retry budget
/// is exhausted.
#[derive(Debug, Error, Clone)]
pub enum PlatformError {
    #[error("object not found")]
    NotFound,

    #[error("transient platform API failure: {0}")]
    Transient(String),

    #[error("malformed platform API response: {0}")]
    Decode(String),
}
