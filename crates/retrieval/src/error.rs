use thiserror::Error;
use triage_platform::PlatformError;

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("missing required field on payload: {0}")]
    MissingField(&'static str),

    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error("verification service call failed: {0}")]
    VerifyCall(String),
}
