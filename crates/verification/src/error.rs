use thiserror::Error;
use triage_platform::PlatformError;

#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("email not present on the payload for this event kind")]
    EmailNotFound,

    #[error("platform API failure while resolving group email: {0}")]
    PlatformFailure(#[from] PlatformError),
}
