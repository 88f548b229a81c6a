use thiserror::Error;

/// Mirrors the shape of `QueueError` in the teacher's SQS-backed queue
/// crate: connection failures are fatal at startup, everything else is a
/// per-operation failure the caller decides how to react to.
#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("broker connection error: {0}")]
    Connection(String),

    #[error("unknown stream: {0}")]
    UnknownStream(String),

    #[error("ack failed: {0}")]
    Ack(String),

    #[error("record not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, BrokerError>;
