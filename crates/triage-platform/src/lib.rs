pub mod client;
pub mod error;
pub mod metrics;

pub use client::{GroupMember, PlatformClient};
pub use error::PlatformError;
pub use metrics::PlatformMetrics;
