pub mod app;
pub mod classify;
pub mod metrics;

pub use app::{app, IngressState};
pub use classify::classify;
pub use metrics::IngressMetrics;
