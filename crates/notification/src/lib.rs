pub mod format;
pub mod metrics;
pub mod stage;
pub mod templates;

pub use metrics::NotificationMetrics;
pub use stage::{build_stage, NotificationDeps};
pub use templates::render;
