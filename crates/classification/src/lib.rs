pub mod error;
pub mod metrics;
pub mod model;
pub mod stage;

pub use error::ClassificationError;
pub use metrics::ClassificationMetrics;
pub use model::classify;
pub use stage::{build_stage, ClassificationDeps};
