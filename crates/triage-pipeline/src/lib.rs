pub mod metrics;
pub mod retry;
pub mod stage;

pub use metrics::{metrics_router, StageMetrics};
pub use retry::{retry as retry_with_policy, Attempt, RetryPolicy};
pub use stage::{ProcessOutcome, Stage, StageBuilder, StageContext};
