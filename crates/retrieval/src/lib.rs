pub mod error;
pub mod fetch;
pub mod snippet;
pub mod stage;

pub use error::RetrievalError;
pub use stage::{build_stage, RetrievalDeps};
