pub mod app;
pub mod error;
pub mod extract;
pub mod group;
pub mod stage;
pub mod state;

pub use app::{app, VerificationState};
pub use error::VerificationError;
pub use extract::extract_email;
pub use stage::build_stage;
pub use state::TrustState;
