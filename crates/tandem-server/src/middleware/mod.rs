//! Router middleware shared by both servers.

mod observability;
mod recovery;

pub use observability::{REQUEST_ID_HEADER, RouterObservabilityExt};
pub use recovery::{DEFAULT_REQUEST_TIMEOUT, RecoveryConfig, RouterRecoveryExt};
