//! Observability module providing structured logging.
//!
//! Every recoverable failure in a run (an unreachable cluster, a repository
//! that could not be described, a malformed exclusion pattern) is reported
//! through `tracing` events carrying the originating cluster / repository.

mod tracing_init;

pub use tracing_init::*;
