//! Retention decisions for registry images.
//!
//! Deciding what to delete from a repository happens in two pure steps:
//! 1. The configured [`RetentionPolicy`](crate::config::RetentionPolicy)
//!    selects deletion candidates from the repository's images, split into
//!    tags (tagged images) and digests (untagged images)
//! 2. Candidate tags that are in use or protected by an exclusion pattern are
//!    dropped by [`reconcile`]
//!
//! Neither step performs I/O or logs; diagnostics are returned as data.

mod policy;
mod reconcile;

pub use policy::DeletionCandidates;
pub use reconcile::{ExclusionRules, InvalidPattern, reconcile};
