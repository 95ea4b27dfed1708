//! Deletes stale Amazon ECR images that no workload in a set of Amazon EKS
//! clusters is using.
//!
//! The decision pipeline ([`images`], [`retention`]) is pure and synchronous.
//! Registry and cluster access sit behind the [`registry::ImageRegistry`] and
//! [`clusters::WorkloadSource`] traits, and [`cleanup`] ties them together.

pub mod aws;
pub mod cleanup;
pub mod clusters;
pub mod config;
pub mod images;
pub mod observability;
pub mod registry;
pub mod retention;
