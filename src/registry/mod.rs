//! Container image registry access.
//!
//! The cleanup run talks to the registry only through [`ImageRegistry`]:
//! - Listing the repositories selected by configuration
//! - Describing the images stored in one repository
//! - Deleting a batch of images from one repository
//!
//! [`EcrRegistry`] implements it against Amazon ECR.

mod ecr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
pub use ecr::EcrRegistry;
use thiserror::Error;

use crate::config::RepositorySelection;

/// One image stored in a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryImage {
    pub pushed_at: DateTime<Utc>,
    /// Tags in registry order. Empty for untagged images.
    pub tags: Vec<String>,
    /// Content digest, unique within the repository.
    pub digest: String,
}

/// A repository in the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub name: String,
    /// Fully qualified URI, as it appears in workload image references.
    pub uri: String,
}

/// Identifies an image to delete.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ImageId {
    Tag(String),
    Digest(String),
}

impl std::fmt::Display for ImageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageId::Tag(tag) => write!(f, "tag:{tag}"),
            ImageId::Digest(digest) => f.write_str(digest),
        }
    }
}

/// An image the registry refused to delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteFailure {
    pub image: String,
    pub reason: String,
}

/// Result of a delete request that reached the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteOutcome {
    /// Number of images the registry reported as deleted.
    pub deleted: usize,
    /// Per-image failures reported by the registry.
    pub failures: Vec<DeleteFailure>,
}

impl DeleteOutcome {
    /// Merges another outcome into this one.
    pub fn merge(&mut self, other: Self) {
        self.deleted += other.deleted;
        self.failures.extend(other.failures);
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Failed to list repositories: {0}")]
    ListRepositories(String),

    #[error("Failed to describe images in '{repository}': {message}")]
    DescribeImages { repository: String, message: String },

    #[error("Failed to delete images from '{repository}': {message}")]
    DeleteImages { repository: String, message: String },
}

pub type RegistryResult<T> = Result<T, RegistryError>;

/// Trait for reading and deleting registry images.
#[async_trait]
pub trait ImageRegistry: Send + Sync {
    /// List the repositories matching the selection.
    async fn list_repositories(
        &self,
        selection: &RepositorySelection,
    ) -> RegistryResult<Vec<Repository>>;

    /// Describe every image stored in a repository.
    async fn describe_images(&self, repository: &str) -> RegistryResult<Vec<RegistryImage>>;

    /// Delete images from a repository in a single request.
    async fn delete_images(
        &self,
        repository: &str,
        ids: &[ImageId],
    ) -> RegistryResult<DeleteOutcome>;
}
