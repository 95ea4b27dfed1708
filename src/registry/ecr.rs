//! Amazon ECR implementation.
//!
//! Uses AWS SDK for Rust. The client is built from an already resolved
//! [`SdkConfig`](aws_config::SdkConfig), which carries the (possibly
//! assumed-role) credentials and the registry region.

use async_trait::async_trait;
use aws_sdk_ecr::{
    Client,
    error::DisplayErrorContext,
    types::{ImageDetail, ImageIdentifier},
};
use chrono::{DateTime, Utc};

use super::{
    DeleteFailure, DeleteOutcome, ImageId, ImageRegistry, RegistryError, RegistryImage,
    RegistryResult, Repository,
};
use crate::config::RepositorySelection;

/// Amazon ECR registry.
pub struct EcrRegistry {
    client: Client,
}

impl EcrRegistry {
    /// Create an ECR client from a loaded SDK config.
    pub fn new(sdk_config: &aws_config::SdkConfig) -> Self {
        Self {
            client: Client::new(sdk_config),
        }
    }
}

#[async_trait]
impl ImageRegistry for EcrRegistry {
    async fn list_repositories(
        &self,
        selection: &RepositorySelection,
    ) -> RegistryResult<Vec<Repository>> {
        let mut request = self.client.describe_repositories();
        if let RepositorySelection::Named(names) = selection {
            request = request.set_repository_names(Some(names.clone()));
        }

        let mut pages = request.into_paginator().send();
        let mut repositories = Vec::new();

        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| {
                RegistryError::ListRepositories(DisplayErrorContext(&e).to_string())
            })?;

            for repo in page.repositories() {
                match (repo.repository_name(), repo.repository_uri()) {
                    (Some(name), Some(uri)) => repositories.push(Repository {
                        name: name.to_string(),
                        uri: uri.to_string(),
                    }),
                    _ => tracing::warn!(
                        repository = ?repo.repository_name(),
                        "Skipping repository without a name or URI"
                    ),
                }
            }
        }

        Ok(repositories)
    }

    async fn describe_images(&self, repository: &str) -> RegistryResult<Vec<RegistryImage>> {
        let mut pages = self
            .client
            .describe_images()
            .repository_name(repository)
            .into_paginator()
            .send();
        let mut images = Vec::new();

        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| RegistryError::DescribeImages {
                repository: repository.to_string(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

            for detail in page.image_details() {
                match registry_image(detail) {
                    Some(image) => images.push(image),
                    None => tracing::warn!(
                        repository = %repository,
                        digest = ?detail.image_digest(),
                        tags = ?detail.image_tags(),
                        "Skipping image without a push timestamp or digest"
                    ),
                }
            }
        }

        Ok(images)
    }

    async fn delete_images(
        &self,
        repository: &str,
        ids: &[ImageId],
    ) -> RegistryResult<DeleteOutcome> {
        let image_ids = ids.iter().map(image_identifier).collect::<Vec<_>>();

        let output = self
            .client
            .batch_delete_image()
            .repository_name(repository)
            .set_image_ids(Some(image_ids))
            .send()
            .await
            .map_err(|e| RegistryError::DeleteImages {
                repository: repository.to_string(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        let failures = output
            .failures()
            .iter()
            .map(|failure| DeleteFailure {
                image: failure
                    .image_id()
                    .map(describe_identifier)
                    .unwrap_or_else(|| "<unknown>".to_string()),
                reason: match (failure.failure_code(), failure.failure_reason()) {
                    (Some(code), Some(reason)) => format!("{}: {}", code.as_str(), reason),
                    (Some(code), None) => code.as_str().to_string(),
                    (None, Some(reason)) => reason.to_string(),
                    (None, None) => "unknown failure".to_string(),
                },
            })
            .collect();

        Ok(DeleteOutcome {
            deleted: output.image_ids().len(),
            failures,
        })
    }
}

/// Convert an ECR image detail, dropping records that cannot be evaluated.
fn registry_image(detail: &ImageDetail) -> Option<RegistryImage> {
    let pushed_at = detail.image_pushed_at().and_then(to_chrono)?;
    let digest = detail.image_digest()?;

    Some(RegistryImage {
        pushed_at,
        tags: detail.image_tags().to_vec(),
        digest: digest.to_string(),
    })
}

fn to_chrono(timestamp: &aws_smithy_types::DateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(timestamp.secs(), timestamp.subsec_nanos())
}

fn image_identifier(id: &ImageId) -> ImageIdentifier {
    match id {
        ImageId::Tag(tag) => ImageIdentifier::builder().image_tag(tag).build(),
        ImageId::Digest(digest) => ImageIdentifier::builder().image_digest(digest).build(),
    }
}

fn describe_identifier(id: &ImageIdentifier) -> String {
    match (id.image_tag(), id.image_digest()) {
        (Some(tag), _) => format!("tag:{tag}"),
        (None, Some(digest)) => digest.to_string(),
        (None, None) => "<unknown>".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detail(secs: Option<i64>, tags: &[&str], digest: Option<&str>) -> ImageDetail {
        ImageDetail::builder()
            .set_image_pushed_at(secs.map(aws_smithy_types::DateTime::from_secs))
            .set_image_tags(Some(tags.iter().map(|t| t.to_string()).collect()))
            .set_image_digest(digest.map(str::to_string))
            .build()
    }

    #[test]
    fn test_registry_image_conversion() {
        let image = registry_image(&detail(
            Some(1_700_000_000),
            &["v1", "stable"],
            Some("sha256:abc"),
        ))
        .unwrap();

        assert_eq!(image.pushed_at.timestamp(), 1_700_000_000);
        assert_eq!(image.tags, vec!["v1".to_string(), "stable".to_string()]);
        assert_eq!(image.digest, "sha256:abc");
    }

    #[test]
    fn test_untagged_image_conversion() {
        let image = registry_image(&detail(Some(1_700_000_000), &[], Some("sha256:abc"))).unwrap();
        assert!(image.tags.is_empty());
    }

    #[test]
    fn test_image_without_timestamp_or_digest_is_dropped() {
        assert!(registry_image(&detail(None, &["v1"], Some("sha256:abc"))).is_none());
        assert!(registry_image(&detail(Some(1_700_000_000), &["v1"], None)).is_none());
    }

    #[test]
    fn test_subsecond_precision_is_kept() {
        let timestamp = aws_smithy_types::DateTime::from_secs_and_nanos(1_700_000_000, 500);
        let converted = to_chrono(&timestamp).unwrap();
        assert_eq!(converted.timestamp_subsec_nanos(), 500);
    }

    #[test]
    fn test_image_identifier() {
        let tag = image_identifier(&ImageId::Tag("v1".into()));
        assert_eq!(tag.image_tag(), Some("v1"));
        assert_eq!(tag.image_digest(), None);
        assert_eq!(describe_identifier(&tag), "tag:v1");

        let digest = image_identifier(&ImageId::Digest("sha256:abc".into()));
        assert_eq!(digest.image_tag(), None);
        assert_eq!(digest.image_digest(), Some("sha256:abc"));
        assert_eq!(describe_identifier(&digest), "sha256:abc");
    }
}
