//! Cleanup orchestration.
//!
//! A run has two phases:
//! 1. [`collect_in_use_images`] gathers the image references used by every
//!    configured cluster
//! 2. [`CleanupRunner::run`] evaluates each repository against the retention
//!    policy, drops in-use and excluded tags, and deletes what is left
//!
//! Failures are isolated: a cluster that cannot be read contributes no
//! images, and a repository that fails is reported and skipped.

use chrono::{DateTime, Utc};
use futures::{StreamExt, stream};
use tracing::Instrument;

use crate::{
    clusters::WorkloadSource,
    config::{CleanupConfig, RetentionPolicy},
    images::{in_use_tags, unique_images, unique_pod_images},
    registry::{DeleteFailure, DeleteOutcome, ImageId, ImageRegistry, RegistryError, Repository},
    retention::{ExclusionRules, reconcile},
};

/// Unique image references used across all clusters, in first-seen order.
///
/// Clusters are read up to `concurrency` at a time. A cluster that fails is
/// logged and contributes nothing.
pub async fn collect_in_use_images(
    sources: &[Box<dyn WorkloadSource>],
    concurrency: usize,
) -> Vec<String> {
    let per_cluster: Vec<Vec<String>> = stream::iter(sources)
        .map(|source| {
            let span = tracing::info_span!("cluster", cluster = %source.name());
            async move {
                match source.pod_specs().await {
                    Ok(specs) => {
                        let images = unique_pod_images(&specs);
                        tracing::info!(
                            pod_specs = specs.len(),
                            images = images.len(),
                            "Collected in-use images"
                        );
                        images
                    }
                    Err(e) => {
                        tracing::error!(
                            error = %e,
                            "Failed to read cluster workloads, its images are not protected"
                        );
                        Vec::new()
                    }
                }
            }
            .instrument(span)
        })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    unique_images(per_cluster.iter().flatten().map(String::as_str))
}

/// What happened to one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryOutcome {
    /// No image survived reconciliation.
    NothingToDelete,
    /// Dry run: these images would have been deleted.
    DryRun { ids: Vec<ImageId> },
    /// Deletion was attempted.
    Deleted {
        deleted: usize,
        failures: Vec<DeleteFailure>,
    },
    /// The repository could not be evaluated.
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryReport {
    pub repository: String,
    pub outcome: RepositoryOutcome,
}

/// Results from a single cleanup run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupSummary {
    /// One report per repository, in input order.
    pub repositories: Vec<RepositoryReport>,
}

impl CleanupSummary {
    /// Number of images the registry reported as deleted.
    pub fn deleted(&self) -> usize {
        self.repositories
            .iter()
            .map(|report| match &report.outcome {
                RepositoryOutcome::Deleted { deleted, .. } => *deleted,
                _ => 0,
            })
            .sum()
    }

    /// Number of images a dry run would have deleted.
    pub fn would_delete(&self) -> usize {
        self.repositories
            .iter()
            .map(|report| match &report.outcome {
                RepositoryOutcome::DryRun { ids } => ids.len(),
                _ => 0,
            })
            .sum()
    }

    /// Number of images the registry refused to delete.
    pub fn delete_failures(&self) -> usize {
        self.repositories
            .iter()
            .map(|report| match &report.outcome {
                RepositoryOutcome::Deleted { failures, .. } => failures.len(),
                _ => 0,
            })
            .sum()
    }

    /// Number of repositories that could not be evaluated.
    pub fn failed_repositories(&self) -> usize {
        self.repositories
            .iter()
            .filter(|report| matches!(report.outcome, RepositoryOutcome::Failed { .. }))
            .count()
    }

    /// Check if any repository or image failed.
    pub fn has_failures(&self) -> bool {
        self.failed_repositories() > 0 || self.delete_failures() > 0
    }
}

/// Applies the retention policy to a set of repositories.
pub struct CleanupRunner<R> {
    registry: R,
    policy: RetentionPolicy,
    exclusions: ExclusionRules,
    dry_run: bool,
    batch_size: usize,
    concurrency: usize,
}

impl<R: ImageRegistry> CleanupRunner<R> {
    pub fn new(registry: R, policy: RetentionPolicy, config: &CleanupConfig) -> Self {
        Self {
            registry,
            policy,
            exclusions: ExclusionRules::compile(&config.exclude_tags),
            dry_run: config.dry_run,
            batch_size: config.batch_size.max(1),
            concurrency: config.concurrency.max(1),
        }
    }

    /// Force a dry run regardless of configuration.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run |= dry_run;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Clean every repository as of now.
    pub async fn run(
        &self,
        repositories: &[Repository],
        in_use_images: &[String],
    ) -> CleanupSummary {
        self.run_at(repositories, in_use_images, Utc::now()).await
    }

    /// Clean every repository, evaluating the policy as of `now`.
    pub async fn run_at(
        &self,
        repositories: &[Repository],
        in_use_images: &[String],
        now: DateTime<Utc>,
    ) -> CleanupSummary {
        for invalid in self.exclusions.invalid() {
            tracing::warn!(
                pattern = %invalid.pattern,
                error = %invalid.error,
                "Ignoring invalid exclude_tags pattern"
            );
        }

        let dry_run_msg = if self.dry_run { " (DRY RUN)" } else { "" };
        tracing::info!(
            repositories = repositories.len(),
            in_use_images = in_use_images.len(),
            policy = %self.policy,
            exclusions = self.exclusions.len(),
            dry_run = self.dry_run,
            "Starting cleanup{}",
            dry_run_msg
        );

        let reports: Vec<RepositoryReport> = stream::iter(repositories)
            .map(|repository| {
                let span = tracing::info_span!("repository", repository = %repository.name);
                async move {
                    let outcome = match self.clean_repository(repository, in_use_images, now).await
                    {
                        Ok(outcome) => outcome,
                        Err(e) => {
                            tracing::error!(error = %e, "Failed to clean repository");
                            RepositoryOutcome::Failed {
                                error: e.to_string(),
                            }
                        }
                    };
                    RepositoryReport {
                        repository: repository.name.clone(),
                        outcome,
                    }
                }
                .instrument(span)
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        CleanupSummary {
            repositories: reports,
        }
    }

    async fn clean_repository(
        &self,
        repository: &Repository,
        in_use_images: &[String],
        now: DateTime<Utc>,
    ) -> Result<RepositoryOutcome, RegistryError> {
        let images = self.registry.describe_images(&repository.name).await?;
        let candidates = self.policy.evaluate(&images, now);

        let in_use = in_use_tags(in_use_images, &repository.uri);
        for reference in &in_use.unparseable {
            tracing::warn!(
                image = %reference,
                "Cannot determine the tag of an in-use image, it is not protected"
            );
        }

        let tags = reconcile(&candidates.tags, &in_use.tags, &self.exclusions);

        tracing::debug!(
            images = images.len(),
            candidate_tags = candidates.tags.len(),
            candidate_digests = candidates.digests.len(),
            in_use_tags = in_use.tags.len(),
            deletable_tags = tags.len(),
            "Evaluated repository"
        );

        let ids: Vec<ImageId> = tags
            .into_iter()
            .map(ImageId::Tag)
            .chain(candidates.digests.into_iter().map(ImageId::Digest))
            .collect();

        if ids.is_empty() {
            tracing::info!("No images to delete");
            return Ok(RepositoryOutcome::NothingToDelete);
        }

        if self.dry_run {
            let listed = ids.iter().map(ToString::to_string).collect::<Vec<_>>();
            tracing::info!(
                count = ids.len(),
                images = ?listed,
                "DRY RUN: Would delete {} images",
                ids.len()
            );
            return Ok(RepositoryOutcome::DryRun { ids });
        }

        let outcome = self.delete_in_batches(&repository.name, &ids).await;

        for failure in &outcome.failures {
            tracing::warn!(
                image = %failure.image,
                reason = %failure.reason,
                "Failed to delete image"
            );
        }
        tracing::info!(
            deleted = outcome.deleted,
            failed = outcome.failures.len(),
            "Deleted images"
        );

        Ok(RepositoryOutcome::Deleted {
            deleted: outcome.deleted,
            failures: outcome.failures,
        })
    }

    /// Delete `ids` in requests of at most `batch_size` images.
    ///
    /// A batch whose request fails outright marks each of its images as
    /// failed; later batches are still attempted.
    async fn delete_in_batches(&self, repository: &str, ids: &[ImageId]) -> DeleteOutcome {
        let mut outcome = DeleteOutcome::default();

        for batch in ids.chunks(self.batch_size) {
            match self.registry.delete_images(repository, batch).await {
                Ok(batch_outcome) => outcome.merge(batch_outcome),
                Err(e) => {
                    tracing::error!(error = %e, batch = batch.len(), "Delete request failed");
                    let reason = e.to_string();
                    outcome.failures.extend(batch.iter().map(|id| DeleteFailure {
                        image: id.to_string(),
                        reason: reason.clone(),
                    }));
                }
            }
        }

        outcome
    }
}
