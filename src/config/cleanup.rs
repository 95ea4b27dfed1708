use serde::{Deserialize, Serialize};

/// Largest number of image identifiers ECR accepts in one `BatchDeleteImage` call.
pub const MAX_BATCH_SIZE: usize = 100;

/// Cleanup behavior.
///
/// # Example
///
/// ```toml
/// [cleanup]
/// dry_run = true
/// exclude_tags = ["latest", ".+-prd"]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CleanupConfig {
    /// If true, log what would be deleted without actually deleting.
    /// The `--dry-run` flag also enables this.
    /// Default: false
    #[serde(default)]
    pub dry_run: bool,

    /// Regular expressions protecting matching tags from deletion.
    /// Patterns are searched anywhere in the tag (not anchored).
    #[serde(default)]
    pub exclude_tags: Vec<String>,

    /// Image identifiers per delete request.
    /// Default: 100 (the registry maximum)
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// How many clusters / repositories are processed at once.
    /// Default: 1 (sequential)
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            exclude_tags: Vec::new(),
            batch_size: default_batch_size(),
            concurrency: default_concurrency(),
        }
    }
}

fn default_batch_size() -> usize {
    MAX_BATCH_SIZE
}

fn default_concurrency() -> usize {
    1
}

impl CleanupConfig {
    pub(super) fn validate(&self) -> Result<(), String> {
        if self.batch_size == 0 || self.batch_size > MAX_BATCH_SIZE {
            return Err(format!(
                "`cleanup.batch_size` must be between 1 and {MAX_BATCH_SIZE}, got {}",
                self.batch_size
            ));
        }
        if self.concurrency == 0 {
            return Err("`cleanup.concurrency` must be at least 1".into());
        }
        Ok(())
    }
}
