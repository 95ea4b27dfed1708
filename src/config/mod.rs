//! Configuration module for the janitor.
//!
//! The janitor is configured via a TOML file, with support for environment
//! variable interpolation using `${VAR_NAME}` syntax.
//!
//! # Example
//!
//! ```toml
//! [aws]
//! region = "ap-northeast-1"
//!
//! [registry]
//! repositories = ["app"]
//!
//! [[clusters]]
//! name = "prod"
//! role_arn = "arn:aws:iam::123456789012:role/${EKS_READER_ROLE}"
//!
//! [lifecycle]
//! type = "sinceImagePushed"
//! number = 30
//! ```

mod aws;
mod cleanup;
mod clusters;
mod observability;
mod registry;
mod retention;

use std::path::Path;

pub use aws::*;
pub use cleanup::*;
pub use clusters::*;
pub use observability::*;
pub use registry::*;
pub use retention::*;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

/// Root configuration for the janitor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JanitorConfig {
    /// Base AWS settings shared by every client.
    #[serde(default)]
    pub aws: AwsConfig,

    /// Target registry and repository selection.
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Clusters whose workloads define the in-use image set.
    #[serde(default)]
    pub clusters: Vec<ClusterConfig>,

    /// Retention policy deciding which images are old enough to delete.
    pub lifecycle: RetentionPolicy,

    /// Cleanup behavior (dry run, exclusions, batching).
    #[serde(default)]
    pub cleanup: CleanupConfig,

    /// Logging configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl JanitorConfig {
    /// Load configuration from a TOML file.
    ///
    /// Environment variables in the format `${VAR_NAME}` are expanded.
    /// Missing required variables will cause an error.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(e, path.as_ref().to_path_buf()))?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(contents: &str) -> Result<Self, ConfigError> {
        let expanded = expand_env_vars(contents)?;

        let config: JanitorConfig = toml::from_str(&expanded).map_err(ConfigError::Parse)?;

        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration for consistency and completeness.
    fn validate(&self) -> Result<(), ConfigError> {
        self.registry.validate().map_err(ConfigError::Validation)?;
        self.cleanup.validate().map_err(ConfigError::Validation)?;

        for cluster in &self.clusters {
            cluster.validate().map_err(ConfigError::Validation)?;
        }

        Ok(())
    }

    /// The configured retention policy.
    pub fn policy(&self) -> RetentionPolicy {
        self.lifecycle
    }

    /// Region used for the registry client.
    pub fn registry_region(&self) -> Option<&str> {
        self.registry
            .region
            .as_deref()
            .or(self.aws.region.as_deref())
    }

    /// Region used for a given cluster.
    pub fn cluster_region<'a>(&'a self, cluster: &'a ClusterConfig) -> Option<&'a str> {
        cluster.region.as_deref().or(self.aws.region.as_deref())
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {1}: {0}")]
    Io(std::io::Error, std::path::PathBuf),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("Configuration validation error: {0}")]
    Validation(String),
}

/// Replace `${VAR_NAME}` with the value of the environment variable.
///
/// Text after a `#` on the same line is a comment and left untouched.
fn expand_env_vars(input: &str) -> Result<String, ConfigError> {
    let pattern = Regex::new(r"\$\{([^}]+)\}")
        .map_err(|e| ConfigError::Validation(e.to_string()))?;
    let mut expanded = String::with_capacity(input.len());

    for line in input.split_inclusive('\n') {
        let (code, comment) = line.split_at(line.find('#').unwrap_or(line.len()));

        let mut missing = None;
        let replaced = pattern.replace_all(code, |caps: &Captures<'_>| {
            std::env::var(&caps[1]).unwrap_or_else(|_| {
                missing.get_or_insert_with(|| caps[1].to_string());
                String::new()
            })
        });
        if let Some(name) = missing {
            return Err(ConfigError::EnvVarNotFound(name));
        }

        expanded.push_str(&replaced);
        expanded.push_str(comment);
    }

    Ok(expanded)
}
