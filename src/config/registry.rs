use serde::{Deserialize, Serialize};

/// Target registry configuration.
///
/// # Example
///
/// ```toml
/// [registry]
/// region = "us-east-1"
/// role_arn = "arn:aws:iam::111111111111:role/ecr-cleaner"
/// repositories = ["app", "worker"]
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistryConfig {
    /// Registry region. Defaults to `aws.region`.
    #[serde(default)]
    pub region: Option<String>,

    /// Role to assume before talking to the registry (cross-account access).
    #[serde(default)]
    pub role_arn: Option<String>,

    /// Repository names to clean up.
    #[serde(default)]
    pub repositories: Vec<String>,

    /// Clean up every repository in the registry, ignoring `repositories`.
    #[serde(default)]
    pub all_repositories: bool,
}

/// Which repositories a run operates on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositorySelection {
    /// Every repository in the registry.
    All,
    /// Only the named repositories.
    Named(Vec<String>),
}

impl RegistryConfig {
    pub(super) fn validate(&self) -> Result<(), String> {
        if !self.all_repositories && self.repositories.is_empty() {
            return Err(
                "at least one `registry.repositories` entry must be specified, \
                 or set `registry.all_repositories = true`"
                    .into(),
            );
        }

        if let Some(name) = self.repositories.iter().find(|r| r.trim().is_empty()) {
            return Err(format!("invalid repository name {name:?} in `registry.repositories`"));
        }

        Ok(())
    }

    /// The repository selection this configuration describes.
    pub fn selection(&self) -> RepositorySelection {
        if self.all_repositories {
            RepositorySelection::All
        } else {
            RepositorySelection::Named(self.repositories.clone())
        }
    }
}
