use serde::{Deserialize, Serialize};

/// Base AWS settings.
///
/// These seed the credential chain every other client starts from. Registry
/// and cluster clients may override the region and assume their own role.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AwsConfig {
    /// Default region for all clients.
    /// If omitted, the region is resolved from the environment / shared config.
    #[serde(default)]
    pub region: Option<String>,

    /// Shared-config profile to load base credentials from.
    /// Takes precedence over `AWS_PROFILE`.
    #[serde(default)]
    pub profile: Option<String>,
}
