use serde::{Deserialize, Serialize};

/// A cluster whose workloads are scanned for in-use images.
///
/// # Example
///
/// ```toml
/// [[clusters]]
/// name = "prod"
/// region = "us-west-2"
/// role_arn = "arn:aws:iam::222222222222:role/eks-reader"
/// workloads = ["pods", "deployments", "cron_jobs"]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClusterConfig {
    /// EKS cluster name.
    pub name: String,

    /// Cluster region. Defaults to `aws.region`.
    #[serde(default)]
    pub region: Option<String>,

    /// Role to assume for describing the cluster and authenticating to it.
    #[serde(default)]
    pub role_arn: Option<String>,

    /// Workload kinds whose pod templates are scanned.
    /// Default: every supported kind.
    #[serde(default = "default_workloads")]
    pub workloads: Vec<WorkloadKind>,
}

impl ClusterConfig {
    /// Create a cluster entry with default region, role and workload kinds.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            region: None,
            role_arn: None,
            workloads: default_workloads(),
        }
    }

    pub(super) fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("`clusters[].name` must not be empty".into());
        }
        if self.workloads.is_empty() {
            return Err(format!(
                "cluster '{}' has an empty `workloads` list; omit it to scan every kind",
                self.name
            ));
        }
        Ok(())
    }
}

fn default_workloads() -> Vec<WorkloadKind> {
    WorkloadKind::ALL.to_vec()
}

/// Kubernetes workload kinds that carry pod specs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkloadKind {
    Pods,
    Deployments,
    DaemonSets,
    StatefulSets,
    Jobs,
    CronJobs,
}

impl WorkloadKind {
    pub const ALL: [WorkloadKind; 6] = [
        WorkloadKind::Pods,
        WorkloadKind::Deployments,
        WorkloadKind::DaemonSets,
        WorkloadKind::StatefulSets,
        WorkloadKind::Jobs,
        WorkloadKind::CronJobs,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkloadKind::Pods => "pods",
            WorkloadKind::Deployments => "deployments",
            WorkloadKind::DaemonSets => "daemon_sets",
            WorkloadKind::StatefulSets => "stateful_sets",
            WorkloadKind::Jobs => "jobs",
            WorkloadKind::CronJobs => "cron_jobs",
        }
    }
}

impl std::fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
