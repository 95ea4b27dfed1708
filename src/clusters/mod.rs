//! Cluster workload sources.
//!
//! A [`WorkloadSource`] returns the pod specs of the workloads running in one
//! cluster. Pod templates of controllers (deployments, jobs, ...) are
//! expanded so images that are scaled to zero or not yet scheduled still
//! count as in use.

mod eks;
mod workloads;

use async_trait::async_trait;
pub use eks::EksCluster;
use k8s_openapi::api::core::v1::PodSpec;
use thiserror::Error;
pub use workloads::PodTemplate;

use crate::aws::AwsError;

#[derive(Debug, Error)]
pub enum ClusterError {
    #[error(transparent)]
    Aws(#[from] AwsError),

    #[error("Failed to describe cluster: {0}")]
    Describe(String),

    #[error("Cluster has no API server endpoint")]
    MissingEndpoint,

    #[error("Invalid kubeconfig: {0}")]
    Kubeconfig(String),

    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),
}

/// Trait for reading the workloads of a cluster.
#[async_trait]
pub trait WorkloadSource: Send + Sync {
    /// Cluster name, used in logs.
    fn name(&self) -> &str;

    /// Pod specs of every configured workload kind, across all namespaces.
    async fn pod_specs(&self) -> Result<Vec<PodSpec>, ClusterError>;
}
