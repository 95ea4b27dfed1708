//! Amazon EKS workload source.
//!
//! Authenticates the way `aws eks get-token` does: the cluster is described
//! with (optionally assumed-role) credentials, and the same credentials
//! presign an STS request that the cluster accepts as a bearer token.

use std::time::SystemTime;

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_eks::error::DisplayErrorContext;
use k8s_openapi::api::core::v1::PodSpec;
use kube::config::{KubeConfigOptions, Kubeconfig};
use serde_json::json;

use super::{ClusterError, WorkloadSource, workloads::list_pod_specs};
use crate::{aws, config::WorkloadKind};

/// An EKS cluster reached through the AWS API.
pub struct EksCluster {
    name: String,
    region: Option<String>,
    role_arn: Option<String>,
    workloads: Vec<WorkloadKind>,
    base: SdkConfig,
}

/// API server location of a cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ClusterEndpoint {
    server: String,
    /// Base64-encoded PEM bundle, as returned by `DescribeCluster`.
    certificate_authority: Option<String>,
}

impl EksCluster {
    /// Create a source for `name`.
    ///
    /// `region` and `role_arn` narrow the base config; nothing is resolved
    /// until [`WorkloadSource::pod_specs`] is called.
    pub fn new(
        name: impl Into<String>,
        region: Option<String>,
        role_arn: Option<String>,
        workloads: Vec<WorkloadKind>,
        base: SdkConfig,
    ) -> Self {
        Self {
            name: name.into(),
            region,
            role_arn,
            workloads,
            base,
        }
    }

    async fn endpoint(&self, config: &SdkConfig) -> Result<ClusterEndpoint, ClusterError> {
        let output = aws_sdk_eks::Client::new(config)
            .describe_cluster()
            .name(&self.name)
            .send()
            .await
            .map_err(|e| ClusterError::Describe(DisplayErrorContext(&e).to_string()))?;

        let cluster = output.cluster().ok_or(ClusterError::MissingEndpoint)?;
        let server = cluster
            .endpoint()
            .filter(|endpoint| !endpoint.is_empty())
            .ok_or(ClusterError::MissingEndpoint)?;

        Ok(ClusterEndpoint {
            server: server.to_string(),
            certificate_authority: cluster
                .certificate_authority()
                .and_then(|ca| ca.data())
                .map(str::to_string),
        })
    }

    async fn client(&self) -> Result<kube::Client, ClusterError> {
        let config =
            aws::scoped_sdk_config(&self.base, self.region.as_deref(), self.role_arn.as_deref())
                .await;
        let region = aws::region(&config)?;

        let endpoint = self.endpoint(&config).await?;
        let credentials = aws::credentials(&config).await?;
        let token = aws::eks_token(&credentials, &region, &self.name, SystemTime::now())?;

        if endpoint.certificate_authority.is_none() {
            tracing::warn!(
                cluster = %self.name,
                "Cluster has no certificate authority data, skipping TLS verification"
            );
        }

        let kubeconfig = kubeconfig(&self.name, &endpoint, &token)?;
        let config = kube::Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
            .await
            .map_err(|e| ClusterError::Kubeconfig(e.to_string()))?;

        Ok(kube::Client::try_from(config)?)
    }
}

#[async_trait]
impl WorkloadSource for EksCluster {
    fn name(&self) -> &str {
        &self.name
    }

    async fn pod_specs(&self) -> Result<Vec<PodSpec>, ClusterError> {
        let client = self.client().await?;
        let mut specs = Vec::new();

        for kind in &self.workloads {
            let found = list_pod_specs(&client, *kind).await?;
            tracing::debug!(kind = %kind, count = found.len(), "Listed workloads");
            specs.extend(found);
        }

        Ok(specs)
    }
}

/// Single-context kubeconfig authenticating with a bearer token.
fn kubeconfig(
    name: &str,
    endpoint: &ClusterEndpoint,
    token: &str,
) -> Result<Kubeconfig, ClusterError> {
    let cluster = match &endpoint.certificate_authority {
        Some(ca) => json!({ "server": endpoint.server, "certificate-authority-data": ca }),
        None => json!({ "server": endpoint.server, "insecure-skip-tls-verify": true }),
    };

    let document = json!({
        "apiVersion": "v1",
        "kind": "Config",
        "clusters": [{ "name": name, "cluster": cluster }],
        "users": [{ "name": name, "user": { "token": token } }],
        "contexts": [{ "name": name, "context": { "cluster": name, "user": name } }],
        "current-context": name,
    });

    serde_json::from_value(document).map_err(|e| ClusterError::Kubeconfig(e.to_string()))
}
