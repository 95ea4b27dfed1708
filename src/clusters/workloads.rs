//! Pod spec extraction from Kubernetes workload objects.

use std::fmt::Debug;

use k8s_openapi::api::{
    apps::v1::{DaemonSet, Deployment, StatefulSet},
    batch::v1::{CronJob, Job},
    core::v1::{Pod, PodSpec},
};
use kube::{Api, Client, Resource, api::ListParams};
use serde::de::DeserializeOwned;

use crate::config::WorkloadKind;

/// Objects per list request.
const PAGE_SIZE: u32 = 500;

/// A workload object that carries a pod spec, directly or via a template.
pub trait PodTemplate {
    fn into_pod_spec(self) -> Option<PodSpec>;
}

impl PodTemplate for Pod {
    fn into_pod_spec(self) -> Option<PodSpec> {
        self.spec
    }
}

impl PodTemplate for Deployment {
    fn into_pod_spec(self) -> Option<PodSpec> {
        self.spec?.template.spec
    }
}

impl PodTemplate for DaemonSet {
    fn into_pod_spec(self) -> Option<PodSpec> {
        self.spec?.template.spec
    }
}

impl PodTemplate for StatefulSet {
    fn into_pod_spec(self) -> Option<PodSpec> {
        self.spec?.template.spec
    }
}

impl PodTemplate for Job {
    fn into_pod_spec(self) -> Option<PodSpec> {
        self.spec?.template.spec
    }
}

impl PodTemplate for CronJob {
    fn into_pod_spec(self) -> Option<PodSpec> {
        self.spec?.job_template.spec?.template.spec
    }
}

/// Pod specs of every object of one kind, across all namespaces.
pub(super) async fn list_pod_specs(
    client: &Client,
    kind: WorkloadKind,
) -> Result<Vec<PodSpec>, kube::Error> {
    match kind {
        WorkloadKind::Pods => list_all::<Pod>(client).await,
        WorkloadKind::Deployments => list_all::<Deployment>(client).await,
        WorkloadKind::DaemonSets => list_all::<DaemonSet>(client).await,
        WorkloadKind::StatefulSets => list_all::<StatefulSet>(client).await,
        WorkloadKind::Jobs => list_all::<Job>(client).await,
        WorkloadKind::CronJobs => list_all::<CronJob>(client).await,
    }
}

async fn list_all<K>(client: &Client) -> Result<Vec<PodSpec>, kube::Error>
where
    K: Resource + PodTemplate + Clone + DeserializeOwned + Debug,
    K::DynamicType: Default,
{
    let api: Api<K> = Api::all(client.clone());
    let mut params = ListParams::default().limit(PAGE_SIZE);
    let mut specs = Vec::new();

    loop {
        let page = api.list(&params).await?;
        specs.extend(page.items.into_iter().filter_map(PodTemplate::into_pod_spec));

        match page.metadata.continue_ {
            Some(token) if !token.is_empty() => params = params.continue_token(&token),
            _ => break,
        }
    }

    Ok(specs)
}
