use crate::{core::WorkloadKind, k8s};
use anyhow::{Context, Result};
use k8s_openapi::{api::networking::v1 as networkingv1, NamespaceResourceScope};
use std::{collections::BTreeSet, fmt, path::Path};
use tracing::{debug, instrument};

/// Provides the raw documents an analysis runs over.
#[async_trait::async_trait]
pub trait Source: Send + Sync {
    async fn network_policies(&self) -> Result<k8s::List<k8s::NetworkPolicy>>;

    async fn workloads(&self, kind: WorkloadKind) -> Result<k8s::List<k8s::Workload>>;

    async fn namespaces(&self) -> Result<Vec<String>>;
}

/// Documents held in memory, e.g. read from `kubectl get -o json` output.
///
/// A snapshot holds workloads of a single kind; the requested kind is not
/// checked against the documents.
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    pub policies: k8s::List<k8s::NetworkPolicy>,
    pub workloads: k8s::List<k8s::Workload>,
}

/// Lists documents from the Kubernetes API server.
#[derive(Clone)]
pub struct ClusterSource {
    client: kube::Client,
}

// === impl Snapshot ===

impl Snapshot {
    pub async fn from_files(policies: &Path, workloads: &Path) -> Result<Self> {
        let (policies, workloads) = tokio::try_join!(read_list(policies), read_list(workloads))?;
        Ok(Self {
            policies,
            workloads,
        })
    }
}

#[async_trait::async_trait]
impl Source for Snapshot {
    async fn network_policies(&self) -> Result<k8s::List<k8s::NetworkPolicy>> {
        Ok(self.policies.clone())
    }

    async fn workloads(&self, _: WorkloadKind) -> Result<k8s::List<k8s::Workload>> {
        Ok(self.workloads.clone())
    }

    /// Namespaces are derived from the documents' metadata.
    async fn namespaces(&self) -> Result<Vec<String>> {
        let policies = self.policies.items.iter().map(|p| &p.metadata);
        let workloads = self.workloads.items.iter().map(|w| &w.metadata);
        let namespaces = policies
            .chain(workloads)
            .filter_map(|meta| meta.namespace.clone())
            .collect::<BTreeSet<_>>();
        Ok(namespaces.into_iter().collect())
    }
}

#[instrument]
async fn read_list<T>(path: &Path) -> Result<k8s::List<T>>
where
    T: serde::de::DeserializeOwned,
{
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let list = serde_json::from_slice::<k8s::List<T>>(&bytes)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    debug!(items = list.items.len(), "Read documents");
    Ok(list)
}

// === impl ClusterSource ===

impl ClusterSource {
    pub fn new(client: kube::Client) -> Self {
        Self { client }
    }

    /// Lists a resource across all namespaces and converts each item into the
    /// document model.
    async fn list<K, T>(&self) -> Result<k8s::List<T>>
    where
        K: kube::Resource<Scope = NamespaceResourceScope>,
        K: Clone + fmt::Debug + serde::de::DeserializeOwned + serde::Serialize,
        K::DynamicType: Default,
        T: serde::de::DeserializeOwned,
    {
        let kind = K::kind(&Default::default()).into_owned();
        let list = kube::Api::<K>::all(self.client.clone())
            .list(&Default::default())
            .await
            .with_context(|| format!("failed to list {kind} resources"))?;
        debug!(%kind, items = list.items.len(), "Listed resources");

        list.items
            .into_iter()
            .map(|item| {
                let value = serde_json::to_value(item)?;
                serde_json::from_value(value)
            })
            .collect::<serde_json::Result<_>>()
            .with_context(|| format!("invalid {kind} resource"))
    }
}

#[async_trait::async_trait]
impl Source for ClusterSource {
    async fn network_policies(&self) -> Result<k8s::List<k8s::NetworkPolicy>> {
        self.list::<networkingv1::NetworkPolicy, _>().await
    }

    async fn workloads(&self, kind: WorkloadKind) -> Result<k8s::List<k8s::Workload>> {
        match kind {
            WorkloadKind::Pod => self.list::<k8s::Pod, _>().await,
            WorkloadKind::Deployment => self.list::<k8s::Deployment, _>().await,
        }
    }

    async fn namespaces(&self) -> Result<Vec<String>> {
        let list = kube::Api::<k8s::Namespace>::all(self.client.clone())
            .list(&Default::default())
            .await
            .context("failed to list namespaces")?;
        Ok(list
            .items
            .into_iter()
            .filter_map(|ns| ns.metadata.name)
            .collect())
    }
}

impl fmt::Debug for ClusterSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterSource").finish_non_exhaustive()
    }
}
