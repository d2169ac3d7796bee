use crate::{
    cache::SnapshotCache,
    core::{
        view::{CheckResponse, GraphView, RecordView},
        ResourceId, WorkloadKind,
    },
    index::{build_graph, Catalog, CommunicationIndex},
    k8s::{
        self,
        policy::{EgressRule, IngressRule},
        Labels,
    },
    source::Source,
};
use anyhow::{anyhow, Result};
use serde::Serialize;
use std::{collections::BTreeMap, sync::Arc};
use tracing::{debug, info, instrument};

/// Runs analyses over the documents of a [`Source`].
///
/// Graphs are cached per workload kind; every other analysis fetches fresh
/// documents.
#[derive(Debug)]
pub struct Analyzer<S> {
    source: S,
    graphs: Arc<SnapshotCache<GraphView>>,
}

/// A policy's rules as written.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PolicyDetails {
    pub name: String,
    pub namespace: String,
    pub ingress: Vec<IngressRule>,
    pub egress: Vec<EgressRule>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResourceDetails {
    pub name: String,
    pub namespace: String,
    pub kind: String,
    pub labels: Labels,
    pub status: String,
}

// === impl Analyzer ===

impl<S: Source> Analyzer<S> {
    pub fn new(source: S) -> Self {
        Self::with_cache(source, Default::default())
    }

    /// Shares a graph cache with other analyzers.
    pub fn with_cache(source: S, graphs: Arc<SnapshotCache<GraphView>>) -> Self {
        Self { source, graphs }
    }

    pub fn graphs(&self) -> &SnapshotCache<GraphView> {
        &self.graphs
    }

    #[instrument(skip(self))]
    pub async fn catalog(&self, kind: WorkloadKind) -> Result<Catalog> {
        let (policies, workloads) = tokio::try_join!(
            self.source.network_policies(),
            self.source.workloads(kind),
        )?;
        let catalog = Catalog::from_documents(kind, workloads, policies)?;
        info!(
            workloads = catalog.workloads().count(),
            policies = catalog.policies().count(),
            "Loaded snapshot"
        );
        Ok(catalog)
    }

    #[instrument(skip(self))]
    pub async fn graph(&self, kind: WorkloadKind) -> Result<Arc<GraphView>> {
        if let Some(graph) = self.graphs.get(kind) {
            debug!("Using cached graph");
            return Ok(graph);
        }
        let catalog = self.catalog(kind).await?;
        Ok(self
            .graphs
            .get_or_insert_with(kind, || GraphView::from(&build_graph(&catalog))))
    }

    /// Builds the reachability record of every workload, keyed by
    /// `namespace/name`.
    pub async fn communication_map(
        &self,
        kind: WorkloadKind,
    ) -> Result<BTreeMap<String, RecordView>> {
        let catalog = self.catalog(kind).await?;
        Ok(CommunicationIndex::build(&catalog).views())
    }

    /// Checks whether `source` may send traffic to `target`. Unknown
    /// workloads produce a denied response.
    #[instrument(skip(self))]
    pub async fn check(
        &self,
        kind: WorkloadKind,
        source: &ResourceId,
        target: &ResourceId,
    ) -> Result<CheckResponse> {
        let catalog = self.catalog(kind).await?;
        let rsp = CommunicationIndex::build(&catalog).check_response(source, target);
        info!(allowed = rsp.allowed, reason = %rsp.reason, "Checked");
        Ok(rsp)
    }

    /// Returns the rules of the first policy named `name`, in any namespace.
    pub async fn policy_details(&self, name: &str) -> Result<PolicyDetails> {
        let policies = self.source.network_policies().await?;
        let k8s::NetworkPolicy { metadata, spec } = policies
            .items
            .into_iter()
            .find(|p| p.metadata.name.as_deref() == Some(name))
            .ok_or_else(|| anyhow!("policy not found: {name}"))?;
        Ok(PolicyDetails {
            name: name.to_string(),
            namespace: metadata.namespace.unwrap_or_default(),
            ingress: spec.ingress.unwrap_or_default(),
            egress: spec.egress.unwrap_or_default(),
        })
    }

    pub async fn resource_details(
        &self,
        kind: WorkloadKind,
        id: &ResourceId,
    ) -> Result<ResourceDetails> {
        let workloads = self.source.workloads(kind).await?;
        let catalog = Catalog::from_documents(kind, workloads, Default::default())?;
        let workload = catalog
            .workload(id)
            .ok_or_else(|| anyhow!("{kind} not found: {id}"))?;
        Ok(ResourceDetails {
            name: id.name.clone(),
            namespace: id.namespace.clone(),
            kind: workload.kind.to_string(),
            labels: workload.labels.clone(),
            status: workload.status.clone(),
        })
    }

    pub async fn namespaces(&self) -> Result<Vec<String>> {
        self.source.namespaces().await
    }
}
