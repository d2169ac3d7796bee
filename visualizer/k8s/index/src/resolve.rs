use crate::catalog::{Catalog, Peer, Policy, Workload};
use netpol_visualizer_core::{IpBlock, PeerId, ResourceId};
use netpol_visualizer_k8s_api::labels::{Labels, Selector};
use std::collections::BTreeSet;

/// The peers matched by a single rule.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Resolved {
    pub workloads: BTreeSet<ResourceId>,

    /// ipBlocks are kept apart so they never take part in workload-to-workload
    /// decisions.
    pub ip_blocks: BTreeSet<IpBlock>,
}

// === impl Resolved ===

impl Resolved {
    /// Iterates over all matched peers, workloads first.
    pub fn peers(&self) -> impl Iterator<Item = PeerId> + '_ {
        self.workloads
            .iter()
            .cloned()
            .map(PeerId::Workload)
            .chain(self.ip_blocks.iter().cloned().map(PeerId::IpBlock))
    }
}

/// Returns the workloads a policy applies to: those in the policy's namespace
/// that match its pod selector.
pub fn selected(policy: &Policy, catalog: &Catalog) -> BTreeSet<ResourceId> {
    matching(catalog.namespace_workloads(policy.namespace()), &policy.pod_selector).collect()
}

/// Resolves the peers of one rule.
///
/// Peers are unioned; the fields of a single peer are intersected. A rule
/// without peers resolves to nothing.
pub fn resolve_peers(peers: &[Peer], policy_namespace: &str, catalog: &Catalog) -> Resolved {
    let mut resolved = Resolved::default();
    for peer in peers {
        match peer {
            Peer::Pods(pods) => {
                let workloads = catalog.namespace_workloads(policy_namespace);
                resolved.workloads.extend(matching(workloads, pods));
            }
            Peer::Namespaces(namespaces) => {
                for ns in matching_namespaces(catalog, namespaces) {
                    let workloads = catalog.namespace_workloads(ns);
                    resolved.workloads.extend(workloads.map(|w| w.id.clone()));
                }
            }
            Peer::NamespacedPods { namespaces, pods } => {
                for ns in matching_namespaces(catalog, namespaces) {
                    let workloads = catalog.namespace_workloads(ns);
                    resolved.workloads.extend(matching(workloads, pods));
                }
            }
            Peer::IpBlock(block) => {
                resolved.ip_blocks.insert(block.clone());
            }
        }
    }
    resolved
}

fn matching<'a>(
    workloads: impl Iterator<Item = &'a Workload> + 'a,
    selector: &'a Selector,
) -> impl Iterator<Item = ResourceId> + 'a {
    workloads
        .filter(move |w| selector.matches(&w.labels))
        .map(|w| w.id.clone())
}

fn matching_namespaces<'a>(
    catalog: &'a Catalog,
    selector: &'a Selector,
) -> impl Iterator<Item = &'a str> + 'a {
    catalog
        .namespaces()
        .filter(move |ns| selector.matches(&Labels::namespace(ns)))
}
