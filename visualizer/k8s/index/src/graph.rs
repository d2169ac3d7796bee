use crate::{resolve, Catalog};
use netpol_visualizer_core::{
    graph::{Edge, Graph, Node, NodeGroup},
    Direction, PeerId,
};
use std::collections::BTreeSet;
use tracing::{debug, instrument};

/// Builds the reachability graph for a catalog.
///
/// Every workload and policy becomes a node, as does each distinct ipBlock.
/// Ingress rules produce an edge from each peer to each selected workload;
/// egress rules produce an edge from each selected workload to each peer.
/// Duplicate edges are kept.
#[instrument(skip_all)]
pub fn build_graph(catalog: &Catalog) -> Graph {
    let mut nodes = catalog
        .workloads()
        .map(|w| Node {
            id: w.id.to_string(),
            label: w.id.name.clone(),
            group: w.kind.into(),
        })
        .collect::<Vec<_>>();

    // Policies share the `namespace/name` id format with workloads.
    nodes.extend(catalog.policies().map(|p| {
        let id = if catalog.workload(&p.id).is_some() {
            format!("policy:{}", p.id)
        } else {
            p.id.to_string()
        };
        Node {
            id,
            label: p.id.name.clone(),
            group: NodeGroup::Policy,
        }
    }));

    let mut ip_blocks = BTreeSet::new();
    let mut edges = Vec::new();
    for policy in catalog.policies() {
        let selected = resolve::selected(policy, catalog);
        for direction in Direction::ALL {
            for rule in policy.rules(direction).unwrap_or_default() {
                let peers = resolve::resolve_peers(&rule.peers, policy.namespace(), catalog);
                ip_blocks.extend(peers.ip_blocks.iter().cloned());
                for peer in peers.peers() {
                    for workload in &selected {
                        let workload = PeerId::Workload(workload.clone());
                        let (source, target) = match direction {
                            Direction::Ingress => (peer.clone(), workload),
                            Direction::Egress => (workload, peer.clone()),
                        };
                        edges.push(Edge {
                            source,
                            target,
                            direction,
                            ports: rule.ports.clone(),
                        });
                    }
                }
            }
        }
    }

    nodes.extend(ip_blocks.into_iter().map(|block| Node {
        id: block.to_string(),
        label: block.label(),
        group: NodeGroup::IpBlock,
    }));

    debug!(nodes = nodes.len(), edges = edges.len(), "Built graph");
    Graph { nodes, edges }
}
