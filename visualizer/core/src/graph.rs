use crate::{Direction, PeerId, Ports, WorkloadKind};

/// A reachability graph: workloads, policies and ipBlocks connected by
/// authorized flows.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct Node {
    pub id: String,
    pub label: String,
    pub group: NodeGroup,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeGroup {
    Pod,
    Deployment,
    Policy,
    IpBlock,
}

/// A directed, authorized flow from `source` to `target`.
///
/// Ingress rules produce peer-to-workload edges; egress rules produce
/// workload-to-peer edges.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Edge {
    pub source: PeerId,
    pub target: PeerId,
    pub direction: Direction,
    pub ports: Ports,
}

// === impl NodeGroup ===

impl From<WorkloadKind> for NodeGroup {
    fn from(kind: WorkloadKind) -> Self {
        match kind {
            WorkloadKind::Pod => Self::Pod,
            WorkloadKind::Deployment => Self::Deployment,
        }
    }
}
