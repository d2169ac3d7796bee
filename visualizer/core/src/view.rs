//! Serializable, human-facing renderings of analysis results.
//!
//! Analysis produces structured values (`PeerId`, `Ports`, ...); this module
//! is the only place that turns them into display strings.

use crate::{
    check::{Check, Reason},
    graph::{Edge, Graph, Node},
    reachability::{Grant, ReachabilityRecord},
    PeerId, PortRef, Ports, ResourceId,
};
use serde::Serialize;
use std::fmt;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct GraphView {
    pub nodes: Vec<Node>,
    pub edges: Vec<EdgeView>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EdgeView {
    pub source: PeerId,
    pub target: PeerId,
    #[serde(rename = "type")]
    pub kind: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ports: Option<Vec<String>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CheckResponse {
    pub allowed: bool,
    pub reason: String,
    pub ingress_policies: Vec<ResourceId>,
    pub egress_policies: Vec<ResourceId>,
    pub ports: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RecordView {
    pub allowed_ingress: Vec<GrantView>,
    pub allowed_egress: Vec<GrantView>,
    pub blocked_ingress: Vec<ResourceId>,
    pub blocked_egress: Vec<ResourceId>,
    pub policies: PoliciesView,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GrantView {
    pub peer: PeerId,
    pub ports: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PoliciesView {
    pub ingress: Vec<ResourceId>,
    pub egress: Vec<ResourceId>,
}

// === impl GraphView ===

impl From<&Graph> for GraphView {
    fn from(graph: &Graph) -> Self {
        Self {
            nodes: graph.nodes.clone(),
            edges: graph.edges.iter().map(EdgeView::from).collect(),
        }
    }
}

// === impl EdgeView ===

impl From<&Edge> for EdgeView {
    fn from(edge: &Edge) -> Self {
        let ports = match &edge.ports {
            Ports::All => None,
            ports @ Ports::Specific(_) => Some(ports.entries()),
        };
        Self {
            source: edge.source.clone(),
            target: edge.target.clone(),
            kind: edge.direction.to_string(),
            label: format!("{} ({})", edge.direction.title(), edge_ports(&edge.ports)),
            ports,
        }
    }
}

/// Edge labels use `TCP/8080` entries and `All Ports`.
fn edge_ports(ports: &Ports) -> String {
    match ports {
        Ports::All => "All Ports".to_string(),
        Ports::Specific(refs) => refs
            .iter()
            .map(|r| EdgePort(r).to_string())
            .collect::<Vec<_>>()
            .join(", "),
    }
}

/// Renders a port entry as `protocol/port`, with `N/A` for a protocol-only
/// entry.
struct EdgePort<'a>(&'a PortRef);

impl fmt::Display for EdgePort<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let PortRef {
            protocol,
            port,
            end_port,
        } = self.0;
        write!(f, "{protocol}/")?;
        match port {
            Some(port) => port.fmt(f)?,
            None => "N/A".fmt(f)?,
        }
        if let Some(end) = end_port {
            write!(f, "-{end}")?;
        }
        Ok(())
    }
}

// === impl CheckResponse ===

impl CheckResponse {
    pub const NOT_FOUND: &'static str = "source or target not found";

    /// The response for a query naming a workload the index does not hold.
    pub fn not_found() -> Self {
        Self {
            allowed: false,
            reason: Self::NOT_FOUND.to_string(),
            ingress_policies: vec![],
            egress_policies: vec![],
            ports: vec![],
        }
    }
}

impl From<&Check> for CheckResponse {
    fn from(check: &Check) -> Self {
        let ports = match (check.reason, &check.ports) {
            (Reason::NoPolicies, _) => vec!["all".to_string()],
            (_, Some(ports)) => ports.entries(),
            (_, None) => vec![],
        };
        Self {
            allowed: check.allowed,
            reason: check.reason.to_string(),
            ingress_policies: check.ingress_policies.clone(),
            egress_policies: check.egress_policies.clone(),
            ports,
        }
    }
}

// === impl RecordView ===

impl From<&ReachabilityRecord> for RecordView {
    fn from(rec: &ReachabilityRecord) -> Self {
        let grants = |grants: &std::collections::BTreeSet<Grant>| {
            grants
                .iter()
                .map(|Grant { peer, ports }| GrantView {
                    peer: peer.clone(),
                    ports: ports.to_string(),
                })
                .collect()
        };
        Self {
            allowed_ingress: grants(&rec.allowed_ingress),
            allowed_egress: grants(&rec.allowed_egress),
            blocked_ingress: rec.blocked_ingress.iter().cloned().collect(),
            blocked_egress: rec.blocked_egress.iter().cloned().collect(),
            policies: PoliciesView {
                ingress: rec.ingress_policies.clone(),
                egress: rec.egress_policies.clone(),
            },
        }
    }
}
