#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod check;
pub mod graph;
mod id;
mod ip_block;
mod ports;
pub mod reachability;
pub mod view;

pub use self::{
    id::{InvalidResourceId, PeerId, ResourceId},
    ip_block::IpBlock,
    ports::{PortRef, PortValue, Ports},
};
pub use ipnet::IpNet;
use std::fmt;

/// The direction of traffic relative to a selected workload.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    Ingress,
    Egress,
}

/// The kind of workload being analyzed.
///
/// A single analysis pass only ever considers one kind of workload.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WorkloadKind {
    Pod,
    #[default]
    Deployment,
}

// === impl Direction ===

impl Direction {
    pub const ALL: [Direction; 2] = [Direction::Ingress, Direction::Egress];

    /// Returns the capitalized name used in edge labels.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Ingress => "Ingress",
            Self::Egress => "Egress",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ingress => "ingress".fmt(f),
            Self::Egress => "egress".fmt(f),
        }
    }
}

// === impl WorkloadKind ===

impl fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pod => "pod".fmt(f),
            Self::Deployment => "deployment".fmt(f),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("invalid resource type: {0}")]
pub struct InvalidWorkloadKind(String);

impl std::str::FromStr for WorkloadKind {
    type Err = InvalidWorkloadKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pod" | "pods" => Ok(Self::Pod),
            "deployment" | "deployments" => Ok(Self::Deployment),
            s => Err(InvalidWorkloadKind(s.to_string())),
        }
    }
}
