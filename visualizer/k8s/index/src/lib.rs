//! NetworkPolicy reachability analysis.
//!
//! The index is rebuilt from a snapshot of cluster documents on every pass:
//!
//! - The [`Catalog`] normalizes workloads (pods or deployments) and
//!   NetworkPolicies, keyed by `namespace/name`.
//! - Each policy selects workloads in its own namespace. Each of its rules
//!   resolves a set of peers: workloads (by pod and/or namespace selector) and
//!   ipBlocks.
//! - [`build_graph`] turns every (peer, selected workload) pair into a
//!   directed edge for display.
//! - The [`CommunicationIndex`] records, per workload, which peers its
//!   policies allow in each direction. Pairwise checks require both the
//!   source's egress and the target's ingress to permit a flow.
//!
//! ```text
//! [ Workload ] <- [ NetworkPolicy ] -> [ Rule ] -> [ Peer ]
//! ```
//!
//! Namespaces are not modeled as resources: a namespace selector is evaluated
//! against the synthetic label set `{name: <namespace>}`.

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod catalog;
mod check;
pub mod communication;
pub mod graph;
pub mod resolve;

#[cfg(test)]
mod tests;

pub use self::{catalog::Catalog, communication::CommunicationIndex, graph::build_graph};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A document lacks a required field or carries an unparseable value.
    #[error("malformed {kind}: {reason}")]
    MalformedInput { kind: &'static str, reason: String },

    /// A pairwise check names a workload absent from the index.
    #[error("source or target not found: {from} -> {to}")]
    UnknownResource { from: String, to: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

// === impl Error ===

impl Error {
    pub(crate) fn malformed(kind: &'static str, reason: impl ToString) -> Self {
        Self::MalformedInput {
            kind,
            reason: reason.to_string(),
        }
    }
}
