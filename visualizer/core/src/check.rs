use crate::{Ports, ResourceId};
use std::fmt;

/// The outcome of a pairwise reachability query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Check {
    pub allowed: bool,
    pub reason: Reason,

    /// Ingress policies applied to the target.
    pub ingress_policies: Vec<ResourceId>,

    /// Egress policies applied to the source.
    pub egress_policies: Vec<ResourceId>,

    /// Unset when the flow is denied.
    pub ports: Option<Ports>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Reason {
    /// Neither side is governed by any policy.
    NoPolicies,
    Allowed,
    Blocked,
}

/// How one side of a flow (the source's egress or the target's ingress)
/// treats the other workload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Side {
    /// No policy governs this direction.
    Implicit,

    /// The direction is governed and no rule admits the peer.
    Denied,

    /// At least one rule admits the peer, on the union of these ports.
    Allowed(Ports),
}

// === impl Check ===

impl Check {
    /// Combines both sides of a flow. The flow is allowed only when the
    /// source's egress and the target's ingress each permit it.
    pub fn new(
        egress: Side,
        ingress: Side,
        egress_policies: Vec<ResourceId>,
        ingress_policies: Vec<ResourceId>,
    ) -> Self {
        let (allowed, reason, ports) = match (egress, ingress) {
            (Side::Implicit, Side::Implicit) => (true, Reason::NoPolicies, Some(Ports::All)),
            (Side::Denied, _) | (_, Side::Denied) => (false, Reason::Blocked, None),
            (Side::Allowed(ports), Side::Implicit) | (Side::Implicit, Side::Allowed(ports)) => {
                (true, Reason::Allowed, Some(ports))
            }
            (Side::Allowed(eg), Side::Allowed(ing)) => (true, Reason::Allowed, Some(eg.union(ing))),
        };
        Self {
            allowed,
            reason,
            ingress_policies,
            egress_policies,
            ports,
        }
    }
}

// === impl Reason ===

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoPolicies => "No NetworkPolicies applied".fmt(f),
            Self::Allowed => "Communication allowed".fmt(f),
            Self::Blocked => "Communication blocked by network policies".fmt(f),
        }
    }
}

// === impl Side ===

impl Side {
    /// Folds the ports of every grant matching the peer.
    pub fn from_grants<'a>(governed: bool, grants: impl IntoIterator<Item = &'a Ports>) -> Self {
        if !governed {
            return Self::Implicit;
        }
        grants
            .into_iter()
            .cloned()
            .reduce(Ports::union)
            .map_or(Self::Denied, Self::Allowed)
    }
}
