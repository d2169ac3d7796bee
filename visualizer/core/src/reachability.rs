use crate::{Direction, PeerId, Ports, ResourceId};
use std::collections::BTreeSet;

/// Traffic a workload's policies allow, per direction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReachabilityRecord {
    pub allowed_ingress: BTreeSet<Grant>,
    pub allowed_egress: BTreeSet<Grant>,

    /// Policies that govern a direction with an empty rule list, denying all
    /// of its traffic.
    pub blocked_ingress: BTreeSet<ResourceId>,
    pub blocked_egress: BTreeSet<ResourceId>,

    /// Policies that select the workload, in application order.
    pub ingress_policies: Vec<ResourceId>,
    pub egress_policies: Vec<ResourceId>,
}

/// A peer allowed by some rule, with the rule's ports.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Grant {
    pub peer: PeerId,
    pub ports: Ports,
}

// === impl ReachabilityRecord ===

impl ReachabilityRecord {
    pub fn allowed(&self, direction: Direction) -> &BTreeSet<Grant> {
        match direction {
            Direction::Ingress => &self.allowed_ingress,
            Direction::Egress => &self.allowed_egress,
        }
    }

    pub fn blocked(&self, direction: Direction) -> &BTreeSet<ResourceId> {
        match direction {
            Direction::Ingress => &self.blocked_ingress,
            Direction::Egress => &self.blocked_egress,
        }
    }

    pub fn policies(&self, direction: Direction) -> &[ResourceId] {
        match direction {
            Direction::Ingress => &self.ingress_policies,
            Direction::Egress => &self.egress_policies,
        }
    }

    /// A direction is governed when at least one policy selects the workload
    /// for it. Ungoverned directions allow everything.
    pub fn is_governed(&self, direction: Direction) -> bool {
        !self.policies(direction).is_empty()
    }

    /// Records that `policy` selects this workload. Each policy is recorded
    /// at most once per direction.
    pub fn apply_policy(&mut self, direction: Direction, policy: &ResourceId) {
        let policies = match direction {
            Direction::Ingress => &mut self.ingress_policies,
            Direction::Egress => &mut self.egress_policies,
        };
        if !policies.contains(policy) {
            policies.push(policy.clone());
        }
    }

    pub fn grant(&mut self, direction: Direction, grant: Grant) {
        match direction {
            Direction::Ingress => self.allowed_ingress.insert(grant),
            Direction::Egress => self.allowed_egress.insert(grant),
        };
    }

    pub fn block(&mut self, direction: Direction, policy: &ResourceId) {
        match direction {
            Direction::Ingress => self.blocked_ingress.insert(policy.clone()),
            Direction::Egress => self.blocked_egress.insert(policy.clone()),
        };
    }

    /// Iterates over the ports of every grant whose peer is `peer`.
    pub fn grants_to<'a>(
        &'a self,
        direction: Direction,
        peer: &'a ResourceId,
    ) -> impl Iterator<Item = &'a Ports> + 'a {
        self.allowed(direction)
            .iter()
            .filter(move |g| g.peer.workload() == Some(peer))
            .map(|g| &g.ports)
    }
}
