use crate::{Error, Result};
use netpol_visualizer_core::{
    Direction, IpBlock, IpNet, PortRef, PortValue, Ports, ResourceId, WorkloadKind,
};
use netpol_visualizer_k8s_api::{
    self as k8s,
    labels::{Labels, Selector},
    policy::{self, Cidr},
    ObjectMeta,
};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, instrument, warn};

/// Normalized workloads and policies from a single snapshot.
///
/// All maps are ordered so that every pass over the catalog is deterministic.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    workloads: BTreeMap<ResourceId, Workload>,

    /// Workload ids by namespace.
    namespaces: BTreeMap<String, BTreeSet<ResourceId>>,

    policies: BTreeMap<ResourceId, Policy>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Workload {
    pub id: ResourceId,
    pub kind: WorkloadKind,
    pub labels: Labels,

    /// Display only.
    pub status: String,
}

/// The important parts of a `NetworkPolicy`.
#[derive(Clone, Debug, PartialEq)]
pub struct Policy {
    pub id: ResourceId,

    /// Selects workloads in the policy's namespace.
    pub pod_selector: Selector,

    /// Unset when the policy does not govern ingress.
    pub ingress: Option<Vec<Rule>>,

    /// Unset when the policy does not govern egress.
    pub egress: Option<Vec<Rule>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Rule {
    /// An empty list matches no peers.
    pub peers: Vec<Peer>,
    pub ports: Ports,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Peer {
    /// Workloads in the policy's namespace.
    Pods(Selector),

    /// All workloads in the selected namespaces.
    Namespaces(Selector),

    /// Workloads in the selected namespaces that also match the pod selector.
    NamespacedPods { namespaces: Selector, pods: Selector },

    IpBlock(IpBlock),
}

// === impl Catalog ===

impl Catalog {
    /// Builds a catalog from workloads of a single kind and a set of policies.
    ///
    /// Documents that repeat an id replace earlier ones.
    #[instrument(skip(workloads, policies))]
    pub fn build(
        kind: WorkloadKind,
        workloads: impl IntoIterator<Item = k8s::Workload>,
        policies: impl IntoIterator<Item = k8s::NetworkPolicy>,
    ) -> Result<Self> {
        let mut catalog = Self::default();
        for workload in workloads {
            catalog.apply_workload(kind, workload)?;
        }
        for policy in policies {
            catalog.apply_policy(policy)?;
        }
        debug!(
            workloads = catalog.workloads.len(),
            policies = catalog.policies.len(),
            "Built catalog"
        );
        Ok(catalog)
    }

    pub fn from_documents(
        kind: WorkloadKind,
        workloads: k8s::List<k8s::Workload>,
        policies: k8s::List<k8s::NetworkPolicy>,
    ) -> Result<Self> {
        Self::build(kind, workloads.items, policies.items)
    }

    pub fn workloads(&self) -> impl Iterator<Item = &Workload> {
        self.workloads.values()
    }

    pub fn workload(&self, id: &ResourceId) -> Option<&Workload> {
        self.workloads.get(id)
    }

    /// Iterates over the workloads in `namespace`.
    pub fn namespace_workloads<'a>(
        &'a self,
        namespace: &str,
    ) -> impl Iterator<Item = &'a Workload> + 'a {
        self.namespaces
            .get(namespace)
            .into_iter()
            .flatten()
            .filter_map(|id| self.workloads.get(id))
    }

    /// Iterates over the namespaces that hold at least one workload.
    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.namespaces.keys().map(String::as_str)
    }

    pub fn policies(&self) -> impl Iterator<Item = &Policy> {
        self.policies.values()
    }

    fn apply_workload(&mut self, kind: WorkloadKind, workload: k8s::Workload) -> Result<()> {
        let id = resource_id("workload", &workload.metadata)?;
        let status = match kind {
            WorkloadKind::Pod => workload.status.phase,
            WorkloadKind::Deployment => workload
                .status
                .available_replicas
                .map(|n| format!("{n} available")),
        }
        .unwrap_or_else(|| "Unknown".to_string());

        self.namespaces
            .entry(id.namespace.clone())
            .or_default()
            .insert(id.clone());
        self.workloads.insert(
            id.clone(),
            Workload {
                id,
                kind,
                labels: workload.metadata.labels.into(),
                status,
            },
        );
        Ok(())
    }

    fn apply_policy(&mut self, policy: k8s::NetworkPolicy) -> Result<()> {
        let id = resource_id("NetworkPolicy", &policy.metadata)?;
        let policy = Policy::from_spec(id, policy.spec);
        self.policies.insert(policy.id.clone(), policy);
        Ok(())
    }
}

fn resource_id(kind: &'static str, meta: &ObjectMeta) -> Result<ResourceId> {
    let name = meta
        .name
        .as_deref()
        .filter(|n| !n.is_empty())
        .ok_or_else(|| Error::malformed(kind, "missing metadata.name"))?;
    let namespace = meta
        .namespace
        .as_deref()
        .filter(|ns| !ns.is_empty())
        .ok_or_else(|| Error::malformed(kind, format!("{name} is missing metadata.namespace")))?;
    Ok(ResourceId::new(namespace, name))
}

// === impl Policy ===

impl Policy {
    fn from_spec(id: ResourceId, spec: policy::NetworkPolicySpec) -> Self {
        warn_expressions(&id, &spec.pod_selector);

        let governs_ingress = spec.governs_ingress();
        let governs_egress = spec.governs_egress();

        let ingress = if governs_ingress {
            let rules = spec
                .ingress
                .unwrap_or_default()
                .into_iter()
                .map(|r| Rule::new(&id, r.from, r.ports))
                .collect::<Vec<_>>();
            Some(rules)
        } else {
            if spec.ingress.is_some() {
                debug!(policy = %id, "Ignoring ingress rules not listed in policyTypes");
            }
            None
        };

        let egress = if governs_egress {
            let rules = spec
                .egress
                .unwrap_or_default()
                .into_iter()
                .map(|r| Rule::new(&id, r.to, r.ports))
                .collect::<Vec<_>>();
            Some(rules)
        } else {
            if spec.egress.is_some() {
                debug!(policy = %id, "Ignoring egress rules not listed in policyTypes");
            }
            None
        };

        Self {
            id,
            pod_selector: spec.pod_selector,
            ingress,
            egress,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.id.namespace
    }

    /// Returns the policy's rules for a direction, or `None` if the policy
    /// does not govern it.
    pub fn rules(&self, direction: Direction) -> Option<&[Rule]> {
        match direction {
            Direction::Ingress => self.ingress.as_deref(),
            Direction::Egress => self.egress.as_deref(),
        }
    }
}

// === impl Rule ===

impl Rule {
    fn new(
        policy: &ResourceId,
        peers: Option<Vec<policy::Peer>>,
        ports: Option<Vec<policy::Port>>,
    ) -> Self {
        let peers = peers
            .unwrap_or_default()
            .into_iter()
            .filter_map(|p| Peer::from_spec(policy, p))
            .collect();
        let ports = Ports::from_refs(ports.unwrap_or_default().into_iter().map(port_ref));
        Self { peers, ports }
    }
}

fn port_ref(port: policy::Port) -> PortRef {
    PortRef {
        protocol: port
            .protocol
            .unwrap_or_else(|| PortRef::DEFAULT_PROTOCOL.to_string()),
        port: port.port.map(|p| match p {
            policy::PortRef::Number(n) => PortValue::Number(n),
            policy::PortRef::Name(n) => PortValue::Name(n),
        }),
        end_port: port.end_port,
    }
}

// === impl Peer ===

impl Peer {
    /// Returns `None` for a peer that matches nothing: one that sets no
    /// selector and no ipBlock, or whose ipBlock CIDR is invalid.
    fn from_spec(policy: &ResourceId, peer: policy::Peer) -> Option<Self> {
        let policy::Peer {
            pod_selector,
            namespace_selector,
            ip_block,
        } = peer;

        if let Some(block) = ip_block {
            if pod_selector.is_some() || namespace_selector.is_some() {
                warn!(%policy, "ipBlock peers must not set selectors; ignoring selectors");
            }
            return ip_block_from_spec(policy, block).map(Self::IpBlock);
        }

        for selector in pod_selector.iter().chain(&namespace_selector) {
            warn_expressions(policy, selector);
        }

        match (namespace_selector, pod_selector) {
            (Some(namespaces), Some(pods)) => Some(Self::NamespacedPods { namespaces, pods }),
            (Some(namespaces), None) => Some(Self::Namespaces(namespaces)),
            (None, Some(pods)) => Some(Self::Pods(pods)),
            (None, None) => {
                debug!(%policy, "Peer sets no selector");
                None
            }
        }
    }
}

/// Invalid CIDRs are skipped with a warning: an invalid `cidr` drops the peer
/// and an invalid `except` entry drops only that entry.
fn ip_block_from_spec(policy: &ResourceId, block: policy::IpBlock) -> Option<IpBlock> {
    let parse = |cidr: &str| match cidr.parse::<Cidr>() {
        Ok(cidr) => Some(IpNet::from(cidr)),
        Err(error) => {
            warn!(%policy, %error, "Ignoring invalid ipBlock CIDR");
            None
        }
    };
    let net = parse(&block.cidr)?;
    let except: Vec<IpNet> = block
        .except
        .unwrap_or_default()
        .iter()
        .filter_map(|cidr| parse(cidr))
        .collect();
    Some(IpBlock::new(net, except))
}

fn warn_expressions(policy: &ResourceId, selector: &Selector) {
    if selector.has_expressions() {
        warn!(%policy, "matchExpressions are not supported; only matchLabels are evaluated");
    }
}
