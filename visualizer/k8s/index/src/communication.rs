use crate::{resolve, Catalog};
use netpol_visualizer_core::{
    reachability::{Grant, ReachabilityRecord},
    view::RecordView,
    Direction, ResourceId,
};
use std::collections::BTreeMap;
use tracing::{debug, instrument};

/// Per-workload reachability records, built once per snapshot.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommunicationIndex {
    records: BTreeMap<ResourceId, ReachabilityRecord>,
}

// === impl CommunicationIndex ===

impl CommunicationIndex {
    #[instrument(skip_all)]
    pub fn build(catalog: &Catalog) -> Self {
        let mut records = catalog
            .workloads()
            .map(|w| (w.id.clone(), ReachabilityRecord::default()))
            .collect::<BTreeMap<_, _>>();

        for policy in catalog.policies() {
            let selected = resolve::selected(policy, catalog);
            debug!(policy = %policy.id, selected = selected.len(), "Indexing policy");

            for direction in Direction::ALL {
                let Some(rules) = policy.rules(direction) else {
                    continue;
                };
                let resolved = rules
                    .iter()
                    .map(|rule| {
                        let peers = resolve::resolve_peers(&rule.peers, policy.namespace(), catalog);
                        (peers, &rule.ports)
                    })
                    .collect::<Vec<_>>();

                for id in &selected {
                    let Some(rec) = records.get_mut(id) else {
                        continue;
                    };
                    rec.apply_policy(direction, &policy.id);
                    if rules.is_empty() {
                        rec.block(direction, &policy.id);
                    }
                    for (peers, ports) in &resolved {
                        for peer in peers.peers() {
                            let ports = (*ports).clone();
                            rec.grant(direction, Grant { peer, ports });
                        }
                    }
                }
            }
        }

        Self { records }
    }

    pub fn record(&self, id: &ResourceId) -> Option<&ReachabilityRecord> {
        self.records.get(id)
    }

    /// Renders the full communication map, keyed by `namespace/name`.
    pub fn views(&self) -> BTreeMap<String, RecordView> {
        self.records
            .iter()
            .map(|(id, rec)| (id.to_string(), RecordView::from(rec)))
            .collect()
    }
}
