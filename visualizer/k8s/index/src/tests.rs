mod catalog;

use crate::{catalog::Policy, Catalog, CommunicationIndex};
use netpol_visualizer_core::{ResourceId, WorkloadKind};
use netpol_visualizer_k8s_api::{self as k8s, NetworkPolicy};
use serde_json::json;

/// Accumulates documents for a single snapshot.
struct TestConfig {
    kind: WorkloadKind,
    workloads: Vec<k8s::Workload>,
    policies: Vec<NetworkPolicy>,
    _tracing: tracing::subscriber::DefaultGuard,
}

fn mk_workload(
    ns: impl ToString,
    name: impl ToString,
    labels: impl IntoIterator<Item = (&'static str, &'static str)>,
) -> k8s::Workload {
    k8s::Workload {
        metadata: k8s::ObjectMeta {
            namespace: Some(ns.to_string()),
            name: Some(name.to_string()),
            labels: Some(
                labels
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            ),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Builds a policy from a JSON `spec`, as it would appear in `kubectl` output.
fn mk_policy(ns: &str, name: &str, spec: serde_json::Value) -> NetworkPolicy {
    serde_json::from_value(json!({
        "apiVersion": "networking.k8s.io/v1",
        "kind": "NetworkPolicy",
        "metadata": { "namespace": ns, "name": name },
        "spec": spec,
    }))
    .expect("policy must deserialize")
}

fn id(s: &str) -> ResourceId {
    s.parse().expect("id must be namespace/name")
}

fn policy<'c>(catalog: &'c Catalog, s: &str) -> &'c Policy {
    let id = id(s);
    catalog
        .policies()
        .find(|p| p.id == id)
        .unwrap_or_else(|| panic!("{s} must be cataloged"))
}

// === impl TestConfig ===

impl TestConfig {
    fn pods() -> Self {
        Self::new(WorkloadKind::Pod)
    }

    fn new(kind: WorkloadKind) -> Self {
        Self {
            kind,
            workloads: vec![],
            policies: vec![],
            _tracing: Self::init_tracing(),
        }
    }

    fn workload(
        mut self,
        ns: &str,
        name: &str,
        labels: impl IntoIterator<Item = (&'static str, &'static str)>,
    ) -> Self {
        self.workloads.push(mk_workload(ns, name, labels));
        self
    }

    fn policy(mut self, ns: &str, name: &str, spec: serde_json::Value) -> Self {
        self.policies.push(mk_policy(ns, name, spec));
        self
    }

    fn catalog(&self) -> Catalog {
        Catalog::build(self.kind, self.workloads.clone(), self.policies.clone())
            .expect("catalog must build")
    }

    fn index(&self) -> CommunicationIndex {
        CommunicationIndex::build(&self.catalog())
    }

    fn init_tracing() -> tracing::subscriber::DefaultGuard {
        tracing::subscriber::set_default(
            tracing_subscriber::fmt()
                .with_test_writer()
                .with_max_level(tracing::Level::TRACE)
                .finish(),
        )
    }
}

/// A small multi-namespace snapshot used by several tests:
///
/// - `default/web` accepts ingress from `default/client` on TCP/8080 and from
///   any workload in the `frontend` namespace.
/// - `default/client` may only send egress to `app: web` workloads.
/// - `backend/db` denies all ingress.
fn mixed() -> TestConfig {
    TestConfig::pods()
        .workload("default", "web", [("app", "web")])
        .workload("default", "client", [("app", "client")])
        .workload("default", "batch", [("app", "batch")])
        .workload("frontend", "ui", [("app", "ui")])
        .workload("backend", "db", [("app", "db")])
        .policy(
            "default",
            "web-ingress",
            json!({
                "podSelector": { "matchLabels": { "app": "web" } },
                "ingress": [
                    {
                        "from": [{ "podSelector": { "matchLabels": { "app": "client" } } }],
                        "ports": [{ "port": 8080, "protocol": "TCP" }],
                    },
                    {
                        "from": [{ "namespaceSelector": { "matchLabels": { "name": "frontend" } } }],
                    },
                ],
            }),
        )
        .policy(
            "default",
            "client-egress",
            json!({
                "podSelector": { "matchLabels": { "app": "client" } },
                "egress": [{ "to": [{ "podSelector": { "matchLabels": { "app": "web" } } }] }],
                "policyTypes": ["Egress"],
            }),
        )
        .policy(
            "backend",
            "deny-all",
            json!({ "podSelector": {}, "ingress": [] }),
        )
}
