use super::*;
use crate::{
    catalog::{Peer, Rule},
    Error,
};
use netpol_visualizer_core::{Direction, IpBlock, PortRef, PortValue, Ports};
use netpol_visualizer_k8s_api::{Labels, Selector};
use pretty_assertions::assert_eq;

#[test]
fn workloads_require_namespace_and_name() {
    let test = TestConfig::pods();

    let mut unnamed = mk_workload("default", "web", None);
    unnamed.metadata.name = None;
    let error = Catalog::build(test.kind, vec![unnamed], vec![]).expect_err("must fail");
    assert!(
        matches!(error, Error::MalformedInput { kind: "workload", .. }),
        "{error}"
    );

    let mut unscoped = mk_workload("default", "web", None);
    unscoped.metadata.namespace = None;
    let error = Catalog::build(test.kind, vec![unscoped], vec![]).expect_err("must fail");
    assert!(
        matches!(error, Error::MalformedInput { kind: "workload", ref reason } if reason.contains("web")),
        "{error}"
    );
}

#[test]
fn policies_require_namespace_and_name() {
    let test = TestConfig::pods();
    let mut policy = mk_policy("default", "deny", json!({}));
    policy.metadata.namespace = None;
    let error = Catalog::build(test.kind, vec![], vec![policy]).expect_err("must fail");
    assert!(
        matches!(error, Error::MalformedInput { kind: "NetworkPolicy", .. }),
        "{error}"
    );
}

#[test]
fn labels_and_status_default() {
    let mut pod = mk_workload("default", "web-0", None);
    pod.metadata.labels = None;
    pod.status.phase = Some("Running".to_string());
    let catalog = Catalog::build(WorkloadKind::Pod, vec![pod], vec![]).unwrap();
    let web = catalog.workload(&id("default/web-0")).expect("web-0 must exist");
    assert_eq!(web.labels, Labels::default());
    assert_eq!(web.status, "Running");
    assert_eq!(web.kind, WorkloadKind::Pod);

    let test = TestConfig::new(WorkloadKind::Deployment).workload("default", "web", None);
    let catalog = test.catalog();
    let web = catalog.workload(&id("default/web")).expect("web must exist");
    assert_eq!(web.status, "Unknown");
    assert_eq!(web.kind, WorkloadKind::Deployment);
}

#[test]
fn duplicate_ids_keep_the_last_document() {
    let test = TestConfig::pods()
        .workload("default", "web", [("version", "v1")])
        .workload("default", "web", [("version", "v2")]);
    let catalog = test.catalog();
    assert_eq!(catalog.workloads().count(), 1);
    assert_eq!(
        catalog.workload(&id("default/web")).unwrap().labels,
        Labels::from_iter(Some(("version", "v2")))
    );
    assert_eq!(catalog.namespace_workloads("default").count(), 1);
}

#[test]
fn indexes_workloads_by_namespace() {
    let catalog = mixed().catalog();
    assert_eq!(
        catalog.namespaces().collect::<Vec<_>>(),
        vec!["backend", "default", "frontend"]
    );
    assert_eq!(
        catalog
            .namespace_workloads("default")
            .map(|w| w.id.name.as_str())
            .collect::<Vec<_>>(),
        vec!["batch", "client", "web"]
    );
    assert_eq!(catalog.namespace_workloads("kube-system").count(), 0);
}

#[test]
fn empty_rule_lists_are_kept_for_governed_directions() {
    let catalog = TestConfig::pods()
        .policy("default", "implicit-types", json!({ "ingress": [] }))
        .policy(
            "default",
            "explicit-types",
            json!({ "policyTypes": ["Ingress", "Egress"] }),
        )
        .policy(
            "default",
            "egress-only",
            json!({
                "policyTypes": ["Egress"],
                "ingress": [{ "from": [{ "podSelector": {} }] }],
            }),
        )
        .catalog();

    let implicit = policy(&catalog, "default/implicit-types");
    assert_eq!(implicit.rules(Direction::Ingress), Some(&[][..]));
    assert_eq!(implicit.rules(Direction::Egress), None);

    let explicit = policy(&catalog, "default/explicit-types");
    assert_eq!(explicit.rules(Direction::Ingress), Some(&[][..]));
    assert_eq!(explicit.rules(Direction::Egress), Some(&[][..]));

    let egress_only = policy(&catalog, "default/egress-only");
    assert_eq!(egress_only.rules(Direction::Ingress), None);
    assert_eq!(egress_only.rules(Direction::Egress), Some(&[][..]));
}

#[test]
fn normalizes_peers_and_ports() {
    let catalog = TestConfig::pods()
        .policy(
            "default",
            "web",
            json!({
                "podSelector": { "matchLabels": { "app": "web" } },
                "ingress": [{
                    "from": [
                        { "podSelector": { "matchLabels": { "app": "client" } } },
                        { "namespaceSelector": { "matchLabels": { "name": "frontend" } } },
                        {
                            "namespaceSelector": { "matchLabels": { "name": "ops" } },
                            "podSelector": { "matchLabels": { "role": "monitor" } },
                        },
                        { "ipBlock": { "cidr": "10.0.0.0/8", "except": ["10.1.0.0/16"] } },
                        {},
                    ],
                    "ports": [{ "port": 8080 }, { "protocol": "UDP", "port": "dns" }],
                }],
            }),
        )
        .catalog();

    let web = policy(&catalog, "default/web");
    assert_eq!(
        web.pod_selector,
        Selector::from_iter(Some(("app", "web")))
    );
    assert_eq!(
        web.rules(Direction::Ingress).unwrap(),
        &[Rule {
            peers: vec![
                Peer::Pods(Selector::from_iter(Some(("app", "client")))),
                Peer::Namespaces(Selector::from_iter(Some(("name", "frontend")))),
                Peer::NamespacedPods {
                    namespaces: Selector::from_iter(Some(("name", "ops"))),
                    pods: Selector::from_iter(Some(("role", "monitor"))),
                },
                Peer::IpBlock(IpBlock::new(
                    "10.0.0.0/8".parse().unwrap(),
                    ["10.1.0.0/16".parse().unwrap()],
                )),
            ],
            ports: Ports::Specific(vec![
                PortRef::tcp(8080),
                PortRef {
                    protocol: "UDP".to_string(),
                    port: Some(PortValue::Name("dns".to_string())),
                    end_port: None,
                },
            ]),
        }][..]
    );
}

#[test]
fn invalid_ip_blocks_are_dropped() {
    let test = TestConfig::pods()
        .workload("default", "a", [("app", "a")])
        .workload("default", "b", [("app", "b")])
        .workload("other", "c", [("app", "c")])
        .policy(
            "default",
            "b-ingress",
            json!({
                "podSelector": { "matchLabels": { "app": "b" } },
                "ingress": [{
                    "from": [
                        { "podSelector": { "matchLabels": { "app": "a" } } },
                        { "ipBlock": { "cidr": "10.0.0.0/8", "except": ["nope", "10.1.0.0/16"] } },
                    ],
                }],
            }),
        )
        .policy(
            "other",
            "egress-ext",
            json!({
                "podSelector": {},
                "policyTypes": ["Egress"],
                "egress": [
                    { "to": [{ "ipBlock": { "cidr": "10.0.0.0/40" } }] },
                    { "to": [{ "ipBlock": {} }] },
                ],
            }),
        );
    let catalog = test.catalog();

    let egress = policy(&catalog, "other/egress-ext");
    assert_eq!(
        egress.rules(Direction::Egress).unwrap(),
        &[
            Rule {
                peers: vec![],
                ports: Ports::All,
            },
            Rule {
                peers: vec![],
                ports: Ports::All,
            },
        ][..]
    );

    // Only the invalid except entry is dropped.
    let ingress = policy(&catalog, "default/b-ingress");
    assert_eq!(
        ingress.rules(Direction::Ingress).unwrap()[0].peers[1],
        Peer::IpBlock(IpBlock::new(
            "10.0.0.0/8".parse().unwrap(),
            ["10.1.0.0/16".parse().unwrap()],
        ))
    );

    // Workloads elsewhere are still analyzed.
    let index = test.index();
    assert!(index.check(&id("default/a"), &id("default/b")).unwrap().allowed);
    assert!(index.check(&id("default/b"), &id("default/a")).unwrap().allowed);
    // The egress rules of c's policy match nothing.
    assert!(!index.check(&id("other/c"), &id("default/a")).unwrap().allowed);
}

#[test]
fn deployment_status_reports_available_replicas() {
    let mut web = mk_workload("default", "web", None);
    web.status.available_replicas = Some(2);
    let mut idle = mk_workload("default", "idle", None);
    idle.status.available_replicas = Some(0);
    let catalog = Catalog::build(WorkloadKind::Deployment, vec![web, idle], vec![]).unwrap();
    assert_eq!(catalog.workload(&id("default/web")).unwrap().status, "2 available");
    assert_eq!(catalog.workload(&id("default/idle")).unwrap().status, "0 available");
}

#[test]
fn builds_from_list_documents() {
    let workloads = serde_json::from_value::<k8s::List<k8s::Workload>>(json!({
        "apiVersion": "v1",
        "kind": "List",
        "items": [
            { "metadata": { "namespace": "default", "name": "web", "labels": { "app": "web" } } },
        ],
    }))
    .unwrap();
    let policies = [mk_policy("default", "deny", json!({}))]
        .into_iter()
        .collect::<k8s::List<_>>();

    let catalog = Catalog::from_documents(WorkloadKind::Deployment, workloads, policies).unwrap();
    assert_eq!(catalog.workloads().count(), 1);
    assert_eq!(catalog.policies().count(), 1);
}
