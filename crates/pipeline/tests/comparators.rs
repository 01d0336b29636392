#![forbid(unsafe_code)]

use std::cmp::Ordering;
use std::fmt::Debug;

use meshlens_core::{
    AppItem, CheckSeverity, Health, IstioConfigItem, Labels, ListItem, NamespaceInfo, NamespaceStatus, ServiceItem,
    TlsStatus, Validation, ValidationCheck, WorkloadItem,
};
use meshlens_pipeline::registry::{apps, istio, namespaces, services, workloads};
use meshlens_pipeline::{apply_sort, CarriedHealth, Registry};

// Fixtures share primary keys (namespace, type, sidecar, health, validation,
// mTLS) so every field has to fall through to its tie-breakers. Names are
// distinct and include case-only differences.

fn svc(ns: &str, name: &str, sidecar: bool, ratio: f64) -> ServiceItem {
    ServiceItem {
        namespace: ns.into(),
        name: name.into(),
        istio_sidecar: sidecar,
        labels: Labels::new(),
        health: Some(Health::from_error_ratio(ratio)),
    }
}

fn wl(ns: &str, name: &str, ty: &str, flags: (bool, bool, bool), ratio: f64) -> WorkloadItem {
    WorkloadItem {
        namespace: ns.into(),
        name: name.into(),
        workload_type: ty.into(),
        istio_sidecar: flags.0,
        app_label: flags.1,
        version_label: flags.2,
        labels: Labels::new(),
        health: Some(Health::from_error_ratio(ratio)),
    }
}

fn app(ns: &str, name: &str, sidecar: bool, ratio: f64) -> AppItem {
    AppItem {
        namespace: ns.into(),
        name: name.into(),
        istio_sidecar: sidecar,
        labels: Labels::new(),
        health: Some(Health::from_error_ratio(ratio)),
    }
}

fn validation(valid: bool, checks: usize) -> Option<Validation> {
    let check = ValidationCheck { message: "check".into(), severity: CheckSeverity::Warning, path: None };
    Some(Validation { valid, checks: vec![check; checks] })
}

fn cfg(ns: &str, name: &str, kind: &str, sub_kind: Option<&str>, validation: Option<Validation>) -> IstioConfigItem {
    IstioConfigItem {
        namespace: ns.into(),
        name: name.into(),
        kind: kind.into(),
        sub_kind: sub_kind.map(Into::into),
        validation,
    }
}

fn ns(name: &str, errors: usize, warnings: usize, tls: Option<&str>) -> NamespaceInfo {
    let apps = |n: usize| (0..n).map(|i| format!("app-{}", i)).collect::<Vec<_>>();
    NamespaceInfo {
        name: name.into(),
        status: Some(NamespaceStatus {
            in_error: apps(errors),
            in_warning: apps(warnings),
            in_success: apps(1),
            not_available: Vec::new(),
        }),
        tls_status: tls.map(|s| TlsStatus { status: s.into() }),
        labels: Labels::new(),
    }
}

fn service_fixture() -> Vec<ServiceItem> {
    vec![
        svc("bookinfo", "reviews", true, 0.0),
        svc("bookinfo", "details", true, 0.0),
        svc("bookinfo", "Details", false, 0.0),
        svc("default", "ratings", true, 0.3),
        svc("default", "Reviews", false, 0.3),
        svc("istio-system", "productpage", false, 0.01),
        svc("bookinfo", "mongodb", true, 0.01),
    ]
}

fn workload_fixture() -> Vec<WorkloadItem> {
    vec![
        wl("bookinfo", "reviews-v1", "Deployment", (true, true, true), 0.0),
        wl("bookinfo", "reviews-v2", "Deployment", (true, true, true), 0.0),
        wl("bookinfo", "Reviews-v2", "Deployment", (false, true, false), 0.0),
        wl("default", "cron", "CronJob", (false, false, false), 0.3),
        wl("default", "loader", "Job", (true, false, true), 0.3),
        wl("istio-system", "ingressgateway", "Deployment", (true, true, false), 0.01),
        wl("bookinfo", "details-v1", "StatefulSet", (true, true, true), 0.01),
    ]
}

fn app_fixture() -> Vec<AppItem> {
    vec![
        app("bookinfo", "reviews", true, 0.0),
        app("bookinfo", "Reviews", true, 0.0),
        app("bookinfo", "details", false, 0.0),
        app("default", "ratings", false, 0.3),
        app("default", "loader", true, 0.3),
        app("istio-system", "istio-ingressgateway", true, 0.01),
    ]
}

fn istio_fixture() -> Vec<IstioConfigItem> {
    vec![
        cfg("bookinfo", "reviews", "VirtualService", None, validation(true, 0)),
        cfg("bookinfo", "Reviews", "VirtualService", None, validation(true, 0)),
        cfg("bookinfo", "details", "DestinationRule", None, validation(false, 2)),
        cfg("bookinfo", "ratings", "DestinationRule", None, validation(false, 2)),
        cfg("istio-system", "handler", "Adapter", Some("prometheus"), None),
        cfg("istio-system", "handler-stdio", "Adapter", Some("stdio"), None),
        cfg("istio-system", "metric", "Template", Some("metric"), validation(true, 1)),
        cfg("default", "gateway", "Gateway", None, validation(true, 1)),
    ]
}

fn namespace_fixture() -> Vec<NamespaceInfo> {
    vec![
        ns("bookinfo", 1, 0, Some("MTLS_ENABLED")),
        ns("Bookinfo", 1, 0, Some("MTLS_ENABLED")),
        ns("default", 0, 2, None),
        ns("istio-system", 0, 2, Some("MTLS_PARTIALLY_ENABLED")),
        ns("travel", 0, 0, None),
        ns("payments", 0, 0, Some("MTLS_ENABLED")),
    ]
}

/// Every sort field of `registry`, health-dependent ones included, against
/// the ordering laws the list pages rely on.
async fn check_every_sort<T>(registry: &Registry<T>, items: Vec<T>)
where
    T: ListItem + PartialEq + Debug,
{
    let mut reversed_input = items.clone();
    reversed_input.reverse();

    for field in registry.sorts {
        let ctx = format!("{} sort '{}'", registry.kind, field.id);
        let asc = apply_sort(items.clone(), field, true, &CarriedHealth).await.unwrap();
        let desc = apply_sort(items.clone(), field, false, &CarriedHealth).await.unwrap();
        assert_eq!(asc.len(), items.len(), "{}: sort must keep every record", ctx);

        let mut mirrored = asc.clone();
        mirrored.reverse();
        assert_eq!(desc, mirrored, "{}: descending must mirror ascending", ctx);

        let again = apply_sort(asc.clone(), field, true, &CarriedHealth).await.unwrap();
        assert_eq!(again, asc, "{}: sorting twice must not move anything", ctx);

        let from_reversed = apply_sort(reversed_input.clone(), field, true, &CarriedHealth).await.unwrap();
        assert_eq!(from_reversed, asc, "{}: result must not depend on input order", ctx);

        let cmp = field.compare;
        for a in &asc {
            assert_eq!(cmp(a, a), Ordering::Equal, "{}: {} vs itself", ctx, a.name());
            for b in &asc {
                assert_eq!(cmp(a, b), cmp(b, a).reverse(), "{}: {} vs {} not antisymmetric", ctx, a.name(), b.name());
                for c in &asc {
                    if cmp(a, b) != Ordering::Greater && cmp(b, c) != Ordering::Greater {
                        assert_ne!(
                            cmp(a, c),
                            Ordering::Greater,
                            "{}: {} <= {} <= {} not transitive",
                            ctx,
                            a.name(),
                            b.name(),
                            c.name()
                        );
                    }
                }
            }
        }
        for pair in asc.windows(2) {
            assert_eq!(cmp(&pair[0], &pair[1]), Ordering::Less, "{}: distinct records must not tie", ctx);
        }
    }
}

#[tokio::test]
async fn service_sorts_are_total_orders() {
    check_every_sort(&services::REGISTRY, service_fixture()).await;
}

#[tokio::test]
async fn workload_sorts_are_total_orders() {
    check_every_sort(&workloads::REGISTRY, workload_fixture()).await;
}

#[tokio::test]
async fn app_sorts_are_total_orders() {
    check_every_sort(&apps::REGISTRY, app_fixture()).await;
}

#[tokio::test]
async fn istio_sorts_are_total_orders() {
    check_every_sort(&istio::REGISTRY, istio_fixture()).await;
}

#[tokio::test]
async fn namespace_sorts_are_total_orders() {
    check_every_sort(&namespaces::REGISTRY, namespace_fixture()).await;
}

#[tokio::test]
async fn health_sort_ties_fall_back_to_name() {
    let out = apply_sort(service_fixture(), services::REGISTRY.sort("he").unwrap(), true, &CarriedHealth).await.unwrap();
    let names: Vec<&str> = out.iter().map(|s| s.name.as_str()).collect();
    // 30% errors is Failure, 1% Degraded, 0% Healthy
    assert_eq!(names, vec!["ratings", "Reviews", "mongodb", "productpage", "details", "Details", "reviews"]);
}
