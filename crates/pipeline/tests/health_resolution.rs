#![forbid(unsafe_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use meshlens_core::{Health, HealthStatus, Labels, ListItem, ServiceItem};
use meshlens_pipeline::registry::services;
use meshlens_pipeline::{apply_filters, apply_sort, run, run_with, ActiveFilter, HealthSource, ListQuery, PipelineError};

/// Health keyed by service name, each answer delayed; `None` ratio fails the lookup.
struct ScriptedHealth {
    script: HashMap<&'static str, (u64, Option<f64>)>,
    calls: AtomicUsize,
}

impl ScriptedHealth {
    fn new(script: &[(&'static str, u64, Option<f64>)]) -> Self {
        Self {
            script: script.iter().map(|(n, ms, r)| (*n, (*ms, *r))).collect(),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HealthSource<ServiceItem> for ScriptedHealth {
    async fn health(&self, item: &ServiceItem) -> Result<Health, PipelineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let (delay, ratio) = self.script.get(item.name.as_str()).copied().unwrap_or((0, Some(0.0)));
        tokio::time::sleep(Duration::from_millis(delay)).await;
        match ratio {
            Some(r) => Ok(Health::from_error_ratio(r)),
            None => Err(PipelineError::Source(format!("fetch failed for {}", item.name))),
        }
    }
}

fn svc(name: &str) -> ServiceItem {
    ServiceItem { namespace: "bookinfo".into(), name: name.into(), istio_sidecar: true, labels: Labels::new(), health: None }
}

fn names(v: &[ServiceItem]) -> Vec<&str> {
    v.iter().map(|s| s.name.as_str()).collect()
}

#[tokio::test(start_paused = true)]
async fn health_sort_waits_for_every_lookup_and_runs_them_concurrently() {
    let source = ScriptedHealth::new(&[
        ("healthy", 30, Some(0.0)),
        ("failing", 50, Some(0.5)),
        ("degraded", 10, Some(0.05)),
    ]);
    let field = services::REGISTRY.sort("he").unwrap();
    let started = tokio::time::Instant::now();
    let out = apply_sort(vec![svc("healthy"), svc("failing"), svc("degraded")], field, true, &source)
        .await
        .unwrap();
    let elapsed = started.elapsed();

    assert_eq!(names(&out), vec!["failing", "degraded", "healthy"]);
    assert!(out.iter().all(|s| s.health.is_some()));
    assert_eq!(source.calls(), 3);
    // concurrent fan-out: bounded by the slowest lookup, not the sum
    assert!(elapsed < Duration::from_millis(90), "took {:?}", elapsed);
}

#[tokio::test(start_paused = true)]
async fn one_failed_lookup_rejects_the_whole_sort() {
    let source = ScriptedHealth::new(&[("a", 5, Some(0.0)), ("b", 20, None), ("c", 5, Some(0.5))]);
    let field = services::REGISTRY.sort("he").unwrap();
    let err = apply_sort(vec![svc("a"), svc("b"), svc("c")], field, false, &source).await.unwrap_err();
    assert_eq!(err, PipelineError::Source("fetch failed for b".into()));
}

#[tokio::test]
async fn health_filter_keeps_only_requested_buckets() {
    let source = ScriptedHealth::new(&[("ok", 0, Some(0.0)), ("bad", 0, Some(0.3)), ("meh", 0, Some(0.01))]);
    let active = vec![ActiveFilter::new("health", "Failure"), ActiveFilter::new("health", "Degraded")];
    let out = apply_filters(vec![svc("ok"), svc("bad"), svc("meh")], &active, &services::REGISTRY, &source)
        .await
        .unwrap();
    assert_eq!(names(&out), vec!["bad", "meh"]);
    assert_eq!(out[0].health().map(|h| h.global_status()), Some(HealthStatus::Failure));
}

#[tokio::test]
async fn health_is_resolved_only_for_survivors_of_sync_filters() {
    let source = ScriptedHealth::new(&[]);
    let active = vec![ActiveFilter::new("servicename", "rev"), ActiveFilter::new("health", "Healthy")];
    let out = apply_filters(vec![svc("reviews"), svc("ratings"), svc("details")], &active, &services::REGISTRY, &source)
        .await
        .unwrap();
    assert_eq!(names(&out), vec!["reviews"]);
    assert_eq!(source.calls(), 1);
}

#[tokio::test]
async fn no_health_lookups_without_health_criteria() {
    let source = ScriptedHealth::new(&[]);
    let q = ListQuery::parse("servicename=r&sort=sn&direction=desc", &services::REGISTRY);
    let out = run(vec![svc("reviews"), svc("ratings"), svc("details")], &q, &services::REGISTRY, &source)
        .await
        .unwrap();
    assert_eq!(names(&out), vec!["reviews", "ratings"]);
    assert_eq!(source.calls(), 0);
}

#[tokio::test]
async fn already_carried_health_is_not_fetched_again() {
    let source = ScriptedHealth::new(&[("fresh", 0, Some(0.5))]);
    let mut known = svc("known");
    known.health = Some(Health::from_error_ratio(0.0));
    let field = services::REGISTRY.sort("he").unwrap();
    let out = apply_sort(vec![known, svc("fresh")], field, true, &source).await.unwrap();
    assert_eq!(names(&out), vec!["fresh", "known"]);
    assert_eq!(source.calls(), 1);
}

#[tokio::test]
async fn run_fails_when_the_filter_step_fails() {
    let source = ScriptedHealth::new(&[("b", 0, None)]);
    let active = vec![ActiveFilter::new("health", "Healthy")];
    let field = services::REGISTRY.default_sort();
    let res = run_with(vec![svc("a"), svc("b")], &active, field, true, &services::REGISTRY, &source).await;
    assert!(matches!(res, Err(PipelineError::Source(_))));
}

#[tokio::test]
async fn run_filters_then_sorts_by_health() {
    let source = ScriptedHealth::new(&[("r1", 0, Some(0.0)), ("r2", 0, Some(0.4)), ("d", 0, Some(0.4))]);
    let q = ListQuery::parse("?servicename=r&sort=he", &services::REGISTRY);
    let out = run(vec![svc("r1"), svc("d"), svc("r2")], &q, &services::REGISTRY, &source).await.unwrap();
    assert_eq!(names(&out), vec!["r2", "r1"]);
}
