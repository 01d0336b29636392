use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Args};
use meshlens_core::columns::{columns_for, render_cell};
use meshlens_core::{records_of, ListItem, Record, RecordKind};
use meshlens_pipeline::registry::{apps, istio, namespaces, services, workloads};
use meshlens_pipeline::{ActiveFilter, CarriedHealth, FilterAction, FilterInput, ListQuery, Registry};
use serde::Serialize;
use tracing::{info, warn};

/// Run `$body` with `$reg` bound to the registry of `$kind`.
macro_rules! with_registry {
    ($kind:expr, |$reg:ident| $body:expr) => {
        match $kind {
            RecordKind::Service => { let $reg = &services::REGISTRY; $body }
            RecordKind::Workload => { let $reg = &workloads::REGISTRY; $body }
            RecordKind::App => { let $reg = &apps::REGISTRY; $body }
            RecordKind::IstioConfig => { let $reg = &istio::REGISTRY; $body }
            RecordKind::Namespace => { let $reg = &namespaces::REGISTRY; $body }
        }
    };
}

#[derive(Args, Debug, Clone, Default)]
pub struct ViewArgs {
    /// Active filter as ID=VALUE; repeat for more values or categories
    #[arg(long = "filter", value_name = "ID=VALUE")]
    pub filters: Vec<String>,
    /// Sort field, by URL code (e.g. "he") or id (e.g. "health")
    #[arg(long = "sort")]
    pub sort: Option<String>,
    /// Sort descending
    #[arg(long = "desc", action = ArgAction::SetTrue)]
    pub desc: bool,
    /// URL query string to start from, e.g. "istiotype=Gateway&sort=in&direction=desc"
    #[arg(long = "query")]
    pub query: Option<String>,
}

impl ViewArgs {
    /// Selection from `--query`, with explicit flags layered on top.
    pub fn to_query<T: ListItem>(&self, registry: &Registry<T>) -> Result<ListQuery> {
        let mut q = ListQuery::parse(self.query.as_deref().unwrap_or(""), registry);
        for raw in &self.filters {
            let (id, value) = raw
                .split_once('=')
                .with_context(|| format!("filter must be ID=VALUE, got '{}'", raw))?;
            if registry.filter(id).is_none() {
                warn!(filter = %id, kind = %registry.kind, "unknown filter; it will not constrain the view");
            }
            q.filters.push(ActiveFilter::new(id, value));
        }
        if let Some(sort) = &self.sort {
            match registry.sort(sort) {
                Some(field) => q.sort = Some(field.param.to_string()),
                None => bail!("unknown sort '{}' for {}; see `meshctl sorts {}`", sort, registry.kind, registry.kind),
            }
        }
        if self.desc {
            q.ascending = false;
        }
        Ok(q)
    }
}

pub fn load_records(path: &Path) -> Result<Vec<Record>> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let records: Vec<Record> =
        serde_json::from_str(&raw).with_context(|| format!("parsing records from {}", path.display()))?;
    Ok(records)
}

/// Result of one pipeline run over a record file.
pub struct View {
    pub kind: RecordKind,
    /// Selection as it would be mirrored to the URL.
    pub query: String,
    pub total: usize,
    pub rows: Vec<Record>,
}

async fn view_with<T: ListItem>(records: Vec<Record>, registry: &Registry<T>, args: &ViewArgs) -> Result<View> {
    let items: Vec<T> = records_of(records);
    let total = items.len();
    let query = args.to_query(registry)?;
    let out = meshlens_pipeline::run(items, &query, registry, &CarriedHealth)
        .await
        .with_context(|| format!("building {} view", registry.kind))?;
    info!(kind = %registry.kind, total, shown = out.len(), "view built");
    Ok(View {
        kind: registry.kind,
        query: query.to_query_string(registry),
        total,
        rows: out.into_iter().map(ListItem::into_record).collect(),
    })
}

pub async fn build_view(kind: RecordKind, records: Vec<Record>, args: &ViewArgs) -> Result<View> {
    with_registry!(kind, |reg| view_with(records, reg, args).await)
}

pub fn print_human(view: &View) {
    let cols = columns_for(view.kind);
    let header: Vec<String> = cols.iter().map(|c| format!("{:<w$}", c.label.to_uppercase(), w = c.width)).collect();
    println!("{}", header.join(" ").trim_end());
    for rec in &view.rows {
        let line: Vec<String> = cols.iter().map(|c| format!("{:<w$}", render_cell(rec, c.kind), w = c.width)).collect();
        println!("{}", line.join(" ").trim_end());
    }
    eprintln!("# {} of {} {} ({})", view.rows.len(), view.total, view.kind, view.query);
}

#[derive(Debug, Serialize)]
pub struct FilterRow {
    pub id: &'static str,
    pub title: &'static str,
    pub action: FilterAction,
    pub deferred: bool,
    /// Fixed choices; empty for free text and runtime namespace lists.
    pub values: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct SortRow {
    pub id: &'static str,
    pub title: &'static str,
    pub param: &'static str,
    pub needs_health: bool,
    pub default: bool,
}

fn filter_rows<T: 'static>(registry: &Registry<T>) -> Vec<FilterRow> {
    registry
        .filters
        .iter()
        .map(|f| FilterRow {
            id: f.id,
            title: f.title,
            action: f.action,
            deferred: f.is_deferred(),
            values: match f.input {
                FilterInput::Select(values) => values.iter().map(|v| v.id).collect(),
                FilterInput::Text | FilterInput::Namespaces => Vec::new(),
            },
        })
        .collect()
}

fn sort_rows<T: 'static>(registry: &Registry<T>) -> Vec<SortRow> {
    let default = registry.default_sort().id;
    registry
        .sorts
        .iter()
        .map(|s| SortRow { id: s.id, title: s.title, param: s.param, needs_health: s.needs_health, default: s.id == default })
        .collect()
}

pub fn describe_filters(kind: RecordKind) -> Vec<FilterRow> {
    with_registry!(kind, |reg| filter_rows(reg))
}

pub fn describe_sorts(kind: RecordKind) -> Vec<SortRow> {
    with_registry!(kind, |reg| sort_rows(reg))
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshlens_core::{Health, Labels, ServiceItem};

    fn svc(name: &str, ratio: f64) -> Record {
        Record::Service(ServiceItem {
            namespace: "bookinfo".into(),
            name: name.into(),
            istio_sidecar: true,
            labels: Labels::new(),
            health: Some(Health::from_error_ratio(ratio)),
        })
    }

    #[test]
    fn flags_layer_over_query() {
        let args = ViewArgs {
            filters: vec!["servicename=rev".into()],
            sort: Some("health".into()),
            desc: true,
            query: Some("istiosidecar=Present&sort=sn".into()),
        };
        let q = args.to_query(&services::REGISTRY).unwrap();
        assert_eq!(q.filters.len(), 2);
        assert_eq!(q.sort.as_deref(), Some("he"));
        assert!(!q.ascending);
    }

    #[test]
    fn malformed_filter_and_unknown_sort_are_errors() {
        let bad_filter = ViewArgs { filters: vec!["servicename".into()], ..Default::default() };
        assert!(bad_filter.to_query(&services::REGISTRY).is_err());
        let bad_sort = ViewArgs { sort: Some("zz".into()), ..Default::default() };
        assert!(bad_sort.to_query(&services::REGISTRY).is_err());
    }

    #[tokio::test]
    async fn view_keeps_only_records_of_the_kind() {
        let ns = Record::Namespace(meshlens_core::NamespaceInfo {
            name: "bookinfo".into(),
            status: None,
            tls_status: None,
            labels: Default::default(),
        });
        let records = vec![svc("reviews", 0.0), ns, svc("ratings", 0.5)];
        let args = ViewArgs { sort: Some("he".into()), ..Default::default() };
        let view = build_view(RecordKind::Service, records, &args).await.unwrap();
        assert_eq!(view.total, 2);
        let names: Vec<&str> = view.rows.iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["ratings", "reviews"]);
        assert_eq!(view.query, "sort=he&direction=asc");
    }

    #[test]
    fn descriptors_list_default_sort_first() {
        let sorts = describe_sorts(RecordKind::IstioConfig);
        assert_eq!(sorts[0].param, "ns");
        assert!(sorts[0].default);
        let filters = describe_filters(RecordKind::Workload);
        assert!(filters.iter().any(|f| f.id == "health" && f.deferred));
    }
}
