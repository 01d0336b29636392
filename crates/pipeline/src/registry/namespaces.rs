use std::cmp::Ordering;

use meshlens_core::{HealthStatus, NamespaceInfo, RecordKind};

use crate::descriptor::{
    CaseMode, FilterAction, FilterDescriptor, FilterInput, FilterValue, Matcher, Registry, SortDescriptor,
    HEALTH_VALUES,
};
use crate::sort::{by_name, locale_cmp};

const MTLS_VALUES: &[FilterValue] = &[
    FilterValue { id: "MTLS_ENABLED", title: "Enabled" },
    FilterValue { id: "MTLS_PARTIALLY_ENABLED", title: "Partially Enabled" },
    FilterValue { id: "MTLS_NOT_ENABLED", title: "Not Enabled" },
];

fn name(n: &NamespaceInfo) -> &str {
    &n.name
}

/// Worst app status counted in the namespace.
pub fn namespace_status(n: &NamespaceInfo) -> HealthStatus {
    match &n.status {
        Some(st) if !st.in_error.is_empty() => HealthStatus::Failure,
        Some(st) if !st.in_warning.is_empty() => HealthStatus::Degraded,
        Some(st) if !st.in_success.is_empty() => HealthStatus::Healthy,
        _ => HealthStatus::NotAvailable,
    }
}

fn in_status(n: &NamespaceInfo, value: &str) -> bool {
    HealthStatus::from_name(value) == Some(namespace_status(n))
}

fn in_mtls(n: &NamespaceInfo, value: &str) -> bool {
    n.tls_status.as_ref().map(|t| t.status == value).unwrap_or(false)
}

/// `key` matches label presence, `key=value` an exact label.
fn has_label(n: &NamespaceInfo, value: &str) -> bool {
    match value.split_once('=') {
        Some((k, v)) => n.labels.iter().any(|(lk, lv)| lk == k.trim() && lv == v.trim()),
        None => n.labels.iter().any(|(lk, _)| lk == value.trim()),
    }
}

fn by_status(a: &NamespaceInfo, b: &NamespaceInfo) -> Ordering {
    match (&a.status, &b.status) {
        (Some(sa), Some(sb)) => sb
            .in_error
            .len()
            .cmp(&sa.in_error.len())
            .then_with(|| sb.in_warning.len().cmp(&sa.in_warning.len()))
            .then_with(|| by_name(a, b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => by_name(a, b),
    }
}

fn by_mtls(a: &NamespaceInfo, b: &NamespaceInfo) -> Ordering {
    match (&a.tls_status, &b.tls_status) {
        (Some(ta), Some(tb)) => locale_cmp(&ta.status, &tb.status).then_with(|| by_name(a, b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => by_name(a, b),
    }
}

pub static FILTERS: [FilterDescriptor<NamespaceInfo>; 4] = [
    FilterDescriptor {
        id: "namespace",
        title: "Name",
        placeholder: "Filter by Namespace Name",
        input: FilterInput::Text,
        action: FilterAction::Append,
        matcher: Matcher::Text { field: name, case: CaseMode::Insensitive },
    },
    FilterDescriptor {
        id: "health",
        title: "Health",
        placeholder: "Filter by Health",
        input: FilterInput::Select(HEALTH_VALUES),
        action: FilterAction::Append,
        matcher: Matcher::Select(in_status),
    },
    FilterDescriptor {
        id: "mtls",
        title: "mTLS status",
        placeholder: "Filter by mTLS status",
        input: FilterInput::Select(MTLS_VALUES),
        action: FilterAction::Update,
        matcher: Matcher::Select(in_mtls),
    },
    FilterDescriptor {
        id: "label",
        title: "Label",
        placeholder: "Filter by Label (key or key=value)",
        input: FilterInput::Text,
        action: FilterAction::Append,
        matcher: Matcher::Select(has_label),
    },
];

pub static SORTS: [SortDescriptor<NamespaceInfo>; 3] = [
    SortDescriptor { id: "namespace", title: "Name", param: "ns", is_numeric: false, needs_health: false, compare: by_name::<NamespaceInfo> },
    SortDescriptor { id: "health", title: "Status", param: "h", is_numeric: false, needs_health: false, compare: by_status },
    SortDescriptor { id: "mtls", title: "mTLS", param: "m", is_numeric: false, needs_health: false, compare: by_mtls },
];

pub static REGISTRY: Registry<NamespaceInfo> = Registry { kind: RecordKind::Namespace, filters: &FILTERS, sorts: &SORTS };

/// Values for the `namespaces` filter of the other pages.
pub fn namespace_choices(namespaces: &[NamespaceInfo]) -> Vec<String> {
    let mut out: Vec<String> = namespaces.iter().map(|n| n.name.clone()).collect();
    out.sort_by(|a, b| locale_cmp(a, b));
    out.dedup();
    out
}
