use std::cmp::Ordering;

use meshlens_core::{AppItem, RecordKind};

use crate::descriptor::{
    health_filter, istio_sidecar_filter, namespace_filter, CaseMode, FilterAction, FilterDescriptor,
    FilterInput, Matcher, Registry, SortDescriptor,
};
use crate::sort::{by_health, by_name, by_namespace, presence_first};

fn name(a: &AppItem) -> &str {
    &a.name
}

fn sidecar(a: &AppItem) -> bool {
    a.istio_sidecar
}

fn by_sidecar(a: &AppItem, b: &AppItem) -> Ordering {
    presence_first(a, b, sidecar)
}

pub static FILTERS: [FilterDescriptor<AppItem>; 4] = [
    FilterDescriptor {
        id: "appname",
        title: "App Name",
        placeholder: "Filter by App Name",
        input: FilterInput::Text,
        action: FilterAction::Append,
        matcher: Matcher::Text { field: name, case: CaseMode::Sensitive },
    },
    istio_sidecar_filter(sidecar),
    health_filter(),
    namespace_filter(super::in_namespace::<AppItem>),
];

pub static SORTS: [SortDescriptor<AppItem>; 4] = [
    SortDescriptor { id: "namespace", title: "Namespace", param: "ns", is_numeric: false, needs_health: false, compare: by_namespace::<AppItem> },
    SortDescriptor { id: "appname", title: "App Name", param: "an", is_numeric: false, needs_health: false, compare: by_name::<AppItem> },
    SortDescriptor { id: "istiosidecar", title: "Istio Sidecar", param: "is", is_numeric: false, needs_health: false, compare: by_sidecar },
    SortDescriptor { id: "health", title: "Health", param: "he", is_numeric: false, needs_health: true, compare: by_health::<AppItem> },
];

pub static REGISTRY: Registry<AppItem> = Registry { kind: RecordKind::App, filters: &FILTERS, sorts: &SORTS };
