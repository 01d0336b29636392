use std::cmp::Ordering;

use meshlens_core::{RecordKind, ServiceItem};

use crate::descriptor::{
    health_filter, istio_sidecar_filter, namespace_filter, CaseMode, FilterAction, FilterDescriptor,
    FilterInput, Matcher, Registry, SortDescriptor,
};
use crate::sort::{by_health, by_name, by_namespace, presence_first};

fn name(s: &ServiceItem) -> &str {
    &s.name
}

fn sidecar(s: &ServiceItem) -> bool {
    s.istio_sidecar
}

fn by_sidecar(a: &ServiceItem, b: &ServiceItem) -> Ordering {
    presence_first(a, b, sidecar)
}

pub static FILTERS: [FilterDescriptor<ServiceItem>; 4] = [
    FilterDescriptor {
        id: "servicename",
        title: "Service Name",
        placeholder: "Filter by Service Name",
        input: FilterInput::Text,
        action: FilterAction::Append,
        matcher: Matcher::Text { field: name, case: CaseMode::Sensitive },
    },
    istio_sidecar_filter(sidecar),
    health_filter(),
    namespace_filter(super::in_namespace::<ServiceItem>),
];

pub static SORTS: [SortDescriptor<ServiceItem>; 4] = [
    SortDescriptor { id: "namespace", title: "Namespace", param: "ns", is_numeric: false, needs_health: false, compare: by_namespace::<ServiceItem> },
    SortDescriptor { id: "servicename", title: "Service Name", param: "sn", is_numeric: false, needs_health: false, compare: by_name::<ServiceItem> },
    SortDescriptor { id: "istiosidecar", title: "Istio Sidecar", param: "is", is_numeric: false, needs_health: false, compare: by_sidecar },
    SortDescriptor { id: "health", title: "Health", param: "he", is_numeric: false, needs_health: true, compare: by_health::<ServiceItem> },
];

pub static REGISTRY: Registry<ServiceItem> = Registry { kind: RecordKind::Service, filters: &FILTERS, sorts: &SORTS };
