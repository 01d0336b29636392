use std::cmp::Ordering;

use meshlens_core::{RecordKind, WorkloadItem};

use crate::descriptor::{
    health_filter, istio_sidecar_filter, namespace_filter, CaseMode, FilterAction, FilterDescriptor,
    FilterInput, FilterValue, Matcher, Registry, SortDescriptor, PRESENCE_VALUES,
};
use crate::sort::{by_health, by_name, by_namespace, locale_cmp, presence_first};

const WORKLOAD_TYPES: &[FilterValue] = &[
    FilterValue { id: "CronJob", title: "CronJob" },
    FilterValue { id: "DaemonSet", title: "DaemonSet" },
    FilterValue { id: "Deployment", title: "Deployment" },
    FilterValue { id: "DeploymentConfig", title: "DeploymentConfig" },
    FilterValue { id: "Job", title: "Job" },
    FilterValue { id: "Pod", title: "Pod" },
    FilterValue { id: "ReplicaSet", title: "ReplicaSet" },
    FilterValue { id: "ReplicationController", title: "ReplicationController" },
    FilterValue { id: "StatefulSet", title: "StatefulSet" },
];

fn name(w: &WorkloadItem) -> &str {
    &w.name
}

fn sidecar(w: &WorkloadItem) -> bool {
    w.istio_sidecar
}

fn app_label(w: &WorkloadItem) -> bool {
    w.app_label
}

fn version_label(w: &WorkloadItem) -> bool {
    w.version_label
}

fn is_type(w: &WorkloadItem, ty: &str) -> bool {
    w.workload_type == ty
}

fn by_type(a: &WorkloadItem, b: &WorkloadItem) -> Ordering {
    locale_cmp(&a.workload_type, &b.workload_type).then_with(|| by_name(a, b))
}

fn by_sidecar(a: &WorkloadItem, b: &WorkloadItem) -> Ordering {
    presence_first(a, b, sidecar)
}

fn by_app_label(a: &WorkloadItem, b: &WorkloadItem) -> Ordering {
    presence_first(a, b, app_label)
}

fn by_version_label(a: &WorkloadItem, b: &WorkloadItem) -> Ordering {
    presence_first(a, b, version_label)
}

pub static FILTERS: [FilterDescriptor<WorkloadItem>; 7] = [
    FilterDescriptor {
        id: "workloadname",
        title: "Workload Name",
        placeholder: "Filter by Workload Name",
        input: FilterInput::Text,
        action: FilterAction::Append,
        matcher: Matcher::Text { field: name, case: CaseMode::Sensitive },
    },
    FilterDescriptor {
        id: "workloadtype",
        title: "Workload Type",
        placeholder: "Filter by Workload Type",
        input: FilterInput::Select(WORKLOAD_TYPES),
        action: FilterAction::Append,
        matcher: Matcher::Select(is_type),
    },
    istio_sidecar_filter(sidecar),
    FilterDescriptor {
        id: "applabel",
        title: "App Label",
        placeholder: "Filter by App Label Validation",
        input: FilterInput::Select(PRESENCE_VALUES),
        action: FilterAction::Update,
        matcher: Matcher::Presence(app_label),
    },
    FilterDescriptor {
        id: "versionlabel",
        title: "Version Label",
        placeholder: "Filter by Version Label Validation",
        input: FilterInput::Select(PRESENCE_VALUES),
        action: FilterAction::Update,
        matcher: Matcher::Presence(version_label),
    },
    health_filter(),
    namespace_filter(super::in_namespace::<WorkloadItem>),
];

pub static SORTS: [SortDescriptor<WorkloadItem>; 7] = [
    SortDescriptor { id: "namespace", title: "Namespace", param: "ns", is_numeric: false, needs_health: false, compare: by_namespace::<WorkloadItem> },
    SortDescriptor { id: "workloadname", title: "Workload Name", param: "wn", is_numeric: false, needs_health: false, compare: by_name::<WorkloadItem> },
    SortDescriptor { id: "workloadtype", title: "Workload Type", param: "wt", is_numeric: false, needs_health: false, compare: by_type },
    SortDescriptor { id: "istiosidecar", title: "Istio Sidecar", param: "is", is_numeric: false, needs_health: false, compare: by_sidecar },
    SortDescriptor { id: "applabel", title: "App Label", param: "al", is_numeric: false, needs_health: false, compare: by_app_label },
    SortDescriptor { id: "versionlabel", title: "Version Label", param: "vl", is_numeric: false, needs_health: false, compare: by_version_label },
    SortDescriptor { id: "health", title: "Health", param: "he", is_numeric: false, needs_health: true, compare: by_health::<WorkloadItem> },
];

pub static REGISTRY: Registry<WorkloadItem> = Registry { kind: RecordKind::Workload, filters: &FILTERS, sorts: &SORTS };
