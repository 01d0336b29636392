//! meshlens core types: the records listed by the console pages.

#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

pub mod columns;
pub mod health;
pub mod validation;

pub use health::{ComponentHealth, Health, HealthStatus, RequestHealth};
pub use validation::{CheckSeverity, Validation, ValidationCheck, ValidationState};

/// Kubernetes labels as key/value pairs.
pub type Labels = SmallVec<[(String, String); 8]>;

/// Discriminant of [`Record`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Service,
    Workload,
    App,
    IstioConfig,
    Namespace,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown record kind: {0} (expected services, workloads, apps, istio or namespaces)")]
pub struct UnknownKind(pub String);

impl RecordKind {
    pub const ALL: [RecordKind; 5] = [
        RecordKind::Service,
        RecordKind::Workload,
        RecordKind::App,
        RecordKind::IstioConfig,
        RecordKind::Namespace,
    ];

    /// URL path segment of the list page for this kind.
    pub fn path_segment(self) -> &'static str {
        match self {
            RecordKind::Service => "services",
            RecordKind::Workload => "workloads",
            RecordKind::App => "applications",
            RecordKind::IstioConfig => "istio",
            RecordKind::Namespace => "namespaces",
        }
    }
}

impl std::str::FromStr for RecordKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "service" | "services" | "svc" => Ok(RecordKind::Service),
            "workload" | "workloads" | "wl" => Ok(RecordKind::Workload),
            "app" | "apps" | "application" | "applications" => Ok(RecordKind::App),
            "istio" | "istio_config" | "istioconfig" | "config" => Ok(RecordKind::IstioConfig),
            "namespace" | "namespaces" | "ns" => Ok(RecordKind::Namespace),
            _ => Err(UnknownKind(s.to_string())),
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path_segment())
    }
}

/// Common view over every listed item.
///
/// Identity is `(namespace, name)`. Health is optional because list pages receive
/// it after the inventory itself; the pipeline attaches it on demand.
pub trait ListItem: Clone + Send + Sync + 'static {
    const KIND: RecordKind;

    fn name(&self) -> &str;
    fn namespace(&self) -> &str;

    fn health(&self) -> Option<&Health> {
        None
    }

    fn attach_health(&mut self, _health: Health) {}

    fn from_record(record: Record) -> Option<Self>;
    fn into_record(self) -> Record;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceItem {
    pub namespace: String,
    pub name: String,
    #[serde(default)]
    pub istio_sidecar: bool,
    #[serde(default)]
    pub labels: Labels,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health: Option<Health>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkloadItem {
    pub namespace: String,
    pub name: String,
    /// Controller type: Deployment, ReplicaSet, StatefulSet, ...
    #[serde(rename = "type", default)]
    pub workload_type: String,
    #[serde(default)]
    pub istio_sidecar: bool,
    #[serde(default)]
    pub app_label: bool,
    #[serde(default)]
    pub version_label: bool,
    #[serde(default)]
    pub labels: Labels,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health: Option<Health>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppItem {
    pub namespace: String,
    pub name: String,
    #[serde(default)]
    pub istio_sidecar: bool,
    #[serde(default)]
    pub labels: Labels,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health: Option<Health>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IstioConfigItem {
    pub namespace: String,
    pub name: String,
    /// Object kind as shown in the type column, e.g. `Gateway`, `VirtualService`.
    pub kind: String,
    /// Mixer adapter/template flavour (`prometheus`, `metric`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<Validation>,
}

impl IstioConfigItem {
    /// Type key used for ordering: adapters and templates carry their flavour.
    pub fn type_key(&self) -> String {
        let base = self.kind.to_ascii_lowercase();
        match (base.as_str(), self.sub_kind.as_deref()) {
            ("adapter" | "template", Some(sub)) => format!("{}_{}", base, sub),
            _ => base,
        }
    }
}

/// Per-namespace app health counters shown on the overview page.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NamespaceStatus {
    #[serde(default)]
    pub in_error: Vec<String>,
    #[serde(default)]
    pub in_warning: Vec<String>,
    #[serde(default)]
    pub in_success: Vec<String>,
    #[serde(default)]
    pub not_available: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TlsStatus {
    /// `MTLS_ENABLED`, `MTLS_PARTIALLY_ENABLED`, `MTLS_NOT_ENABLED`
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NamespaceInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<NamespaceStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_status: Option<TlsStatus>,
    #[serde(default)]
    pub labels: Labels,
}

/// One listed item of any kind.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "entity", rename_all = "snake_case")]
pub enum Record {
    Service(ServiceItem),
    Workload(WorkloadItem),
    App(AppItem),
    IstioConfig(IstioConfigItem),
    Namespace(NamespaceInfo),
}

impl Record {
    pub fn kind(&self) -> RecordKind {
        match self {
            Record::Service(_) => RecordKind::Service,
            Record::Workload(_) => RecordKind::Workload,
            Record::App(_) => RecordKind::App,
            Record::IstioConfig(_) => RecordKind::IstioConfig,
            Record::Namespace(_) => RecordKind::Namespace,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Record::Service(s) => &s.name,
            Record::Workload(w) => &w.name,
            Record::App(a) => &a.name,
            Record::IstioConfig(c) => &c.name,
            Record::Namespace(n) => &n.name,
        }
    }

    pub fn namespace(&self) -> &str {
        match self {
            Record::Service(s) => &s.namespace,
            Record::Workload(w) => &w.namespace,
            Record::App(a) => &a.namespace,
            Record::IstioConfig(c) => &c.namespace,
            Record::Namespace(n) => &n.name,
        }
    }
}

macro_rules! list_item_with_health {
    ($ty:ty, $variant:ident, $kind:expr) => {
        impl ListItem for $ty {
            const KIND: RecordKind = $kind;
            fn name(&self) -> &str { &self.name }
            fn namespace(&self) -> &str { &self.namespace }
            fn health(&self) -> Option<&Health> { self.health.as_ref() }
            fn attach_health(&mut self, health: Health) { self.health = Some(health); }
            fn from_record(record: Record) -> Option<Self> {
                match record { Record::$variant(v) => Some(v), _ => None }
            }
            fn into_record(self) -> Record { Record::$variant(self) }
        }
    };
}

list_item_with_health!(ServiceItem, Service, RecordKind::Service);
list_item_with_health!(WorkloadItem, Workload, RecordKind::Workload);
list_item_with_health!(AppItem, App, RecordKind::App);

impl ListItem for IstioConfigItem {
    const KIND: RecordKind = RecordKind::IstioConfig;
    fn name(&self) -> &str { &self.name }
    fn namespace(&self) -> &str { &self.namespace }
    fn from_record(record: Record) -> Option<Self> {
        match record { Record::IstioConfig(v) => Some(v), _ => None }
    }
    fn into_record(self) -> Record { Record::IstioConfig(self) }
}

impl ListItem for NamespaceInfo {
    const KIND: RecordKind = RecordKind::Namespace;
    fn name(&self) -> &str { &self.name }
    // A namespace is its own scope.
    fn namespace(&self) -> &str { &self.name }
    fn from_record(record: Record) -> Option<Self> {
        match record { Record::Namespace(v) => Some(v), _ => None }
    }
    fn into_record(self) -> Record { Record::Namespace(self) }
}

/// Keep only the records of kind `T`, preserving order.
pub fn records_of<T: ListItem>(records: impl IntoIterator<Item = Record>) -> Vec<T> {
    records.into_iter().filter_map(T::from_record).collect()
}

pub mod prelude {
    pub use super::{
        AppItem, Health, HealthStatus, IstioConfigItem, Labels, ListItem, NamespaceInfo, Record,
        RecordKind, ServiceItem, Validation, WorkloadItem,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_round_trips_with_entity_tag() {
        let raw = serde_json::json!({
            "entity": "istio_config",
            "namespace": "bookinfo",
            "name": "bookinfo-gateway",
            "kind": "Gateway"
        });
        let rec: Record = serde_json::from_value(raw).unwrap();
        assert_eq!(rec.kind(), RecordKind::IstioConfig);
        assert_eq!(rec.name(), "bookinfo-gateway");
        assert_eq!(rec.namespace(), "bookinfo");
        let back = serde_json::to_value(&rec).unwrap();
        assert_eq!(back["entity"], "istio_config");
        assert_eq!(back["kind"], "Gateway");
    }

    #[test]
    fn records_of_selects_one_kind_in_order() {
        let recs = vec![
            Record::Namespace(NamespaceInfo { name: "a".into(), status: None, tls_status: None, labels: Labels::new() }),
            Record::App(AppItem { namespace: "a".into(), name: "x".into(), istio_sidecar: true, labels: Labels::new(), health: None }),
            Record::App(AppItem { namespace: "a".into(), name: "y".into(), istio_sidecar: false, labels: Labels::new(), health: None }),
        ];
        let apps: Vec<AppItem> = records_of(recs);
        let names: Vec<&str> = apps.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["x", "y"]);
    }

    #[test]
    fn kind_parses_plural_and_short_forms() {
        assert_eq!("services".parse::<RecordKind>(), Ok(RecordKind::Service));
        assert_eq!("WL".parse::<RecordKind>(), Ok(RecordKind::Workload));
        assert_eq!("applications".parse::<RecordKind>(), Ok(RecordKind::App));
        assert_eq!("istio".parse::<RecordKind>(), Ok(RecordKind::IstioConfig));
        assert!("pods".parse::<RecordKind>().is_err());
    }

    #[test]
    fn adapter_type_key_carries_flavour() {
        let item = IstioConfigItem {
            namespace: "istio-system".into(),
            name: "handler".into(),
            kind: "Adapter".into(),
            sub_kind: Some("prometheus".into()),
            validation: None,
        };
        assert_eq!(item.type_key(), "adapter_prometheus");
    }
}
