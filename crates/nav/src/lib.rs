//! Breadcrumb derivation for detail pages.
//!
//! A detail path has the shape `namespaces/<ns>/<page>/<name>[/<x>][/<y>]`.
//! Istio object paths carry the object type in place of the name and the name
//! further down (`namespaces/<ns>/istio/<type>/<name>`, or two segments
//! deeper for `templates` and `adapters`).

#![forbid(unsafe_code)]

use meshlens_pipeline::query::{encode, param};
use meshlens_pipeline::ActiveFilter;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::debug;

pub const TAB_KEY: &str = "tab";
pub const ISTIO_TYPE_FILTER: &str = "istiotype";
pub const NAMESPACE_FILTER: &str = "namespaces";

/// Istio types whose object name sits two segments below the type.
const NESTED_ISTIO_TYPES: [&str; 2] = ["templates", "adapters"];

static PATH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"namespaces/([a-z0-9\-]+)/([a-z0-9\-]+)/([a-z0-9\-]+)(/([a-z0-9\-]+))?(/([a-z0-9\-]+))?")
        .expect("breadcrumb path pattern")
});

/// URL segment of an Istio type to the object kind it lists.
const ISTIO_KINDS: &[(&str, &str)] = &[
    ("gateways", "Gateway"),
    ("virtualservices", "VirtualService"),
    ("destinationrules", "DestinationRule"),
    ("serviceentries", "ServiceEntry"),
    ("rules", "Rule"),
    ("adapters", "Adapter"),
    ("templates", "Template"),
    ("quotaspecs", "QuotaSpec"),
    ("quotaspecbindings", "QuotaSpecBinding"),
    ("policies", "Policy"),
    ("meshpolicies", "MeshPolicy"),
    ("clusterrbacconfigs", "ClusterRbacConfig"),
    ("rbacconfigs", "RbacConfig"),
    ("serviceroles", "ServiceRole"),
    ("servicerolebindings", "ServiceRoleBinding"),
];

pub fn istio_kind_for_segment(segment: &str) -> Option<&'static str> {
    ISTIO_KINDS.iter().find(|(s, _)| *s == segment).map(|(_, k)| *k)
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum NavError {
    #[error("not a detail page path: {0}")]
    UnrecognizedPath(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Page {
    Applications,
    Services,
    Workloads,
    Istio,
}

impl Page {
    pub fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "applications" => Some(Page::Applications),
            "services" => Some(Page::Services),
            "workloads" => Some(Page::Workloads),
            "istio" => Some(Page::Istio),
            _ => None,
        }
    }

    pub fn segment(self) -> &'static str {
        match self {
            Page::Applications => "applications",
            Page::Services => "services",
            Page::Workloads => "workloads",
            Page::Istio => "istio",
        }
    }

    /// Label of the list page.
    pub fn label(self) -> &'static str {
        match self {
            Page::Applications => "Applications",
            Page::Services => "Services",
            Page::Workloads => "Workloads",
            Page::Istio => "Istio Config",
        }
    }

    /// Label of one item of the page.
    pub fn item_label(self) -> &'static str {
        match self {
            Page::Applications => "App",
            Page::Services => "Service",
            Page::Workloads => "Workload",
            Page::Istio => "Istio Object",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tab {
    #[default]
    Info,
    Metrics,
    InMetrics,
    OutMetrics,
    Traces,
}

impl Tab {
    /// Unknown or missing values select `Info`.
    pub fn from_param(value: Option<&str>) -> Self {
        match value {
            Some("metrics") => Tab::Metrics,
            Some("in_metrics") => Tab::InMetrics,
            Some("out_metrics") => Tab::OutMetrics,
            Some("traces") => Tab::Traces,
            _ => Tab::Info,
        }
    }

    pub fn id(self) -> &'static str {
        match self {
            Tab::Info => "info",
            Tab::Metrics => "metrics",
            Tab::InMetrics => "in_metrics",
            Tab::OutMetrics => "out_metrics",
            Tab::Traces => "traces",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Tab::Info => "Info",
            Tab::Metrics => "Metrics",
            Tab::InMetrics => "Inbound Metrics",
            Tab::OutMetrics => "Outbound Metrics",
            Tab::Traces => "Traces",
        }
    }
}

/// One element of the rendered trail. `link` is absent for the current location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Crumb {
    pub label: String,
    pub link: Option<String>,
}

impl Crumb {
    fn link(label: String, link: String) -> Self {
        Self { label, link: Some(link) }
    }

    fn here(label: String) -> Self {
        Self { label, link: None }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Breadcrumb {
    pub namespace: String,
    /// Raw page segment as found in the path.
    pub segment: String,
    /// `None` when the segment is not a known page.
    pub page: Option<Page>,
    pub item: Option<String>,
    /// Istio object type segment, only on Istio pages.
    pub istio_type: Option<String>,
    pub tab: Tab,
}

impl Breadcrumb {
    pub fn derive(path: &str, query: &str) -> Result<Self, NavError> {
        let caps = PATH_RE.captures(path).ok_or_else(|| NavError::UnrecognizedPath(path.to_string()))?;
        let group = |i: usize| caps.get(i).map(|m| m.as_str().to_string());
        let namespace = group(1).unwrap_or_default();
        let segment = group(2).unwrap_or_default();
        let third = group(3);
        let page = Page::from_segment(&segment);
        let (item, istio_type) = if page == Some(Page::Istio) {
            let ty = third.unwrap_or_default();
            let item = if NESTED_ISTIO_TYPES.contains(&ty.as_str()) { group(7) } else { group(5) };
            (item, Some(ty))
        } else {
            (third, None)
        };
        let tab = Tab::from_param(param(query, TAB_KEY).as_deref());
        debug!(namespace = %namespace, page = %segment, item = ?item, tab = tab.id(), "nav: breadcrumb derived");
        Ok(Self { namespace, segment, page, item, istio_type, tab })
    }

    pub fn is_istio(&self) -> bool {
        self.page == Some(Page::Istio)
    }

    /// Unknown pages are labelled as Applications.
    pub fn page_label(&self) -> &'static str {
        self.page.unwrap_or(Page::Applications).label()
    }

    pub fn item_label(&self) -> &'static str {
        self.page.unwrap_or(Page::Applications).item_label()
    }

    pub fn list_path(&self) -> String {
        format!("/{}", self.segment)
    }

    pub fn namespace_path(&self) -> String {
        format!("/{}?{}={}", self.segment, NAMESPACE_FILTER, encode(&self.namespace))
    }

    pub fn item_path(&self) -> Option<String> {
        self.item.as_ref().map(|item| format!("/namespaces/{}/{}/{}", self.namespace, self.segment, item))
    }

    /// Filter installed by the Istio type crumb, if the type is known.
    pub fn type_filter(&self) -> Option<ActiveFilter> {
        let kind = istio_kind_for_segment(self.istio_type.as_deref()?)?;
        Some(ActiveFilter::new(ISTIO_TYPE_FILTER, kind))
    }

    /// List page, namespace, Istio type (Istio pages), item, and tab (other pages).
    pub fn crumbs(&self) -> Vec<Crumb> {
        let item_label = self.item_label();
        let item = self.item.as_deref().unwrap_or("");
        let mut out = vec![
            Crumb::link(self.page_label().to_string(), self.list_path()),
            Crumb::link(format!("Namespace: {}", self.namespace), self.namespace_path()),
        ];
        if self.is_istio() {
            let ty = self.istio_type.as_deref().unwrap_or("");
            let link = match self.type_filter() {
                Some(f) => format!("{}&{}={}", self.namespace_path(), f.category, encode(&f.value)),
                None => self.namespace_path(),
            };
            out.push(Crumb::link(format!("{} Type: {}", item_label, ty), link));
            out.push(Crumb::here(format!("{}: {}", item_label, item)));
        } else {
            let label = format!("{}: {}", item_label, item);
            out.push(match self.item_path() {
                Some(path) => Crumb::link(label, path),
                None => Crumb::here(label),
            });
            out.push(Crumb::here(format!("{} {}", item_label, self.tab.title())));
        }
        out
    }
}
