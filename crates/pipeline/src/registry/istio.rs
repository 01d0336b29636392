use std::cmp::Ordering;

use meshlens_core::{IstioConfigItem, RecordKind, ValidationState};

use crate::descriptor::{
    namespace_filter, CaseMode, FilterAction, FilterDescriptor, FilterInput, FilterValue, Matcher, Registry,
    SortDescriptor,
};
use crate::sort::{by_name, by_namespace, locale_cmp};

/// Kinds offered by the Istio type filter.
pub const ISTIO_TYPES: &[FilterValue] = &[
    FilterValue { id: "Gateway", title: "Gateway" },
    FilterValue { id: "VirtualService", title: "VirtualService" },
    FilterValue { id: "DestinationRule", title: "DestinationRule" },
    FilterValue { id: "ServiceEntry", title: "ServiceEntry" },
    FilterValue { id: "Rule", title: "Rule" },
    FilterValue { id: "Adapter", title: "Adapter" },
    FilterValue { id: "Template", title: "Template" },
    FilterValue { id: "QuotaSpec", title: "QuotaSpec" },
    FilterValue { id: "QuotaSpecBinding", title: "QuotaSpecBinding" },
    FilterValue { id: "Policy", title: "Policy" },
    FilterValue { id: "MeshPolicy", title: "MeshPolicy" },
    FilterValue { id: "ClusterRbacConfig", title: "ClusterRbacConfig" },
    FilterValue { id: "RbacConfig", title: "RbacConfig" },
    FilterValue { id: "ServiceRole", title: "ServiceRole" },
    FilterValue { id: "ServiceRoleBinding", title: "ServiceRoleBinding" },
];

const VALIDATION_VALUES: &[FilterValue] = &[
    FilterValue { id: "valid", title: "Valid" },
    FilterValue { id: "warning", title: "Warning" },
    FilterValue { id: "notvalid", title: "Not Valid" },
    FilterValue { id: "notvalidated", title: "Not Validated" },
];

fn name(c: &IstioConfigItem) -> &str {
    &c.name
}

fn is_kind(c: &IstioConfigItem, kind: &str) -> bool {
    c.kind == kind
}

fn in_validation_state(c: &IstioConfigItem, state: &str) -> bool {
    ValidationState::of(c.validation.as_ref()).id() == state
}

fn by_type(a: &IstioConfigItem, b: &IstioConfigItem) -> Ordering {
    locale_cmp(&a.type_key(), &b.type_key()).then_with(|| by_name(a, b))
}

// Adapters and templates often share namespace and name, so type is the last key.
fn by_istio_name(a: &IstioConfigItem, b: &IstioConfigItem) -> Ordering {
    by_name(a, b)
        .then_with(|| locale_cmp(&a.namespace, &b.namespace))
        .then_with(|| locale_cmp(&a.type_key(), &b.type_key()))
}

/// Validated before unvalidated; invalid before valid; then by number of findings
/// (invalid: more first, valid: fewer first); then name.
pub fn by_validation(a: &IstioConfigItem, b: &IstioConfigItem) -> Ordering {
    let primary = match (&a.validation, &b.validation) {
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
        (Some(va), Some(vb)) => match (va.valid, vb.valid) {
            (false, true) => Ordering::Less,
            (true, false) => Ordering::Greater,
            (true, true) => va.checks.len().cmp(&vb.checks.len()),
            (false, false) => vb.checks.len().cmp(&va.checks.len()),
        },
    };
    primary.then_with(|| by_name(a, b))
}

pub static FILTERS: [FilterDescriptor<IstioConfigItem>; 4] = [
    FilterDescriptor {
        id: "istiotype",
        title: "Istio Type",
        placeholder: "Filter by Istio Type",
        input: FilterInput::Select(ISTIO_TYPES),
        action: FilterAction::Append,
        matcher: Matcher::Select(is_kind),
    },
    FilterDescriptor {
        id: "istioname",
        title: "Istio Name",
        placeholder: "Filter by Istio Name",
        input: FilterInput::Text,
        action: FilterAction::Update,
        matcher: Matcher::Text { field: name, case: CaseMode::Insensitive },
    },
    FilterDescriptor {
        id: "configvalidation",
        title: "Config",
        placeholder: "Filter by Config Validation",
        input: FilterInput::Select(VALIDATION_VALUES),
        action: FilterAction::Append,
        matcher: Matcher::Select(in_validation_state),
    },
    namespace_filter(super::in_namespace::<IstioConfigItem>),
];

pub static SORTS: [SortDescriptor<IstioConfigItem>; 4] = [
    SortDescriptor { id: "namespace", title: "Namespace", param: "ns", is_numeric: false, needs_health: false, compare: by_namespace::<IstioConfigItem> },
    SortDescriptor { id: "istiotype", title: "Istio Type", param: "it", is_numeric: false, needs_health: false, compare: by_type },
    SortDescriptor { id: "istioname", title: "Istio Name", param: "in", is_numeric: false, needs_health: false, compare: by_istio_name },
    SortDescriptor { id: "configvalidation", title: "Config", param: "cv", is_numeric: false, needs_health: false, compare: by_validation },
];

pub static REGISTRY: Registry<IstioConfigItem> = Registry { kind: RecordKind::IstioConfig, filters: &FILTERS, sorts: &SORTS };

#[cfg(test)]
mod tests {
    use super::*;
    use meshlens_core::{CheckSeverity, Validation, ValidationCheck};

    fn item(name: &str, validation: Option<(bool, usize)>) -> IstioConfigItem {
        IstioConfigItem {
            namespace: "bookinfo".into(),
            name: name.into(),
            kind: "VirtualService".into(),
            sub_kind: None,
            validation: validation.map(|(valid, n)| Validation {
                valid,
                checks: (0..n)
                    .map(|i| ValidationCheck { message: format!("check {}", i), severity: CheckSeverity::Warning, path: None })
                    .collect(),
            }),
        }
    }

    #[test]
    fn validation_order() {
        let mut v = vec![
            item("none", None),
            item("valid-2", Some((true, 2))),
            item("valid-0", Some((true, 0))),
            item("invalid-1", Some((false, 1))),
            item("invalid-3", Some((false, 3))),
        ];
        v.sort_by(by_validation);
        let names: Vec<&str> = v.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["invalid-3", "invalid-1", "valid-0", "valid-2", "none"]);
    }

    #[test]
    fn unvalidated_ties_break_by_name() {
        assert_eq!(by_validation(&item("a", None), &item("b", None)), Ordering::Less);
    }
}
