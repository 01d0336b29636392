//! Static filter and sort descriptors.
//!
//! Every list page owns a [`Registry`] of `'static` descriptors parameterized by
//! its item type. Descriptors carry both the metadata shown in the toolbar and
//! the matcher/comparator the pipeline evaluates.

use std::cmp::Ordering;

use meshlens_core::{HealthStatus, RecordKind};
use serde::{Deserialize, Serialize};

/// How multiple active values of one category combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterAction {
    /// Any selected value matches (OR).
    Append,
    /// Only the most recently selected value is active.
    Update,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FilterValue {
    pub id: &'static str,
    pub title: &'static str,
}

pub const PRESENT: &str = "Present";
pub const NOT_PRESENT: &str = "Not Present";

pub const PRESENCE_VALUES: &[FilterValue] = &[
    FilterValue { id: PRESENT, title: PRESENT },
    FilterValue { id: NOT_PRESENT, title: NOT_PRESENT },
];

pub const HEALTH_VALUES: &[FilterValue] = &[
    FilterValue { id: "Healthy", title: "Healthy" },
    FilterValue { id: "Degraded", title: "Degraded" },
    FilterValue { id: "Failure", title: "Failure" },
    FilterValue { id: "No health information", title: "No health information" },
];

/// Toolbar input for a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterInput {
    Text,
    Select(&'static [FilterValue]),
    /// Select whose values are the namespaces known at runtime.
    Namespaces,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseMode {
    Sensitive,
    Insensitive,
}

/// Predicate of a filter over items of type `T`.
pub enum Matcher<T> {
    /// Substring containment against a named field.
    Text { field: fn(&T) -> &str, case: CaseMode },
    /// Equality against a boolean attribute; values are `Present` / `Not Present`.
    Presence(fn(&T) -> bool),
    /// Equality against a string attribute or derived classification.
    Select(fn(&T, &str) -> bool),
    /// Health bucket; needs resolved health.
    Health,
}

impl<T> Clone for Matcher<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Matcher<T> {}

impl<T> std::fmt::Debug for Matcher<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Matcher::Text { case, .. } => f.debug_struct("Text").field("case", case).finish_non_exhaustive(),
            Matcher::Presence(_) => f.write_str("Presence"),
            Matcher::Select(_) => f.write_str("Select"),
            Matcher::Health => f.write_str("Health"),
        }
    }
}

#[derive(Debug)]
pub struct FilterDescriptor<T> {
    pub id: &'static str,
    pub title: &'static str,
    pub placeholder: &'static str,
    pub input: FilterInput,
    pub action: FilterAction,
    pub matcher: Matcher<T>,
}

impl<T> FilterDescriptor<T> {
    /// True when evaluation has to wait for asynchronously resolved data.
    pub fn is_deferred(&self) -> bool {
        matches!(self.matcher, Matcher::Health)
    }

    /// Values this filter cannot interpret are dropped and do not constrain.
    pub(crate) fn accepts_value(&self, value: &str) -> bool {
        if value.is_empty() {
            return false;
        }
        match self.matcher {
            Matcher::Presence(_) => value == PRESENT || value == NOT_PRESENT,
            Matcher::Health => HealthStatus::from_name(value).is_some(),
            Matcher::Text { .. } | Matcher::Select(_) => true,
        }
    }
}

/// Shared health filter.
pub const fn health_filter<T>() -> FilterDescriptor<T> {
    FilterDescriptor {
        id: "health",
        title: "Health",
        placeholder: "Filter by Health",
        input: FilterInput::Select(HEALTH_VALUES),
        action: FilterAction::Append,
        matcher: Matcher::Health,
    }
}

/// Shared sidecar presence filter.
pub const fn istio_sidecar_filter<T>(get: fn(&T) -> bool) -> FilterDescriptor<T> {
    FilterDescriptor {
        id: "istiosidecar",
        title: "Istio Sidecar",
        placeholder: "Filter by Istio Sidecar",
        input: FilterInput::Select(PRESENCE_VALUES),
        action: FilterAction::Update,
        matcher: Matcher::Presence(get),
    }
}

/// Shared namespace filter; values come from the namespace inventory.
pub const fn namespace_filter<T>(matches: fn(&T, &str) -> bool) -> FilterDescriptor<T> {
    FilterDescriptor {
        id: "namespaces",
        title: "Namespace",
        placeholder: "Filter by Namespace",
        input: FilterInput::Namespaces,
        action: FilterAction::Append,
        matcher: Matcher::Select(matches),
    }
}

pub struct SortDescriptor<T> {
    pub id: &'static str,
    pub title: &'static str,
    /// Short URL parameter code.
    pub param: &'static str,
    pub is_numeric: bool,
    /// Comparison reads health, which must be resolved first.
    pub needs_health: bool,
    pub compare: fn(&T, &T) -> Ordering,
}

impl<T> std::fmt::Debug for SortDescriptor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SortDescriptor")
            .field("id", &self.id)
            .field("param", &self.param)
            .field("needs_health", &self.needs_health)
            .finish_non_exhaustive()
    }
}

/// Available filters and sorts of one list page.
pub struct Registry<T: 'static> {
    pub kind: RecordKind,
    pub filters: &'static [FilterDescriptor<T>],
    /// Non-empty; the first entry is the default sort.
    pub sorts: &'static [SortDescriptor<T>],
}

impl<T: 'static> Registry<T> {
    pub fn filter(&self, id: &str) -> Option<&'static FilterDescriptor<T>> {
        self.filters.iter().find(|f| f.id == id)
    }

    pub fn sort_by_id(&self, id: &str) -> Option<&'static SortDescriptor<T>> {
        self.sorts.iter().find(|s| s.id == id)
    }

    pub fn sort_by_param(&self, param: &str) -> Option<&'static SortDescriptor<T>> {
        self.sorts.iter().find(|s| s.param == param)
    }

    /// Lookup by URL param code first, then by id.
    pub fn sort(&self, key: &str) -> Option<&'static SortDescriptor<T>> {
        self.sort_by_param(key).or_else(|| self.sort_by_id(key))
    }

    pub fn default_sort(&self) -> &'static SortDescriptor<T> {
        &self.sorts[0]
    }
}
