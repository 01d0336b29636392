//! Filter evaluation.
//!
//! Active filters are grouped by category into a [`FilterPlan`]. Categories
//! AND together; values inside an `Append` category OR together; an `Update`
//! category keeps only its last value. Categories that read health are
//! evaluated after the synchronous ones, on the survivors only.

use std::time::Instant;

use meshlens_core::{HealthStatus, ListItem};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::descriptor::{CaseMode, FilterAction, FilterDescriptor, Matcher, Registry, PRESENT};
use crate::health::{attach_health, HealthSource};
use crate::PipelineError;

/// A `(category, value)` selection currently applied. The category is the filter id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActiveFilter {
    pub category: String,
    pub value: String,
}

impl ActiveFilter {
    pub fn new(category: impl Into<String>, value: impl Into<String>) -> Self {
        Self { category: category.into(), value: value.into() }
    }
}

struct Clause<T: 'static> {
    descriptor: &'static FilterDescriptor<T>,
    values: Vec<String>,
}

impl<T: ListItem> Clause<T> {
    fn matches(&self, item: &T) -> bool {
        self.values.iter().any(|v| matches_value(&self.descriptor.matcher, item, v))
    }
}

fn matches_value<T: ListItem>(matcher: &Matcher<T>, item: &T, value: &str) -> bool {
    match matcher {
        Matcher::Text { field, case: CaseMode::Sensitive } => field(item).contains(value),
        Matcher::Text { field, case: CaseMode::Insensitive } => {
            field(item).to_lowercase().contains(&value.to_lowercase())
        }
        Matcher::Presence(get) => get(item) == (value == PRESENT),
        Matcher::Select(pred) => pred(item, value),
        Matcher::Health => match (item.health(), HealthStatus::from_name(value)) {
            (Some(health), Some(want)) => health.global_status() == want,
            _ => false,
        },
    }
}

/// Active filters resolved against a registry.
pub struct FilterPlan<T: 'static> {
    immediate: Vec<Clause<T>>,
    deferred: Vec<Clause<T>>,
}

impl<T: ListItem> FilterPlan<T> {
    pub fn build(active: &[ActiveFilter], registry: &Registry<T>) -> Self {
        // Categories keep the order of their first appearance.
        let mut order: Vec<&'static FilterDescriptor<T>> = Vec::new();
        let mut grouped: FxHashMap<&'static str, Vec<String>> = FxHashMap::default();
        for af in active {
            let Some(desc) = registry.filter(&af.category) else {
                metrics::counter!("pipeline_unknown_filter_total", 1u64);
                debug!(category = %af.category, kind = %registry.kind, "filter: unknown category ignored");
                continue;
            };
            if !desc.accepts_value(&af.value) {
                debug!(category = %af.category, value = %af.value, "filter: value ignored");
                continue;
            }
            let values = grouped.entry(desc.id).or_insert_with(|| {
                order.push(desc);
                Vec::new()
            });
            match desc.action {
                FilterAction::Append => {
                    if !values.contains(&af.value) {
                        values.push(af.value.clone());
                    }
                }
                FilterAction::Update => {
                    values.clear();
                    values.push(af.value.clone());
                }
            }
        }

        let mut immediate = Vec::new();
        let mut deferred = Vec::new();
        for desc in order {
            let values = grouped.remove(desc.id).unwrap_or_default();
            if values.is_empty() {
                continue;
            }
            let clause = Clause { descriptor: desc, values };
            if desc.is_deferred() { deferred.push(clause) } else { immediate.push(clause) }
        }
        Self { immediate, deferred }
    }

    /// No category constrains the result.
    pub fn is_empty(&self) -> bool {
        self.immediate.is_empty() && self.deferred.is_empty()
    }

    /// Evaluation needs asynchronously resolved data.
    pub fn is_deferred(&self) -> bool {
        !self.deferred.is_empty()
    }

    /// Ids of the constraining categories with their effective values.
    pub fn categories(&self) -> Vec<(&'static str, &[String])> {
        self.immediate
            .iter()
            .chain(self.deferred.iter())
            .map(|c| (c.descriptor.id, c.values.as_slice()))
            .collect()
    }

    fn passes_immediate(&self, item: &T) -> bool {
        self.immediate.iter().all(|c| c.matches(item))
    }

    fn passes_deferred(&self, item: &T) -> bool {
        self.deferred.iter().all(|c| c.matches(item))
    }

    /// Apply the synchronous clauses only. `None` when deferred clauses exist.
    pub fn apply_now(&self, records: Vec<T>) -> Option<Vec<T>> {
        if self.is_deferred() {
            return None;
        }
        Some(records.into_iter().filter(|r| self.passes_immediate(r)).collect())
    }

    /// Apply every clause, resolving health only when a deferred clause is present.
    pub async fn apply<H>(&self, records: Vec<T>, source: &H) -> Result<Vec<T>, PipelineError>
    where
        H: HealthSource<T> + ?Sized,
    {
        if self.is_empty() {
            return Ok(records);
        }
        let started = Instant::now();
        let total = records.len();
        let mut out: Vec<T> = records.into_iter().filter(|r| self.passes_immediate(r)).collect();
        if self.is_deferred() {
            out = attach_health(out, source).await?;
            out.retain(|r| self.passes_deferred(r));
        }
        metrics::histogram!("pipeline_filter_ms", started.elapsed().as_secs_f64() * 1_000.0);
        let kind = T::KIND;
        debug!(kind = %kind, total, kept = out.len(), deferred = self.is_deferred(), "filter: applied");
        Ok(out)
    }
}

/// Filter `records` by `active`. Input order is preserved; empty `active` is identity.
pub async fn apply_filters<T, H>(
    records: Vec<T>,
    active: &[ActiveFilter],
    registry: &Registry<T>,
    source: &H,
) -> Result<Vec<T>, PipelineError>
where
    T: ListItem,
    H: HealthSource<T> + ?Sized,
{
    FilterPlan::build(active, registry).apply(records, source).await
}
