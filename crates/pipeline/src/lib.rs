//! meshlens pipeline: declarative filtering and sorting of list page records.
//!
//! A page hands its records, the active filters and the selected sort to the
//! pipeline and gets back the view to render. Health-dependent criteria are
//! resolved through a [`HealthSource`] only when they are in play; every entry
//! point returns a future, ready immediately when nothing had to be resolved.

#![forbid(unsafe_code)]

use std::time::Instant;

use meshlens_core::ListItem;
use tracing::debug;

pub mod descriptor;
pub mod filter;
pub mod health;
pub mod query;
pub mod registry;
pub mod sort;

pub use descriptor::{
    CaseMode, FilterAction, FilterDescriptor, FilterInput, FilterValue, Matcher, Registry, SortDescriptor,
};
pub use filter::{apply_filters, ActiveFilter, FilterPlan};
pub use health::{attach_health, CarriedHealth, HealthSource};
pub use query::ListQuery;
pub use sort::{apply_sort, sort_in_place};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PipelineError {
    #[error("health unavailable for {namespace}/{name}: {reason}")]
    HealthUnavailable { namespace: String, name: String, reason: String },
    #[error("health source: {0}")]
    Source(String),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Filter, then sort. Either step may resolve health; an error from either fails the view.
pub async fn run_with<T, H>(
    records: Vec<T>,
    active: &[ActiveFilter],
    field: &SortDescriptor<T>,
    ascending: bool,
    registry: &Registry<T>,
    source: &H,
) -> PipelineResult<Vec<T>>
where
    T: ListItem,
    H: HealthSource<T> + ?Sized,
{
    let started = Instant::now();
    metrics::histogram!("pipeline_items_in", records.len() as f64);
    let filtered = apply_filters(records, active, registry, source).await?;
    let sorted = apply_sort(filtered, field, ascending, source).await?;
    metrics::histogram!("pipeline_items_out", sorted.len() as f64);
    debug!(kind = %registry.kind, sort = field.id, ascending, items = sorted.len(), took_ms = %started.elapsed().as_millis(), "pipeline: view ready");
    Ok(sorted)
}

/// Run the view described by a parsed URL query.
pub async fn run<T, H>(
    records: Vec<T>,
    query: &ListQuery,
    registry: &Registry<T>,
    source: &H,
) -> PipelineResult<Vec<T>>
where
    T: ListItem,
    H: HealthSource<T> + ?Sized,
{
    let field = query.sort_field(registry);
    run_with(records, &query.filters, field, query.ascending, registry, source).await
}

pub mod prelude {
    pub use super::{
        apply_filters, apply_sort, run, run_with, ActiveFilter, CarriedHealth, HealthSource, ListQuery,
        PipelineError, Registry,
    };
    pub use super::registry::{apps, istio, namespaces, services, workloads};
}
