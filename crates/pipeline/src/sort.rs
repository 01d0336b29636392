//! Sort evaluation and the shared comparators used by the registries.

use std::cmp::Ordering;
use std::time::Instant;

use meshlens_core::{HealthStatus, ListItem};
use tracing::debug;

use crate::descriptor::SortDescriptor;
use crate::health::{attach_health, HealthSource};
use crate::PipelineError;

/// Case-folded comparison first; on a folded tie lowercase sorts before
/// uppercase, then raw comparison.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    let fold = |s: &str| s.chars().flat_map(char::to_lowercase).collect::<Vec<char>>();
    fold(a)
        .cmp(&fold(b))
        .then_with(|| a.chars().map(char::is_uppercase).cmp(b.chars().map(char::is_uppercase)))
        .then_with(|| a.cmp(b))
}

pub fn by_name<T: ListItem>(a: &T, b: &T) -> Ordering {
    locale_cmp(a.name(), b.name())
}

/// Namespace, then name.
pub fn by_namespace<T: ListItem>(a: &T, b: &T) -> Ordering {
    locale_cmp(a.namespace(), b.namespace()).then_with(|| by_name(a, b))
}

/// Items with the attribute first, then name.
pub fn presence_first<T: ListItem>(a: &T, b: &T, get: fn(&T) -> bool) -> Ordering {
    get(b).cmp(&get(a)).then_with(|| by_name(a, b))
}

/// More severe status first, then higher error rate, then name.
///
/// Items without health rank as `NotAvailable` with no traffic.
pub fn by_health<T: ListItem>(a: &T, b: &T) -> Ordering {
    let rank = |x: &T| match x.health() {
        Some(h) => (h.global_status().priority(), h.errors().value),
        None => (HealthStatus::NotAvailable.priority(), -1.0),
    };
    let (pa, ra) = rank(a);
    let (pb, rb) = rank(b);
    pb.cmp(&pa)
        .then_with(|| rb.total_cmp(&ra))
        .then_with(|| by_name(a, b))
}

/// Stable in-place sort; descending swaps the comparator arguments.
pub fn sort_in_place<T>(records: &mut [T], field: &SortDescriptor<T>, ascending: bool) {
    let compare = field.compare;
    if ascending {
        records.sort_by(|a, b| compare(a, b));
    } else {
        records.sort_by(|a, b| compare(b, a));
    }
}

/// Order `records` by `field`. Health-dependent fields resolve health for every
/// item first; any failed lookup fails the whole sort.
pub async fn apply_sort<T, H>(
    records: Vec<T>,
    field: &SortDescriptor<T>,
    ascending: bool,
    source: &H,
) -> Result<Vec<T>, PipelineError>
where
    T: ListItem,
    H: HealthSource<T> + ?Sized,
{
    let mut records = if field.needs_health { attach_health(records, source).await? } else { records };
    let started = Instant::now();
    sort_in_place(&mut records, field, ascending);
    metrics::histogram!("pipeline_sort_ms", started.elapsed().as_secs_f64() * 1_000.0);
    debug!(field = field.id, ascending, items = records.len(), "sort: applied");
    Ok(records)
}
