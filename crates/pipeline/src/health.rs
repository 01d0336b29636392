//! Deferred health resolution.
//!
//! List inventories arrive without health; it is fetched per item by an
//! external collaborator behind [`HealthSource`]. The pipeline fans requests
//! out concurrently and joins them before any health-dependent step runs.

use std::time::Instant;

use async_trait::async_trait;
use futures::future::try_join_all;
use meshlens_core::{Health, ListItem};
use tracing::{debug, warn};

use crate::PipelineError;

#[async_trait]
pub trait HealthSource<T: ListItem>: Send + Sync {
    async fn health(&self, item: &T) -> Result<Health, PipelineError>;
}

/// Uses the health already carried by each item; items without it are an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct CarriedHealth;

#[async_trait]
impl<T: ListItem> HealthSource<T> for CarriedHealth {
    async fn health(&self, item: &T) -> Result<Health, PipelineError> {
        item.health().cloned().ok_or_else(|| PipelineError::HealthUnavailable {
            namespace: item.namespace().to_string(),
            name: item.name().to_string(),
            reason: "no health attached".into(),
        })
    }
}

/// Resolve health for every item that does not carry it yet, preserving order.
///
/// All lookups run concurrently; the first failure fails the whole call and no
/// partially resolved set is returned.
pub async fn attach_health<T, H>(items: Vec<T>, source: &H) -> Result<Vec<T>, PipelineError>
where
    T: ListItem,
    H: HealthSource<T> + ?Sized,
{
    let started = Instant::now();
    let pending = items.iter().filter(|i| i.health().is_none()).count();
    let lookups = items.into_iter().map(|mut item| async move {
        if item.health().is_none() {
            let health = source.health(&item).await?;
            item.attach_health(health);
        }
        Ok::<T, PipelineError>(item)
    });
    match try_join_all(lookups).await {
        Ok(resolved) => {
            debug!(pending, took_ms = %started.elapsed().as_millis(), "health: resolved");
            Ok(resolved)
        }
        Err(e) => {
            metrics::counter!("health_resolve_failures_total", 1u64);
            warn!(error = %e, pending, "health: resolution failed");
            Err(e)
        }
    }
}
