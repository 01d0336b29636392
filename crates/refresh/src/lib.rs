//! Refresh poller: at most one repeating task per owner, replaced atomically
//! when the interval changes and cancelled when the owner goes away.

#![forbid(unsafe_code)]

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Selectable intervals in milliseconds with their menu labels. `0` pauses.
pub const POLL_INTERVALS: [(u64, &str); 8] = [
    (0, "Pause"),
    (5_000, "Every 5 sec"),
    (10_000, "Every 10 sec"),
    (15_000, "Every 15 sec"),
    (30_000, "Every 30 sec"),
    (60_000, "Every 1 min"),
    (300_000, "Every 5 min"),
    (1_800_000, "Every 30 min"),
];

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 15_000;

pub fn interval_label(ms: u64) -> Option<&'static str> {
    POLL_INTERVALS.iter().find(|(v, _)| *v == ms).map(|(_, l)| *l)
}

/// Interval from `MESHLENS_REFRESH_MS`; unparsable or unsupported values fall back to the default.
pub fn interval_from_env() -> u64 {
    match std::env::var("MESHLENS_REFRESH_MS").ok().map(|s| s.parse::<u64>()) {
        None => DEFAULT_POLL_INTERVAL_MS,
        Some(Ok(ms)) if interval_label(ms).is_some() => ms,
        Some(_) => {
            warn!("invalid MESHLENS_REFRESH_MS; using default");
            DEFAULT_POLL_INTERVAL_MS
        }
    }
}

pub type Handler = Arc<dyn Fn() + Send + Sync>;

struct Repeater {
    stop: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

/// Owns the repeating refresh task of one view.
///
/// Must be driven from inside a tokio runtime; the first tick fires one full
/// interval after it is installed.
pub struct Refresher {
    handler: Handler,
    interval_ms: u64,
    repeater: Option<Repeater>,
}

impl Refresher {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self { handler: Arc::new(handler), interval_ms: 0, repeater: None }
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    pub fn is_running(&self) -> bool {
        self.repeater.as_ref().map(|r| !r.handle.is_finished()).unwrap_or(false)
    }

    /// Manual refresh, independent of the repeater.
    pub fn refresh_now(&self) {
        (self.handler)();
    }

    /// Replace the repeater. The previous one is cancelled before the new one is installed.
    pub fn set_interval(&mut self, ms: u64) {
        self.cancel();
        self.interval_ms = ms;
        if ms == 0 {
            info!("refresh: paused");
            return;
        }
        let period = Duration::from_millis(ms);
        let handler = Arc::clone(&self.handler);
        let first = Instant::now() + period;
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(first, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = &mut stop_rx => { break; }
                    _ = ticker.tick() => {
                        metrics::counter!("refresh_ticks_total", 1u64);
                        handler();
                    }
                }
            }
            debug!(interval_ms = ms, "refresh: repeater stopped");
        });
        info!(interval_ms = ms, label = interval_label(ms).unwrap_or("custom"), "refresh: repeater installed");
        self.repeater = Some(Repeater { stop: stop_tx, handle });
    }

    /// Cancel the repeater and pause.
    pub fn stop(&mut self) {
        self.cancel();
        self.interval_ms = 0;
    }

    fn cancel(&mut self) {
        if let Some(Repeater { stop, handle }) = self.repeater.take() {
            let _ = stop.send(());
            // a tick already due must not fire after cancellation
            handle.abort();
        }
    }
}

impl Drop for Refresher {
    fn drop(&mut self) {
        self.cancel();
    }
}
