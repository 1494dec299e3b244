//! Shared runtime state for gsw-daemon.
//!
//! Handlers receive `State<Arc<AppState>>` from Axum. The poll loop owns the
//! `Watcher` outright and only writes a status copy here after each tick.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use gsw_feed::{FetchError, RoleResolver};
use gsw_runtime::{PublishStatus, TickOutcome, TickReport, Watcher};
use gsw_schemas::Provenance;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

// ---------------------------------------------------------------------------
// BuildInfo
// ---------------------------------------------------------------------------

/// Static build metadata included in health / status responses.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
}

// ---------------------------------------------------------------------------
// StatusSnapshot
// ---------------------------------------------------------------------------

/// Point-in-time view of the watcher, returned by GET /v1/status.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub daemon_uptime_secs: u64,
    /// "idle" until the first tick, then "changed" | "unchanged" | "silent".
    pub last_outcome: String,
    pub last_tick_at: Option<DateTime<Utc>>,
    pub provenance: Option<Provenance>,
    pub seed_count: usize,
    pub gear_count: usize,
    pub weather: Option<String>,
    pub last_updated_at: Option<DateTime<Utc>>,
    pub published_message_id: Option<String>,
    pub publish_pending: bool,
    pub primary_down: bool,
    pub ticks_total: u64,
    pub role_cache_entries: usize,
}

impl StatusSnapshot {
    pub fn idle() -> Self {
        Self {
            last_outcome: "idle".to_string(),
            ..Default::default()
        }
    }

    /// Copy what the status endpoint shows out of the watcher.
    pub fn record_tick(&mut self, report: &TickReport, watcher: &Watcher, at: DateTime<Utc>) {
        let snap = watcher.snapshot();
        self.last_outcome = match report.outcome {
            TickOutcome::Changed { .. } => "changed",
            TickOutcome::Unchanged { .. } => "unchanged",
            TickOutcome::Silent => "silent",
        }
        .to_string();
        self.last_tick_at = Some(at);
        self.provenance = snap.last_updated_at.map(|_| snap.source);
        self.seed_count = snap.seed_items.len();
        self.gear_count = snap.gear_items.len();
        self.weather = snap.weather.as_ref().map(|w| w.condition.clone());
        self.last_updated_at = snap.last_updated_at;
        self.published_message_id = snap.published_message_ref.clone();
        self.publish_pending = watcher.publish_pending();
        self.primary_down = watcher.state().down_notified;
        self.ticks_total = watcher.ticks();
    }
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

/// Cloneable (Arc) handle shared across all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Static build metadata.
    pub build: BuildInfo,
    /// Latest watcher status.
    pub status: Arc<RwLock<StatusSnapshot>>,
    /// Shared with the primary feed; read for cache size only.
    pub resolver: Option<Arc<RoleResolver>>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            build: BuildInfo {
                service: "gsw-daemon",
                version: env!("CARGO_PKG_VERSION"),
            },
            status: Arc::new(RwLock::new(StatusSnapshot::idle())),
            resolver: None,
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<RoleResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Monotonically increasing uptime since first call (process lifetime).
pub fn uptime_secs() -> u64 {
    static START: std::sync::OnceLock<std::time::Instant> = std::sync::OnceLock::new();
    START
        .get_or_init(std::time::Instant::now)
        .elapsed()
        .as_secs()
}

fn log_report(report: &TickReport) {
    match &report.outcome {
        TickOutcome::Changed { provenance, fields } => {
            info!(provenance = provenance.as_str(), changed = ?fields, "tick: changed")
        }
        TickOutcome::Unchanged { provenance } => {
            debug!(provenance = provenance.as_str(), "tick: unchanged")
        }
        TickOutcome::Silent => info!("tick: silent"),
    }
    if let PublishStatus::Failed(e) = &report.publish {
        debug!(error = %e, "publish pending");
    }
}

/// Run a single tick and record it. Used by the poll loop and `--once`.
pub async fn run_tick(state: &AppState, watcher: &mut Watcher) -> TickReport {
    let report = watcher.tick().await;
    log_report(&report);
    state
        .status
        .write()
        .await
        .record_tick(&report, watcher, Utc::now());
    report
}

/// Spawn the poll loop. The first tick fires immediately.
///
/// The loop owns the watcher; it is the only task that mutates the snapshot.
pub fn spawn_poll_loop(
    state: Arc<AppState>,
    mut watcher: Watcher,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            run_tick(&state, &mut watcher).await;
        }
    })
}

/// Spawn the maintenance loop: wholesale-clear the role cache every
/// `interval`. The interval's immediate first tick is consumed without
/// clearing.
pub fn spawn_maintenance(resolver: Arc<RoleResolver>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let dropped = resolver.clear();
            info!(dropped, "maintenance: role cache cleared");
        }
    })
}

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

/// Run `attempt` until it succeeds or fails with `Unauthorized`.
///
/// Every other error is retried after a delay that starts at `initial` and
/// doubles up to `max`. A rejected token is returned on the first sight.
pub async fn login_with_retry<T, F, Fut>(
    mut attempt: F,
    initial: Duration,
    max: Duration,
) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let mut delay = initial;
    let mut attempts: u32 = 0;
    loop {
        attempts += 1;
        match attempt().await {
            Ok(v) => return Ok(v),
            Err(FetchError::Unauthorized) => return Err(FetchError::Unauthorized),
            Err(e) => {
                warn!(attempts, retry_in_secs = delay.as_secs(), error = %e, "login failed; retrying");
                tokio::time::sleep(delay).await;
                delay = (delay * 2).min(max);
            }
        }
    }
}
