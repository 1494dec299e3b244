use std::sync::Arc;

use chrono::{DateTime, Utc};
use gsw_feed::{FallbackFeed, FetchOutcome, PrimaryFeed, RoleDirectory};
use gsw_publish::{PublishOutcome, Publisher};
use gsw_reconcile::{apply, down_transition, reconcile, Candidate, DownTransition};
use gsw_schemas::{CanonicalSnapshot, PersistedState, Provenance, RoleInfo, Stream};
use gsw_store::StateStore;
use serde::Serialize;
use tracing::{debug, error, info, warn};

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

/// Channel ids of the five upstream streams.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WatchChannels {
    pub primary_seeds: String,
    pub primary_gear: String,
    pub primary_weather: String,
    pub fallback_seeds: String,
    pub fallback_gear: String,
}

/// Everything a [`Watcher`] needs besides its starting state.
pub struct WatcherDeps {
    pub primary: PrimaryFeed,
    pub fallback: FallbackFeed,
    pub channels: WatchChannels,
    /// Used for the own guild's roles at publish time.
    pub directory: Arc<dyn RoleDirectory>,
    pub own_guild_id: Option<String>,
    pub store: StateStore,
    pub publisher: Publisher,
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TickOutcome {
    /// Content differed and was committed.
    Changed {
        provenance: Provenance,
        fields: Vec<&'static str>,
    },
    /// Content equal to the committed snapshot.
    Unchanged { provenance: Provenance },
    /// Primary and fallback both had nothing; nothing committed.
    Silent,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PublishStatus {
    NotAttempted,
    Done(PublishOutcome),
    Failed(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TickReport {
    pub outcome: TickOutcome,
    pub publish: PublishStatus,
    /// Set when the primary-down flag flipped this tick.
    pub down_transition: Option<DownTransition>,
}

// ---------------------------------------------------------------------------
// Watcher
// ---------------------------------------------------------------------------

pub struct Watcher {
    primary: PrimaryFeed,
    fallback: FallbackFeed,
    channels: WatchChannels,
    directory: Arc<dyn RoleDirectory>,
    own_guild_id: Option<String>,
    store: StateStore,
    publisher: Publisher,

    state: PersistedState,
    /// A committed snapshot that has not reached the sink yet.
    publish_pending: bool,
    ticks: u64,
}

fn observe<T>(stream: Stream, outcome: FetchOutcome<T>) -> Option<T> {
    match outcome {
        FetchOutcome::Data(v) => Some(v),
        FetchOutcome::NoData(reason) => {
            debug!(stream = stream.as_str(), %reason, "no data");
            None
        }
        FetchOutcome::Failed(reason) => {
            warn!(stream = stream.as_str(), %reason, "fetch failed");
            None
        }
    }
}

impl Watcher {
    pub fn new(deps: WatcherDeps, initial: PersistedState) -> Self {
        Self {
            primary: deps.primary,
            fallback: deps.fallback,
            channels: deps.channels,
            directory: deps.directory,
            own_guild_id: deps.own_guild_id,
            store: deps.store,
            publisher: deps.publisher,
            state: initial,
            publish_pending: false,
            ticks: 0,
        }
    }

    pub fn snapshot(&self) -> &CanonicalSnapshot {
        &self.state.snapshot
    }

    pub fn state(&self) -> &PersistedState {
        &self.state
    }

    pub fn publish_pending(&self) -> bool {
        self.publish_pending
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub async fn tick(&mut self) -> TickReport {
        self.tick_at(Utc::now()).await
    }

    /// One reconcile pass with an explicit clock.
    pub async fn tick_at(&mut self, now: DateTime<Utc>) -> TickReport {
        self.ticks += 1;
        debug!(tick = self.ticks, "tick start");

        let candidate = self.select(now).await;

        let transition = down_transition(
            self.state.down_notified,
            candidate.as_ref().map(|c| c.provenance),
        );
        let flipped = self.note_transition(transition);

        let Some(candidate) = candidate else {
            info!("primary and fallback both silent; nothing committed");
            if flipped.is_some() {
                self.persist();
            }
            let publish = self.retry_pending(now).await;
            return TickReport {
                outcome: TickOutcome::Silent,
                publish,
                down_transition: flipped,
            };
        };

        let provenance = candidate.provenance;
        let report = reconcile(&self.state.snapshot, &candidate);

        if !report.is_changed() {
            debug!(provenance = provenance.as_str(), "unchanged");
            if flipped.is_some() {
                self.persist();
            }
            let publish = self.retry_pending(now).await;
            return TickReport {
                outcome: TickOutcome::Unchanged { provenance },
                publish,
                down_transition: flipped,
            };
        }

        let fields = report.changed_fields();
        info!(provenance = provenance.as_str(), changed = ?fields, "stock changed");

        apply(&mut self.state.snapshot, candidate, now);
        self.persist();
        let publish = self.publish(now).await;

        TickReport {
            outcome: TickOutcome::Changed { provenance, fields },
            publish,
            down_transition: flipped,
        }
    }

    /// Primary in full first; fallback only when both primary item streams
    /// are silent.
    async fn select(&self, now: DateTime<Utc>) -> Option<Candidate> {
        let ch = &self.channels;
        let (seeds, gear, weather) = tokio::join!(
            self.primary.items(&ch.primary_seeds, now),
            self.primary.items(&ch.primary_gear, now),
            self.primary.weather(&ch.primary_weather, now),
        );

        let seeds = observe(Stream::Seeds, seeds);
        let gear = observe(Stream::Gear, gear);
        let weather = observe(Stream::Weather, weather);

        if let Some(c) = Candidate::from_primary(seeds, gear, weather) {
            return Some(c);
        }

        debug!("primary silent; polling fallback");
        let (seeds, gear) = tokio::join!(
            self.fallback.items(&ch.fallback_seeds),
            self.fallback.items(&ch.fallback_gear),
        );
        Candidate::from_fallback(observe(Stream::Seeds, seeds), observe(Stream::Gear, gear))
    }

    fn note_transition(&mut self, transition: DownTransition) -> Option<DownTransition> {
        match transition {
            DownTransition::WentDown => {
                warn!("primary feed down; serving fallback");
                self.state.down_notified = true;
                Some(transition)
            }
            DownTransition::Recovered => {
                info!("primary feed recovered");
                self.state.down_notified = false;
                Some(transition)
            }
            DownTransition::NoChange => None,
        }
    }

    fn persist(&self) {
        if let Err(e) = self.store.save(&self.state) {
            error!(path = %self.store.path().display(), error = %format!("{e:#}"), "persist failed");
        }
    }

    async fn retry_pending(&mut self, now: DateTime<Utc>) -> PublishStatus {
        if !self.publish_pending {
            return PublishStatus::NotAttempted;
        }
        info!("retrying pending publish");
        self.publish(now).await
    }

    async fn own_roles(&self) -> Option<Vec<RoleInfo>> {
        if self.state.snapshot.source != Provenance::Primary {
            return None;
        }
        let guild_id = self.own_guild_id.as_deref()?;
        match self.directory.guild_roles(guild_id).await {
            Ok(roles) => Some(roles),
            Err(e) => {
                warn!(guild_id, error = %e, "own guild roles unavailable; publishing without mentions");
                None
            }
        }
    }

    async fn publish(&mut self, now: DateTime<Utc>) -> PublishStatus {
        let roles = self.own_roles().await;
        match self
            .publisher
            .publish(&mut self.state.snapshot, roles.as_deref(), now)
            .await
        {
            Ok(outcome) => {
                self.publish_pending = false;
                if outcome.changed_ref() {
                    self.persist();
                }
                PublishStatus::Done(outcome)
            }
            Err(e) => {
                error!(error = %e, "publish failed; will retry next tick");
                self.publish_pending = true;
                PublishStatus::Failed(e.to_string())
            }
        }
    }
}
