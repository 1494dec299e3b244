use chrono::{DateTime, Utc};
use gsw_schemas::{CanonicalSnapshot, Provenance};

use crate::{Candidate, DownTransition, ReconcileAction, ReconcileDiff, ReconcileReport};

fn condition(w: &Option<gsw_schemas::WeatherEvent>) -> Option<String> {
    w.as_ref().map(|w| w.condition.clone())
}

/// Deterministic structural comparison of a candidate against the committed
/// snapshot. Order- and field-sensitive over seeds, gear and weather;
/// provenance and timestamps are not compared.
pub fn reconcile(committed: &CanonicalSnapshot, candidate: &Candidate) -> ReconcileReport {
    let mut diffs: Vec<ReconcileDiff> = Vec::new();

    if committed.seed_items != candidate.seeds {
        diffs.push(ReconcileDiff::Seeds {
            committed: committed.seed_items.len(),
            observed: candidate.seeds.len(),
        });
    }

    if committed.gear_items != candidate.gear {
        diffs.push(ReconcileDiff::Gear {
            committed: committed.gear_items.len(),
            observed: candidate.gear.len(),
        });
    }

    if committed.weather != candidate.weather {
        diffs.push(ReconcileDiff::Weather {
            committed: condition(&committed.weather),
            observed: condition(&candidate.weather),
        });
    }

    diffs.sort();

    if diffs.is_empty() {
        ReconcileReport::unchanged()
    } else {
        ReconcileReport {
            action: ReconcileAction::Commit,
            diffs,
        }
    }
}

/// Overwrite the snapshot's content with the candidate. The published
/// message reference is left untouched.
pub fn apply(snapshot: &mut CanonicalSnapshot, candidate: Candidate, now: DateTime<Utc>) {
    snapshot.seed_items = candidate.seeds;
    snapshot.gear_items = candidate.gear;
    snapshot.weather = candidate.weather;
    snapshot.source = candidate.provenance;
    snapshot.last_updated_at = Some(now);
}

/// Edge detection for the primary-down flag.
pub fn down_transition(was_down: bool, tick: Option<Provenance>) -> DownTransition {
    let down_now = tick != Some(Provenance::Primary);
    match (was_down, down_now) {
        (false, true) => DownTransition::WentDown,
        (true, false) => DownTransition::Recovered,
        _ => DownTransition::NoChange,
    }
}
