use gsw_schemas::{Provenance, StockItem, WeatherEvent};
use serde::Serialize;

/// One tick's selected data, before it is compared with the committed
/// snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Candidate {
    pub seeds: Vec<StockItem>,
    pub gear: Vec<StockItem>,
    pub weather: Option<WeatherEvent>,
    pub provenance: Provenance,
}

impl Candidate {
    /// Build from the primary streams. `None` for a stream means that stream
    /// had no data this tick.
    ///
    /// Returns `None` when both item streams are silent: primary is down and
    /// the fallback must be consulted. Otherwise each silent stream commits
    /// as cleared.
    pub fn from_primary(
        seeds: Option<Vec<StockItem>>,
        gear: Option<Vec<StockItem>>,
        weather: Option<WeatherEvent>,
    ) -> Option<Self> {
        if primary_is_silent(&seeds, &gear) {
            return None;
        }
        Some(Self {
            seeds: seeds.unwrap_or_default(),
            gear: gear.unwrap_or_default(),
            weather,
            provenance: Provenance::Primary,
        })
    }

    /// Build from the fallback streams. Weather is always cleared.
    ///
    /// Returns `None` when the fallback is silent as well: the tick commits
    /// nothing.
    pub fn from_fallback(seeds: Option<Vec<StockItem>>, gear: Option<Vec<StockItem>>) -> Option<Self> {
        if seeds.is_none() && gear.is_none() {
            return None;
        }
        Some(Self {
            seeds: seeds.unwrap_or_default(),
            gear: gear.unwrap_or_default(),
            weather: None,
            provenance: Provenance::Fallback,
        })
    }
}

/// Primary is down when neither item stream produced data. Weather alone
/// never keeps primary up.
pub fn primary_is_silent(seeds: &Option<Vec<StockItem>>, gear: &Option<Vec<StockItem>>) -> bool {
    seeds.is_none() && gear.is_none()
}

/// What the engine tells the runtime to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileAction {
    /// Content differs: commit, persist, publish.
    Commit,
    /// Structurally equal: nothing to do.
    Unchanged,
}

/// Which committed field a candidate differs in. Stable ordering.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReconcileDiff {
    Seeds { committed: usize, observed: usize },
    Gear { committed: usize, observed: usize },
    Weather {
        committed: Option<String>,
        observed: Option<String>,
    },
}

impl ReconcileDiff {
    pub fn field(&self) -> &'static str {
        match self {
            ReconcileDiff::Seeds { .. } => "seeds",
            ReconcileDiff::Gear { .. } => "gear",
            ReconcileDiff::Weather { .. } => "weather",
        }
    }
}

/// Full report.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconcileReport {
    pub action: ReconcileAction,
    pub diffs: Vec<ReconcileDiff>,
}

impl ReconcileReport {
    pub fn unchanged() -> Self {
        Self {
            action: ReconcileAction::Unchanged,
            diffs: Vec::new(),
        }
    }

    pub fn is_changed(&self) -> bool {
        self.action == ReconcileAction::Commit
    }

    /// Changed field names, for logging.
    pub fn changed_fields(&self) -> Vec<&'static str> {
        self.diffs.iter().map(ReconcileDiff::field).collect()
    }
}

/// Primary-down alert edge, derived from the persisted flag and this tick's
/// provenance (`None` = silent tick).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DownTransition {
    /// First tick without primary data.
    WentDown,
    /// First primary tick after an outage.
    Recovered,
    NoChange,
}
