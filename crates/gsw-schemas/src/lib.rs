//! gsw-schemas
//!
//! Shared shapes for the stock watcher:
//! - the canonical snapshot that is diffed, persisted and published
//! - inbound channel messages as returned by the upstream chat API
//! - the outbound webhook payload
//!
//! Serde names on the persisted types follow the legacy `state.json` layout
//! (`seeds`, `gear`, `count`, `roleId`, ...) so an existing state file is
//! adopted unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Canonical state
// ---------------------------------------------------------------------------

/// One stocked entity. `name` is the identity key across sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockItem {
    pub name: String,
    #[serde(rename = "count")]
    pub quantity: u32,
    /// Upstream role id; only present for primary-sourced items.
    #[serde(rename = "roleId", default, skip_serializing_if = "Option::is_none")]
    pub source_ref: Option<String>,
}

impl StockItem {
    pub fn new(name: impl Into<String>, quantity: u32) -> Self {
        Self {
            name: name.into(),
            quantity,
            source_ref: None,
        }
    }

    pub fn with_source_ref(mut self, source_ref: impl Into<String>) -> Self {
        self.source_ref = Some(source_ref.into());
        self
    }
}

/// The currently active weather condition.
///
/// Times are wall-clock `H:MM` strings exactly as the upstream posted them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherEvent {
    #[serde(rename = "weather")]
    pub condition: String,
    #[serde(rename = "startTime", default)]
    pub start_time: Option<String>,
    #[serde(rename = "endTime", default)]
    pub end_time: Option<String>,
}

/// Which upstream family produced the committed snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Provenance {
    #[default]
    #[serde(rename = "official", alias = "primary")]
    Primary,
    #[serde(rename = "backup", alias = "fallback")]
    Fallback,
}

impl Provenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provenance::Primary => "primary",
            Provenance::Fallback => "fallback",
        }
    }
}

/// Logical streams carried by a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stream {
    Seeds,
    Gear,
    Weather,
}

impl Stream {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stream::Seeds => "seeds",
            Stream::Gear => "gear",
            Stream::Weather => "weather",
        }
    }
}

/// Last committed canonical state. Unit of diffing and persistence.
///
/// Item order is extraction order; it is significant for equality and for
/// rendering.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CanonicalSnapshot {
    #[serde(rename = "seeds", default)]
    pub seed_items: Vec<StockItem>,
    #[serde(rename = "gear", default)]
    pub gear_items: Vec<StockItem>,
    #[serde(default)]
    pub weather: Option<WeatherEvent>,
    #[serde(default)]
    pub source: Provenance,
    #[serde(rename = "lastUpdate", default)]
    pub last_updated_at: Option<DateTime<Utc>>,
    #[serde(rename = "messageId", default)]
    pub published_message_ref: Option<String>,
}

impl CanonicalSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    /// `true` when there is at least one seed, one gear item or a weather event.
    pub fn has_content(&self) -> bool {
        !self.seed_items.is_empty() || !self.gear_items.is_empty() || self.weather.is_some()
    }
}

/// Durable record: the snapshot plus flags that are not part of the diff.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(flatten)]
    pub snapshot: CanonicalSnapshot,
    /// Set while the primary feed is considered down.
    #[serde(rename = "downNotified", default)]
    pub down_notified: bool,
}

// ---------------------------------------------------------------------------
// Inbound (upstream chat API)
// ---------------------------------------------------------------------------

/// One node of a structured-content tree. Leaves carry text; containers
/// carry children. Both may be present.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContentNode {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub components: Vec<ContentNode>,
}

impl ContentNode {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            components: Vec::new(),
        }
    }

    pub fn container(components: Vec<ContentNode>) -> Self {
        Self {
            content: None,
            components,
        }
    }
}

/// Embed as received from upstream; only the description is consumed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InboundEmbed {
    #[serde(default)]
    pub description: Option<String>,
}

/// Most recent message of a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMessage {
    pub id: String,
    /// Creation time.
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub components: Vec<ContentNode>,
    #[serde(default)]
    pub embeds: Vec<InboundEmbed>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleInfo {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildInfo {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

// ---------------------------------------------------------------------------
// Outbound (webhook payload)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub inline: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedFooter {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    pub title: String,
    pub color: u32,
    pub fields: Vec<EmbedField>,
    pub footer: EmbedFooter,
    /// RFC 3339.
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub embeds: Vec<Embed>,
}
