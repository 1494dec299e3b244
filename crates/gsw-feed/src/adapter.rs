//! Source adapters: latest message -> shape gate -> (freshness) -> extraction.
//!
//! Every poll returns a tagged [`FetchOutcome`] so callers can tell real data
//! from an upstream that had nothing to say and from a failed read. No
//! adapter error ever propagates past this module.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use gsw_schemas::{RawMessage, StockItem, WeatherEvent};
use tracing::debug;

use crate::extract::{
    dedupe_by_name, extract_fallback_items, extract_primary_mentions, extract_weather,
    flatten_components,
};
use crate::freshness::{Freshness, FreshnessWindow};
use crate::resolver::RoleResolver;
use crate::source::ChannelSource;

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Why a stream produced nothing this poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoDataReason {
    /// The channel has no messages.
    ChannelEmpty,
    /// The latest message does not have the shape this family expects.
    WrongShape,
    /// The latest message is older than the freshness window.
    Stale { age_secs: i64 },
    /// Text was present but nothing recognisable was in it.
    NothingExtracted,
}

impl fmt::Display for NoDataReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoDataReason::ChannelEmpty => write!(f, "channel empty"),
            NoDataReason::WrongShape => write!(f, "unexpected message shape"),
            NoDataReason::Stale { age_secs } => write!(f, "stale message age={age_secs}s"),
            NoDataReason::NothingExtracted => write!(f, "nothing extracted"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome<T> {
    Data(T),
    NoData(NoDataReason),
    /// Transport or upstream failure, with the reason.
    Failed(String),
}

impl<T> FetchOutcome<T> {
    pub fn is_data(&self) -> bool {
        matches!(self, FetchOutcome::Data(_))
    }
}

// ---------------------------------------------------------------------------
// Families
// ---------------------------------------------------------------------------

/// The two upstream shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedFamily {
    /// Structured component tree, role-mention lines, timestamped.
    Primary,
    /// Embed descriptions with free-text lines.
    Fallback,
}

impl FeedFamily {
    /// The text this family extracts from, or `None` if the message does not
    /// have this family's shape.
    pub fn message_text(&self, msg: &RawMessage) -> Option<String> {
        match self {
            FeedFamily::Primary => {
                if msg.components.is_empty() {
                    None
                } else {
                    Some(flatten_components(&msg.components))
                }
            }
            FeedFamily::Fallback => {
                let first = msg.embeds.first()?;
                Some(first.description.clone().unwrap_or_default())
            }
        }
    }
}

async fn latest_text(
    source: &dyn ChannelSource,
    family: FeedFamily,
    channel_id: &str,
    window: Option<(FreshnessWindow, DateTime<Utc>)>,
) -> FetchOutcome<String> {
    let msg = match source.latest_message(channel_id).await {
        Ok(Some(m)) => m,
        Ok(None) => return FetchOutcome::NoData(NoDataReason::ChannelEmpty),
        Err(e) => return FetchOutcome::Failed(e.to_string()),
    };

    let Some(text) = family.message_text(&msg) else {
        return FetchOutcome::NoData(NoDataReason::WrongShape);
    };

    if let Some((window, now)) = window {
        if let Freshness::Stale { age_secs } = window.check(msg.timestamp, now) {
            return FetchOutcome::NoData(NoDataReason::Stale { age_secs });
        }
    }

    FetchOutcome::Data(text)
}

/// Primary family: role-mention lines and weather, gated by freshness.
#[derive(Clone)]
pub struct PrimaryFeed {
    source: Arc<dyn ChannelSource>,
    resolver: Arc<RoleResolver>,
    window: FreshnessWindow,
}

impl PrimaryFeed {
    pub fn new(
        source: Arc<dyn ChannelSource>,
        resolver: Arc<RoleResolver>,
        window: FreshnessWindow,
    ) -> Self {
        Self {
            source,
            resolver,
            window,
        }
    }

    async fn text(&self, channel_id: &str, now: DateTime<Utc>) -> FetchOutcome<String> {
        latest_text(
            self.source.as_ref(),
            FeedFamily::Primary,
            channel_id,
            Some((self.window, now)),
        )
        .await
    }

    /// Items of a primary seed or gear channel.
    ///
    /// Mentions whose role id cannot be resolved are dropped; an item always
    /// has a name.
    pub async fn items(&self, channel_id: &str, now: DateTime<Utc>) -> FetchOutcome<Vec<StockItem>> {
        let text = match self.text(channel_id, now).await {
            FetchOutcome::Data(t) => t,
            FetchOutcome::NoData(r) => return FetchOutcome::NoData(r),
            FetchOutcome::Failed(e) => return FetchOutcome::Failed(e),
        };

        let mut items = Vec::new();
        for mention in extract_primary_mentions(&text) {
            match self.resolver.resolve(&mention.role_id).await {
                Some(name) => items.push(
                    StockItem::new(name, mention.quantity).with_source_ref(mention.role_id),
                ),
                None => debug!(role_id = %mention.role_id, "unresolved role; line dropped"),
            }
        }

        let items = dedupe_by_name(items);
        if items.is_empty() {
            FetchOutcome::NoData(NoDataReason::NothingExtracted)
        } else {
            FetchOutcome::Data(items)
        }
    }

    /// Current weather of the primary weather channel.
    pub async fn weather(&self, channel_id: &str, now: DateTime<Utc>) -> FetchOutcome<WeatherEvent> {
        match self.text(channel_id, now).await {
            FetchOutcome::Data(t) => match extract_weather(&t) {
                Some(w) => FetchOutcome::Data(w),
                None => FetchOutcome::NoData(NoDataReason::NothingExtracted),
            },
            FetchOutcome::NoData(r) => FetchOutcome::NoData(r),
            FetchOutcome::Failed(e) => FetchOutcome::Failed(e),
        }
    }
}

/// Fallback family: free-text embed lines. No freshness gate.
#[derive(Clone)]
pub struct FallbackFeed {
    source: Arc<dyn ChannelSource>,
}

impl FallbackFeed {
    pub fn new(source: Arc<dyn ChannelSource>) -> Self {
        Self { source }
    }

    pub async fn items(&self, channel_id: &str) -> FetchOutcome<Vec<StockItem>> {
        match latest_text(self.source.as_ref(), FeedFamily::Fallback, channel_id, None).await {
            FetchOutcome::Data(t) => {
                let items = extract_fallback_items(&t);
                if items.is_empty() {
                    FetchOutcome::NoData(NoDataReason::NothingExtracted)
                } else {
                    FetchOutcome::Data(items)
                }
            }
            FetchOutcome::NoData(r) => FetchOutcome::NoData(r),
            FetchOutcome::Failed(e) => FetchOutcome::Failed(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gsw_schemas::{ContentNode, InboundEmbed};

    fn msg(components: Vec<ContentNode>, embeds: Vec<InboundEmbed>) -> RawMessage {
        RawMessage {
            id: "1".into(),
            timestamp: Utc::now(),
            components,
            embeds,
        }
    }

    #[test]
    fn primary_family_requires_components() {
        let m = msg(vec![], vec![InboundEmbed::default()]);
        assert_eq!(FeedFamily::Primary.message_text(&m), None);

        let m = msg(vec![ContentNode::text("a")], vec![]);
        assert_eq!(FeedFamily::Primary.message_text(&m).as_deref(), Some("a\n"));
    }

    #[test]
    fn fallback_family_reads_first_embed_only() {
        let m = msg(
            vec![],
            vec![
                InboundEmbed {
                    description: Some("- Corn x1".into()),
                },
                InboundEmbed {
                    description: Some("- Onion x2".into()),
                },
            ],
        );
        assert_eq!(
            FeedFamily::Fallback.message_text(&m).as_deref(),
            Some("- Corn x1")
        );
        assert_eq!(FeedFamily::Fallback.message_text(&msg(vec![], vec![])), None);
    }

    #[test]
    fn only_data_counts_as_data() {
        let d: FetchOutcome<u8> = FetchOutcome::Data(1);
        let n: FetchOutcome<u8> = FetchOutcome::NoData(NoDataReason::ChannelEmpty);
        let f: FetchOutcome<u8> = FetchOutcome::Failed("x".into());
        assert!(d.is_data());
        assert!(!n.is_data());
        assert!(!f.is_data());
    }
}
