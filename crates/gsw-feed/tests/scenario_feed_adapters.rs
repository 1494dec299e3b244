//! Scenario: primary and fallback adapters over in-memory channels.
//!
//! GREEN when:
//! - a fresh primary message yields resolved, deduplicated items
//! - unresolved mentions are dropped, never emitted nameless
//! - a stale primary message is `NoData(Stale)`, fallback ignores age
//! - an empty channel, a wrong-shaped message and an unreadable channel are
//!   told apart (`ChannelEmpty` / `WrongShape` / `Failed`)
//! - weather requires the "now" pattern

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use gsw_feed::{
    ChannelSource, FallbackFeed, FetchError, FetchOutcome, FreshnessWindow, NoDataReason,
    PrimaryFeed, RoleDirectory, RoleResolver,
};
use gsw_schemas::{ContentNode, InboundEmbed, RawMessage, RoleInfo, StockItem, WeatherEvent};

// ---------------------------------------------------------------------------
// Local fakes
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Channels {
    latest: HashMap<String, RawMessage>,
    broken: Vec<String>,
}

#[async_trait::async_trait]
impl ChannelSource for Channels {
    async fn latest_message(&self, channel_id: &str) -> Result<Option<RawMessage>, FetchError> {
        if self.broken.iter().any(|c| c == channel_id) {
            return Err(FetchError::Transport("connection reset".into()));
        }
        Ok(self.latest.get(channel_id).cloned())
    }
}

struct OneGuild(Vec<RoleInfo>);

#[async_trait::async_trait]
impl RoleDirectory for OneGuild {
    async fn guild_ids(&self) -> Result<Vec<String>, FetchError> {
        Ok(vec!["g1".into()])
    }

    async fn guild_roles(&self, _guild_id: &str) -> Result<Vec<RoleInfo>, FetchError> {
        Ok(self.0.clone())
    }
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

fn primary_msg(at: DateTime<Utc>, lines: &[&str]) -> RawMessage {
    RawMessage {
        id: "p".into(),
        timestamp: at,
        components: vec![ContentNode::container(
            lines.iter().map(|l| ContentNode::text(*l)).collect(),
        )],
        embeds: vec![],
    }
}

fn fallback_msg(at: DateTime<Utc>, description: &str) -> RawMessage {
    RawMessage {
        id: "f".into(),
        timestamp: at,
        components: vec![],
        embeds: vec![InboundEmbed {
            description: Some(description.into()),
        }],
    }
}

fn primary_feed(channels: Channels) -> PrimaryFeed {
    let dir = OneGuild(vec![
        RoleInfo {
            id: "10".into(),
            name: "Carrot".into(),
        },
        RoleInfo {
            id: "20".into(),
            name: "Corn".into(),
        },
    ]);
    let resolver = Arc::new(RoleResolver::new(Arc::new(dir), 100));
    PrimaryFeed::new(Arc::new(channels), resolver, FreshnessWindow::default())
}

// ---------------------------------------------------------------------------
// Primary
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fresh_primary_items_resolve_and_drop_unknown_roles() {
    let mut ch = Channels::default();
    ch.latest.insert(
        "seeds".into(),
        primary_msg(
            t0() - Duration::seconds(30),
            &["<@&10> (x3)", "<@&99> (x7)", "<@&20> (x1)", "<@&10> (x5)"],
        ),
    );

    let out = primary_feed(ch).items("seeds", t0()).await;
    assert_eq!(
        out,
        FetchOutcome::Data(vec![
            StockItem::new("Carrot", 3).with_source_ref("10"),
            StockItem::new("Corn", 1).with_source_ref("20"),
        ])
    );
}

#[tokio::test]
async fn stale_primary_is_no_data() {
    let mut ch = Channels::default();
    ch.latest.insert(
        "seeds".into(),
        primary_msg(t0() - Duration::seconds(301), &["<@&10> (x3)"]),
    );

    let out = primary_feed(ch).items("seeds", t0()).await;
    assert_eq!(out, FetchOutcome::NoData(NoDataReason::Stale { age_secs: 301 }));
}

#[tokio::test]
async fn primary_at_window_edge_is_fresh() {
    let mut ch = Channels::default();
    ch.latest.insert(
        "seeds".into(),
        primary_msg(t0() - Duration::seconds(300), &["<@&10> (x3)"]),
    );

    assert!(primary_feed(ch).items("seeds", t0()).await.is_data());
}

#[tokio::test]
async fn primary_outcomes_are_distinguished() {
    let mut ch = Channels::default();
    ch.latest.insert("embed-only".into(), fallback_msg(t0(), "Carrot x3"));
    ch.latest
        .insert("unresolved".into(), primary_msg(t0(), &["<@&99> (x3)"]));
    ch.broken.push("broken".into());
    let feed = primary_feed(ch);

    assert_eq!(
        feed.items("missing", t0()).await,
        FetchOutcome::NoData(NoDataReason::ChannelEmpty)
    );
    assert_eq!(
        feed.items("embed-only", t0()).await,
        FetchOutcome::NoData(NoDataReason::WrongShape)
    );
    assert_eq!(
        feed.items("unresolved", t0()).await,
        FetchOutcome::NoData(NoDataReason::NothingExtracted)
    );
    assert!(matches!(
        feed.items("broken", t0()).await,
        FetchOutcome::Failed(_)
    ));
}

#[tokio::test]
async fn weather_needs_current_condition() {
    let mut ch = Channels::default();
    ch.latest.insert(
        "weather".into(),
        primary_msg(t0(), &["Weather is now @Rain", "Started: 12:00", "Ends: 12:30"]),
    );
    ch.latest
        .insert("no-now".into(), primary_msg(t0(), &["Ends: 12:30"]));
    let feed = primary_feed(ch);

    assert_eq!(
        feed.weather("weather", t0()).await,
        FetchOutcome::Data(WeatherEvent {
            condition: "Rain".into(),
            start_time: Some("12:00".into()),
            end_time: Some("12:30".into()),
        })
    );
    assert_eq!(
        feed.weather("no-now", t0()).await,
        FetchOutcome::NoData(NoDataReason::NothingExtracted)
    );
}

// ---------------------------------------------------------------------------
// Fallback
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fallback_ignores_message_age() {
    let mut ch = Channels::default();
    ch.latest.insert(
        "seeds".into(),
        fallback_msg(t0() - Duration::days(3), "- Carrot x3\n- Corn x0\n- Onion x2"),
    );

    let out = FallbackFeed::new(Arc::new(ch)).items("seeds").await;
    assert_eq!(
        out,
        FetchOutcome::Data(vec![StockItem::new("Carrot", 3), StockItem::new("Onion", 2)])
    );
}

#[tokio::test]
async fn fallback_without_embed_is_wrong_shape() {
    let mut ch = Channels::default();
    ch.latest
        .insert("seeds".into(), primary_msg(t0(), &["<@&10> (x3)"]));

    let out = FallbackFeed::new(Arc::new(ch)).items("seeds").await;
    assert_eq!(out, FetchOutcome::NoData(NoDataReason::WrongShape));
}
