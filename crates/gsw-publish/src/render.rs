//! Snapshot -> webhook payload.
//!
//! Pure: the caller supplies `now`, the display timezone and the own guild's
//! roles (if any).

use chrono::{DateTime, Duration, NaiveTime, SecondsFormat, TimeZone, Utc};
use chrono_tz::Tz;
use gsw_schemas::{
    CanonicalSnapshot, Embed, EmbedField, EmbedFooter, Provenance, RoleInfo, StockItem,
    WebhookMessage,
};

pub const TITLE: &str = "🌱 GARDEN HORIZONS | STOCK";
pub const COLOR: u32 = 0x00FF00;

pub const SEEDS_HEADER: &str = "🌾 SEEDS";
pub const GEAR_HEADER: &str = "⚙️ GEAR";
pub const WEATHER_HEADER: &str = "☁️ WEATHER";
pub const BACKUP_HEADER: &str = "⚠️ Backup Mode";
pub const BACKUP_NOTICE: &str =
    "Bot is running in backup mode. Some information (weather, role pings) may be missing.";

const DEFAULT_WEATHER_EMOJI: &str = "☁️";

const EMOJIS: &[(&str, &str)] = &[
    // seeds
    ("Carrot", "🥕"),
    ("Corn", "🌽"),
    ("Onion", "🧅"),
    ("Strawberry", "🍓"),
    ("Mushroom", "🍄"),
    ("Beetroot", "🟣"),
    ("Tomato", "🍅"),
    ("Apple", "🍎"),
    ("Rose", "🌹"),
    ("Wheat", "🌾"),
    ("Banana", "🍌"),
    ("Plum", "🟣"),
    ("Potato", "🥔"),
    ("Cabbage", "🥬"),
    ("Cherry", "🍒"),
    // gear
    ("Watering Can", "💧"),
    ("Basic Sprinkler", "💦"),
    ("Harvest Bell", "🔔"),
    ("Turbo Sprinkler", "⚡"),
    ("Favorite Tool", "⭐"),
    ("Super Sprinkler", "💎"),
    // weather
    ("Fog", "🌫️"),
    ("Rain", "☔"),
    ("Sandstorm", "🏜️"),
    ("Snow", "❄️"),
    ("Starfall", "🌠"),
    ("Storm", "⛈️"),
];

pub fn emoji_for(name: &str) -> Option<&'static str> {
    EMOJIS.iter().find(|(n, _)| *n == name).map(|(_, e)| *e)
}

fn item_lines(items: &[StockItem]) -> String {
    items
        .iter()
        .map(|i| format!("• {} {} — {}", i.name, emoji_for(&i.name).unwrap_or(""), i.quantity))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Whole minutes from `now` until the next occurrence of wall-clock `end`
/// ("H:MM") in `tz`: later today, or tomorrow if that time already passed.
///
/// `None` if `end` does not parse or does not exist locally (DST gap).
pub fn minutes_until(end: &str, now: DateTime<Utc>, tz: Tz) -> Option<i64> {
    let end_time = NaiveTime::parse_from_str(end.trim(), "%H:%M").ok()?;
    let local_now = now.with_timezone(&tz);

    let mut end_at = tz
        .from_local_datetime(&local_now.date_naive().and_time(end_time))
        .earliest()?;
    if end_at < local_now {
        let next_day = local_now.date_naive() + Duration::days(1);
        end_at = tz.from_local_datetime(&next_day.and_time(end_time)).earliest()?;
    }

    let secs = (end_at.with_timezone(&Utc) - now).num_seconds();
    Some((secs as f64 / 60.0).round() as i64)
}

/// Role mentions for primary-sourced items: gear first, then seeds. Only
/// items carrying a source ref qualify; the role is looked up by name in the
/// own guild. `None` when nothing qualifies or provenance is fallback.
pub fn mention_prefix(snapshot: &CanonicalSnapshot, own_roles: &[RoleInfo]) -> Option<String> {
    if snapshot.source != Provenance::Primary {
        return None;
    }

    let mentions: Vec<String> = snapshot
        .gear_items
        .iter()
        .chain(snapshot.seed_items.iter())
        .filter(|item| item.source_ref.is_some())
        .filter_map(|item| own_roles.iter().find(|r| r.name == item.name))
        .map(|role| format!("<@&{}>", role.id))
        .collect();

    if mentions.is_empty() {
        None
    } else {
        Some(mentions.join(" "))
    }
}

/// Render the single summary message.
pub fn render_message(
    snapshot: &CanonicalSnapshot,
    own_roles: Option<&[RoleInfo]>,
    now: DateTime<Utc>,
    tz: Tz,
) -> WebhookMessage {
    let backup = snapshot.source == Provenance::Fallback;
    let mut fields = Vec::new();

    if !snapshot.seed_items.is_empty() {
        fields.push(EmbedField {
            name: SEEDS_HEADER.to_string(),
            value: item_lines(&snapshot.seed_items),
            inline: false,
        });
    }

    if !snapshot.gear_items.is_empty() {
        fields.push(EmbedField {
            name: GEAR_HEADER.to_string(),
            value: item_lines(&snapshot.gear_items),
            inline: false,
        });
    }

    if let (Some(w), false) = (&snapshot.weather, backup) {
        let time_left = w
            .end_time
            .as_deref()
            .and_then(|end| minutes_until(end, now, tz))
            .map(|m| format!(" ({m} min left)"))
            .unwrap_or_default();
        fields.push(EmbedField {
            name: WEATHER_HEADER.to_string(),
            value: format!(
                "• {} {}\n• Started: {}\n• Ends: {}{}",
                w.condition,
                emoji_for(&w.condition).unwrap_or(DEFAULT_WEATHER_EMOJI),
                w.start_time.as_deref().unwrap_or("??"),
                w.end_time.as_deref().unwrap_or("??"),
                time_left
            ),
            inline: false,
        });
    }

    if backup {
        fields.push(EmbedField {
            name: BACKUP_HEADER.to_string(),
            value: BACKUP_NOTICE.to_string(),
            inline: false,
        });
    }

    let updated = snapshot.last_updated_at.unwrap_or(now);
    let mut footer = format!(
        "Last update: {} {}",
        updated.with_timezone(&tz).format("%H:%M:%S"),
        tz.name()
    );
    if backup {
        footer.push_str(" ⚠️ Backup mode");
    }

    WebhookMessage {
        content: own_roles.and_then(|roles| mention_prefix(snapshot, roles)),
        embeds: vec![Embed {
            title: TITLE.to_string(),
            color: COLOR,
            fields,
            footer: EmbedFooter { text: footer },
            timestamp: updated.to_rfc3339_opts(SecondsFormat::Millis, true),
        }],
    }
}
