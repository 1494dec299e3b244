//! Text extraction for both upstream shapes.
//!
//! Pure functions only: no I/O, no clock, no resolver. Identical input always
//! yields an identical output sequence; the diff step depends on it.
//!
//! - Primary lines carry a role mention and a parenthesised multiplier:
//!   `<@&123> (x3)`. Resolution of the role id to a name happens in the
//!   adapter, so this module only yields [`PrimaryMention`]s.
//! - Fallback lines are free text: `- Carrot x3`, `• Watering Can x2`.
//! - Weather is three independent patterns over the whole text.

use std::collections::HashSet;
use std::sync::LazyLock;

use gsw_schemas::{ContentNode, StockItem, WeatherEvent};
use regex::Regex;

static PRIMARY_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<@&(\d+)>\s*\(x(\d+)\)").expect("valid primary line regex"));

static FALLBACK_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([\w\s]*?\w)\s*x(\d+)").expect("valid fallback line regex")
});

// Anything that is neither a word character nor whitespace: bullets, dashes,
// markdown emphasis, emoji.
static DECORATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s]").expect("valid decoration regex"));

// Weather patterns never cross a line break; flattened leaves sit on
// separate lines.
static WEATHER_NOW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bnow[ \t]+@?(\w+)").expect("valid weather regex"));
static WEATHER_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bstart(?:s|ed)?:?[ \t]*(\d{1,2}:\d{2})").expect("valid start regex")
});
static WEATHER_END: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bend(?:s|ed)?:?[ \t]*(\d{1,2}:\d{2})").expect("valid end regex")
});

/// A primary-form line before its role id has been resolved to a name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryMention {
    pub role_id: String,
    pub quantity: u32,
}

/// Flatten a structured-content tree depth-first: each node's own text on
/// its own line, then its children, in document order.
pub fn flatten_components(nodes: &[ContentNode]) -> String {
    fn walk(node: &ContentNode, out: &mut String) {
        if let Some(text) = node.content.as_deref() {
            out.push_str(text);
            out.push('\n');
        }
        for child in &node.components {
            walk(child, out);
        }
    }

    let mut out = String::new();
    for node in nodes {
        walk(node, &mut out);
    }
    out
}

/// Parse every primary-form line. Non-matching lines are ignored.
pub fn extract_primary_mentions(text: &str) -> Vec<PrimaryMention> {
    text.lines()
        .filter_map(|line| {
            let cap = PRIMARY_LINE.captures(line)?;
            let quantity = parse_quantity(&cap[2])?;
            Some(PrimaryMention {
                role_id: cap[1].to_string(),
                quantity,
            })
        })
        .collect()
}

/// Parse every fallback-form line into an item without a `source_ref`.
pub fn extract_fallback_items(text: &str) -> Vec<StockItem> {
    let items = text.lines().filter_map(parse_fallback_line).collect();
    dedupe_by_name(items)
}

fn parse_fallback_line(line: &str) -> Option<StockItem> {
    let cleaned = DECORATION.replace_all(line, " ");
    let cap = FALLBACK_LINE.captures(&cleaned)?;
    let name = normalize_name(&cap[1]);
    if name.is_empty() {
        return None;
    }
    let quantity = parse_quantity(&cap[2])?;
    Some(StockItem::new(name, quantity))
}

/// Match the three weather patterns. Without a current condition there is no
/// event, whatever the start/end patterns found.
pub fn extract_weather(text: &str) -> Option<WeatherEvent> {
    let condition = WEATHER_NOW.captures(text)?[1].to_string();
    let start_time = WEATHER_START.captures(text).map(|c| c[1].to_string());
    let end_time = WEATHER_END.captures(text).map(|c| c[1].to_string());
    Some(WeatherEvent {
        condition,
        start_time,
        end_time,
    })
}

/// Keep the first occurrence of every name, preserving order.
pub fn dedupe_by_name(items: Vec<StockItem>) -> Vec<StockItem> {
    let mut seen: HashSet<String> = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.name.clone()))
        .collect()
}

/// Collapse internal whitespace runs and trim.
pub fn normalize_name(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

// Zero and overflowing multipliers are not valid stock.
fn parse_quantity(digits: &str) -> Option<u32> {
    digits.parse::<u32>().ok().filter(|q| *q > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_is_depth_first_in_document_order() {
        let tree = vec![
            ContentNode {
                content: Some("header".into()),
                components: vec![
                    ContentNode::text("<@&1> (x3)"),
                    ContentNode::container(vec![ContentNode::text("<@&2> (x1)")]),
                ],
            },
            ContentNode::text("footer"),
        ];
        assert_eq!(
            flatten_components(&tree),
            "header\n<@&1> (x3)\n<@&2> (x1)\nfooter\n"
        );
    }

    #[test]
    fn primary_lines_parse_and_noise_is_ignored() {
        let text = "**Seed stock**\n<@&111> (x3)\nrandom chatter\n<@&222>   (x12)\n<@&333> x4\n";
        assert_eq!(
            extract_primary_mentions(text),
            vec![
                PrimaryMention {
                    role_id: "111".into(),
                    quantity: 3
                },
                PrimaryMention {
                    role_id: "222".into(),
                    quantity: 12
                },
            ]
        );
    }

    #[test]
    fn primary_zero_multiplier_is_dropped() {
        assert!(extract_primary_mentions("<@&111> (x0)").is_empty());
    }

    #[test]
    fn fallback_lines_strip_bullets_and_decoration() {
        let text = "Current stock:\n- Carrot x3\n• Watering Can x2\n🍓 **Strawberry** X5\nnothing here\n";
        assert_eq!(
            extract_fallback_items(text),
            vec![
                StockItem::new("Carrot", 3),
                StockItem::new("Watering Can", 2),
                StockItem::new("Strawberry", 5),
            ]
        );
    }

    #[test]
    fn fallback_name_ending_in_x_is_kept_whole() {
        assert_eq!(
            extract_fallback_items("Fox x2"),
            vec![StockItem::new("Fox", 2)]
        );
    }

    #[test]
    fn fallback_duplicates_keep_first() {
        let items = extract_fallback_items("Corn x1\nCorn x9\nOnion x2");
        assert_eq!(
            items,
            vec![StockItem::new("Corn", 1), StockItem::new("Onion", 2)]
        );
    }

    #[test]
    fn weather_requires_condition() {
        assert_eq!(extract_weather("Start: 12:00\nEnd: 12:30"), None);

        let w = extract_weather("Weather is now @Rain\nStart: 12:00\nEnd 12:30").unwrap();
        assert_eq!(w.condition, "Rain");
        assert_eq!(w.start_time.as_deref(), Some("12:00"));
        assert_eq!(w.end_time.as_deref(), Some("12:30"));
    }

    #[test]
    fn weather_condition_stays_on_its_line() {
        assert_eq!(
            extract_weather("Forecast updated just now\nStart: 12:00\nEnd: 12:30"),
            None
        );

        let w = extract_weather("Weather is now Rain\nStart:\n12:00").unwrap();
        assert_eq!(w.condition, "Rain");
        assert_eq!(w.start_time, None, "time on the next line is not the start");
    }

    #[test]
    fn weather_times_are_optional() {
        let w = extract_weather("It is NOW Fog").unwrap();
        assert_eq!(w.condition, "Fog");
        assert_eq!(w.start_time, None);
        assert_eq!(w.end_time, None);
    }

    #[test]
    fn extraction_is_deterministic() {
        let text = "- Carrot x3\n- Corn x1\n- Tomato x7";
        assert_eq!(extract_fallback_items(text), extract_fallback_items(text));
    }
}
