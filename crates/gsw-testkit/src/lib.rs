//! In-memory collaborators and message builders for scenario tests.
//!
//! No network, no clock: every fake is scripted by the test and records
//! what was asked of it.

mod channels;
mod directory;
mod sink;

pub use channels::FakeChannels;
pub use directory::FakeDirectory;
pub use sink::{RecordingSink, SinkCall};

use chrono::{DateTime, Utc};
use gsw_schemas::{ContentNode, InboundEmbed, RawMessage, RoleInfo};

/// A primary-shaped message: one container whose children are `lines`.
pub fn primary_message(id: &str, at: DateTime<Utc>, lines: &[&str]) -> RawMessage {
    RawMessage {
        id: id.to_string(),
        timestamp: at,
        components: vec![ContentNode::container(
            lines.iter().map(|l| ContentNode::text(*l)).collect(),
        )],
        embeds: Vec::new(),
    }
}

/// A fallback-shaped message: one embed with `description`.
pub fn fallback_message(id: &str, at: DateTime<Utc>, description: &str) -> RawMessage {
    RawMessage {
        id: id.to_string(),
        timestamp: at,
        components: Vec::new(),
        embeds: vec![InboundEmbed {
            description: Some(description.to_string()),
        }],
    }
}

/// Primary role-mention line: `<@&{role_id}> (x{qty})`.
pub fn mention_line(role_id: &str, qty: u32) -> String {
    format!("<@&{role_id}> (x{qty})")
}

pub fn role(id: &str, name: &str) -> RoleInfo {
    RoleInfo {
        id: id.to_string(),
        name: name.to_string(),
    }
}
