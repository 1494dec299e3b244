//! Collaborator boundary for the upstream chat API.
//!
//! This module defines **only** the traits and the error type. The concrete
//! HTTP client lives in `discord.rs`; in-memory fakes live in `gsw-testkit`.

use std::fmt;

use gsw_schemas::{RawMessage, RoleInfo};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors a [`ChannelSource`] or [`RoleDirectory`] implementation may return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Credentials were refused. At login this is fatal.
    Unauthorized,
    /// The addressed channel or guild does not exist (or is not visible).
    NotFound(String),
    /// Network or transport failure.
    Transport(String),
    /// Upstream returned a non-success status.
    Api { status: u16, message: String },
    /// A response payload could not be decoded.
    Decode(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Unauthorized => write!(f, "unauthorized: token rejected"),
            FetchError::NotFound(what) => write!(f, "not found: {what}"),
            FetchError::Transport(msg) => write!(f, "transport error: {msg}"),
            FetchError::Api { status, message } => {
                write!(f, "upstream api error status={status}: {message}")
            }
            FetchError::Decode(msg) => write!(f, "decode error: {msg}"),
        }
    }
}

impl std::error::Error for FetchError {}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Read access to the latest message of a logical channel.
#[async_trait::async_trait]
pub trait ChannelSource: Send + Sync {
    /// The single most recent message, or `None` for an empty channel.
    async fn latest_message(&self, channel_id: &str) -> Result<Option<RawMessage>, FetchError>;
}

/// Group (guild) contexts and their role labels.
#[async_trait::async_trait]
pub trait RoleDirectory: Send + Sync {
    /// Every locally known guild, in a stable order.
    async fn guild_ids(&self) -> Result<Vec<String>, FetchError>;

    /// All roles of one guild.
    async fn guild_roles(&self, guild_id: &str) -> Result<Vec<RoleInfo>, FetchError>;
}
