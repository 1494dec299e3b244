//! gsw-feed
//!
//! Inbound side of the watcher: the upstream API boundary, the Discord REST
//! client, the pure text extractor, the role resolver and the two source
//! adapter families.
//!
//! Callers (the runtime) poll adapters and receive tagged outcomes; nothing
//! here decides which source is authoritative.

pub mod adapter;
pub mod discord;
pub mod extract;
pub mod freshness;
pub mod resolver;
pub mod source;

pub use adapter::{FallbackFeed, FeedFamily, FetchOutcome, NoDataReason, PrimaryFeed};
pub use discord::{CurrentUser, DiscordClient};
pub use freshness::{Freshness, FreshnessWindow};
pub use resolver::RoleResolver;
pub use source::{ChannelSource, FetchError, RoleDirectory};
