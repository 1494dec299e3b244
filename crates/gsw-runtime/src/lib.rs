//! gsw-runtime
//!
//! The `Watcher` drives one reconcile tick end to end:
//! poll primary -> (primary down?) poll fallback -> diff -> persist -> publish.
//!
//! It is the single mutator of the canonical snapshot. Every collaborator
//! failure is absorbed at the tick boundary; `tick` never returns an error.

mod watcher;

pub use watcher::{PublishStatus, TickOutcome, TickReport, WatchChannels, Watcher, WatcherDeps};
