//! gsw-reconcile
//!
//! Decision core of the watcher tick:
//! - primary is authoritative whenever either of its item streams has data
//! - both primary item streams silent => fallback, weather forced to none
//! - fallback silent too => nothing to commit
//! - commit only on structural (order- and field-sensitive) change
//!
//! Deterministic, pure logic. No IO. No clock.

mod engine;
mod types;

pub use engine::{apply, down_transition, reconcile};
pub use types::*;
