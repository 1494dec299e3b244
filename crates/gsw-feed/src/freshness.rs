//! Freshness window for primary-source messages.
//!
//! The primary upstream posts a new message per real update. A latest message
//! older than the window means the upstream is not currently running, so the
//! message is treated exactly like an absent one.
//!
//! # Invariants
//!
//! - **Strictly older is stale**: age == window is still fresh.
//! - **Clock skew is tolerated**: a message stamped in the future is fresh.
//! - **Pure, no IO**: the caller supplies `now`.

use chrono::{DateTime, Duration, Utc};

/// Result of checking a message timestamp against the window.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Freshness {
    /// Within the window.
    Fresh,

    /// Older than the window.
    Stale {
        /// Observed age in whole seconds.
        age_secs: i64,
    },

    /// Stamped after `now` (upstream or local clock skew).
    FromFuture {
        ahead_secs: i64,
    },
}

/// Maximum age a primary message may have and still be considered current.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FreshnessWindow {
    max_age: Duration,
}

impl Default for FreshnessWindow {
    fn default() -> Self {
        Self::from_secs(5 * 60)
    }
}

impl FreshnessWindow {
    /// Window of `max_age_secs`; values beyond what a `Duration` can hold
    /// clamp to the largest one.
    pub fn from_secs(max_age_secs: u64) -> Self {
        let max_age = i64::try_from(max_age_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or(Duration::MAX);
        Self { max_age }
    }

    pub fn check(&self, created_at: DateTime<Utc>, now: DateTime<Utc>) -> Freshness {
        let age = now.signed_duration_since(created_at);
        if age < Duration::zero() {
            return Freshness::FromFuture {
                ahead_secs: -age.num_seconds(),
            };
        }
        if age > self.max_age {
            return Freshness::Stale {
                age_secs: age.num_seconds(),
            };
        }
        Freshness::Fresh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, h, m, s).unwrap()
    }

    #[test]
    fn within_window_is_fresh() {
        let w = FreshnessWindow::from_secs(300);
        assert_eq!(w.check(t(12, 0, 0), t(12, 4, 59)), Freshness::Fresh);
    }

    #[test]
    fn exactly_at_window_is_fresh() {
        let w = FreshnessWindow::from_secs(300);
        assert_eq!(w.check(t(12, 0, 0), t(12, 5, 0)), Freshness::Fresh);
    }

    #[test]
    fn older_than_window_is_stale() {
        let w = FreshnessWindow::from_secs(300);
        let f = w.check(t(12, 0, 0), t(12, 5, 1));
        assert_eq!(f, Freshness::Stale { age_secs: 301 });
    }

    #[test]
    fn future_timestamp_is_accepted() {
        let w = FreshnessWindow::default();
        let f = w.check(t(12, 0, 30), t(12, 0, 0));
        assert_eq!(f, Freshness::FromFuture { ahead_secs: 30 });
    }

    #[test]
    fn oversized_window_clamps_instead_of_panicking() {
        let w = FreshnessWindow::from_secs(100_000_000_000_000_000);
        assert_eq!(w, FreshnessWindow::from_secs(u64::MAX));
        assert_eq!(w.check(t(0, 0, 0), t(23, 59, 59)), Freshness::Fresh);
    }
}
