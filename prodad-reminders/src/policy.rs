//! Due-window policy: the pure decision behind scheduling.
//!
//! For a non-completed reminder with `Δ = reminderTime - now`:
//!
//! - `0 < Δ < horizon` (24 h): schedule a timer for `Δ`
//! - `-catch_up ≤ Δ ≤ 0` (1 h) and not yet delivered: fire immediately
//! - anything else: leave alone until a later evaluation brings it into
//!   one of the windows

use std::time::Duration;

/// What to do with one reminder right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueAction {
    /// Set an in-process timer for this long.
    Schedule { delay: Duration },
    /// Recently missed and undelivered: fire the notification now.
    FireNow,
    /// Far future, long overdue, or already delivered.
    Leave,
}

/// The evaluation windows. Defaults match the app: schedule anything due
/// within 24 hours, catch up on anything missed within the last hour.
#[derive(Debug, Clone, Copy)]
pub struct DuePolicy {
    pub schedule_horizon_ms: i64,
    pub catch_up_window_ms: i64,
}

impl Default for DuePolicy {
    fn default() -> Self {
        Self {
            schedule_horizon_ms: 24 * 60 * 60 * 1000,
            catch_up_window_ms: 60 * 60 * 1000,
        }
    }
}

impl DuePolicy {
    /// Decide for a single reminder. `delta_ms` is due time minus now;
    /// `delivered` is the tracker row's flag (false when no row exists).
    pub fn decide(&self, delta_ms: i64, delivered: bool) -> DueAction {
        if delta_ms > 0 && delta_ms < self.schedule_horizon_ms {
            return DueAction::Schedule {
                delay: Duration::from_millis(delta_ms as u64),
            };
        }
        if delta_ms <= 0 && delta_ms >= -self.catch_up_window_ms && !delivered {
            return DueAction::FireNow;
        }
        DueAction::Leave
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: i64 = 60 * 60 * 1000;

    #[test]
    fn future_within_horizon_is_scheduled() {
        let policy = DuePolicy::default();
        assert_eq!(
            policy.decide(30 * 60 * 1000, false),
            DueAction::Schedule {
                delay: Duration::from_millis(30 * 60 * 1000)
            }
        );
    }

    #[test]
    fn far_future_is_left() {
        let policy = DuePolicy::default();
        assert_eq!(policy.decide(24 * HOUR, false), DueAction::Leave);
        assert_eq!(policy.decide(48 * HOUR, false), DueAction::Leave);
    }

    #[test]
    fn recently_missed_fires_once() {
        let policy = DuePolicy::default();
        assert_eq!(policy.decide(-10 * 60 * 1000, false), DueAction::FireNow);
        // Exactly due counts as missed, not scheduled
        assert_eq!(policy.decide(0, false), DueAction::FireNow);
        // Already delivered: nothing to do
        assert_eq!(policy.decide(-10 * 60 * 1000, true), DueAction::Leave);
    }

    #[test]
    fn long_overdue_is_left() {
        let policy = DuePolicy::default();
        assert_eq!(policy.decide(-2 * HOUR, false), DueAction::Leave);
    }

    #[test]
    fn window_edges() {
        let policy = DuePolicy::default();
        // Horizon is exclusive
        assert_eq!(policy.decide(policy.schedule_horizon_ms, false), DueAction::Leave);
        assert!(matches!(
            policy.decide(policy.schedule_horizon_ms - 1, false),
            DueAction::Schedule { .. }
        ));
        // Catch-up bound is inclusive
        assert_eq!(
            policy.decide(-policy.catch_up_window_ms, false),
            DueAction::FireNow
        );
        assert_eq!(
            policy.decide(-policy.catch_up_window_ms - 1, false),
            DueAction::Leave
        );
    }
}
