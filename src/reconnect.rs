//! Reconnect pacing.
//!
//! [`Backoff`] paces socket reopen attempts. It is measured in session
//! iterations rather than wall time: after the n-th consecutive failure the
//! session sits out `min(2^(n-1), cap)` iterations before trying again. A
//! cap of zero retries on every iteration.
//!
//! [`StationWatch`] paces WiFi re-association once the station drops off
//! the access point.
//!
//! # Example
//!
//! ```rust
//! use garage_link::reconnect::Backoff;
//!
//! let mut backoff = Backoff::new(4);
//! assert!(backoff.should_attempt());
//!
//! backoff.record_failure();            // skip 1
//! assert!(!backoff.should_attempt());
//! assert!(backoff.should_attempt());
//!
//! backoff.record_failure();            // skip 2
//! assert!(!backoff.should_attempt());
//! assert!(!backoff.should_attempt());
//! assert!(backoff.should_attempt());
//!
//! backoff.record_success();
//! assert_eq!(backoff.failures(), 0);
//! ```

/// Reopen pacing state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Backoff {
    max_skip: u32,
    failures: u32,
    skip_remaining: u32,
}

impl Backoff {
    /// Creates a backoff that never skips more than `max_skip` iterations.
    pub const fn new(max_skip: u32) -> Self {
        Self {
            max_skip,
            failures: 0,
            skip_remaining: 0,
        }
    }

    /// Consumes one iteration; returns true if an attempt may be made now.
    pub fn should_attempt(&mut self) -> bool {
        if self.skip_remaining > 0 {
            self.skip_remaining -= 1;
            false
        } else {
            true
        }
    }

    /// Records a failed attempt and schedules the next one.
    pub fn record_failure(&mut self) {
        self.failures = self.failures.saturating_add(1);
        let gap = 1u32
            .checked_shl(self.failures - 1)
            .unwrap_or(u32::MAX);
        self.skip_remaining = gap.min(self.max_skip);
    }

    /// Records a successful attempt.
    pub fn record_success(&mut self) {
        self.failures = 0;
        self.skip_remaining = 0;
    }

    /// Consecutive failures since the last success.
    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Iterations left before the next attempt.
    pub fn skip_remaining(&self) -> u32 {
        self.skip_remaining
    }
}

// ============================================================================
// Station Watch
// ============================================================================

/// What a transport should do after sampling its station link.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StationAction {
    /// Nothing changed.
    Steady,
    /// The link just dropped; report it and start re-associating.
    Lost,
    /// Still down and the retry interval has passed; re-associate again.
    Rejoin,
    /// The link is back.
    Regained,
}

/// Tracks station association and rate-limits re-association attempts.
///
/// Inactive until [`joined`](Self::joined) is first called, so a radio
/// that never came up is left to the startup path.
///
/// # Example
///
/// ```rust
/// use garage_link::reconnect::{StationAction, StationWatch};
///
/// let mut watch = StationWatch::new(5000);
/// watch.joined();
/// assert_eq!(watch.observe(false, 100), StationAction::Lost);
/// assert_eq!(watch.observe(false, 2000), StationAction::Steady);
/// assert_eq!(watch.observe(false, 5100), StationAction::Rejoin);
/// assert_eq!(watch.observe(true, 6000), StationAction::Regained);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StationWatch {
    rejoin_interval_ms: u64,
    armed: bool,
    associated: bool,
    last_attempt_ms: u64,
}

impl StationWatch {
    /// Creates an inactive watch.
    pub const fn new(rejoin_interval_ms: u64) -> Self {
        Self {
            rejoin_interval_ms,
            armed: false,
            associated: false,
            last_attempt_ms: 0,
        }
    }

    /// Marks the station associated and starts watching.
    pub fn joined(&mut self) {
        self.armed = true;
        self.associated = true;
    }

    /// Returns true while the station is believed associated.
    pub fn is_associated(&self) -> bool {
        self.associated
    }

    /// Feeds one sample of the link state taken at `now_ms`.
    pub fn observe(&mut self, up: bool, now_ms: u64) -> StationAction {
        if !self.armed {
            return StationAction::Steady;
        }
        match (self.associated, up) {
            (true, true) => StationAction::Steady,
            (false, true) => {
                self.associated = true;
                StationAction::Regained
            }
            (true, false) => {
                self.associated = false;
                self.last_attempt_ms = now_ms;
                StationAction::Lost
            }
            (false, false) => {
                if now_ms.saturating_sub(self.last_attempt_ms) >= self.rejoin_interval_ms {
                    self.last_attempt_ms = now_ms;
                    StationAction::Rejoin
                } else {
                    StationAction::Steady
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skipped_before_next_attempt(backoff: &mut Backoff) -> u32 {
        let mut skipped = 0;
        while !backoff.should_attempt() {
            skipped += 1;
        }
        skipped
    }

    #[test]
    fn fresh_backoff_attempts_immediately() {
        let mut backoff = Backoff::new(64);
        assert!(backoff.should_attempt());
        assert!(backoff.should_attempt());
    }

    #[test]
    fn gaps_double_until_cap() {
        let mut backoff = Backoff::new(8);
        let mut gaps = Vec::new();
        for _ in 0..6 {
            backoff.record_failure();
            gaps.push(skipped_before_next_attempt(&mut backoff));
        }
        assert_eq!(gaps, vec![1, 2, 4, 8, 8, 8]);
    }

    #[test]
    fn zero_cap_retries_every_iteration() {
        let mut backoff = Backoff::new(0);
        for _ in 0..5 {
            backoff.record_failure();
            assert!(backoff.should_attempt());
        }
        assert_eq!(backoff.failures(), 5);
    }

    #[test]
    fn success_resets() {
        let mut backoff = Backoff::new(16);
        backoff.record_failure();
        backoff.record_failure();
        backoff.record_success();
        assert_eq!(backoff.failures(), 0);
        assert_eq!(backoff.skip_remaining(), 0);
        assert!(backoff.should_attempt());
    }

    #[test]
    fn many_failures_do_not_overflow() {
        let mut backoff = Backoff::new(u32::MAX);
        for _ in 0..40 {
            backoff.record_failure();
        }
        assert_eq!(backoff.skip_remaining(), u32::MAX);
    }

    #[test]
    fn station_watch_ignores_samples_before_first_join() {
        let mut watch = StationWatch::new(1000);
        assert_eq!(watch.observe(false, 0), StationAction::Steady);
        assert_eq!(watch.observe(true, 10), StationAction::Steady);
        assert!(!watch.is_associated());
    }

    #[test]
    fn station_drop_rejoins_at_interval_until_back() {
        let mut watch = StationWatch::new(1000);
        watch.joined();
        assert_eq!(watch.observe(true, 0), StationAction::Steady);

        let actions: Vec<_> = [100, 500, 1099, 1100, 1500, 2100]
            .iter()
            .map(|&t| watch.observe(false, t))
            .collect();
        assert_eq!(
            actions,
            vec![
                StationAction::Lost,
                StationAction::Steady,
                StationAction::Steady,
                StationAction::Rejoin,
                StationAction::Steady,
                StationAction::Rejoin,
            ]
        );

        assert_eq!(watch.observe(true, 2200), StationAction::Regained);
        assert!(watch.is_associated());
        assert_eq!(watch.observe(false, 2300), StationAction::Lost);
    }
}
