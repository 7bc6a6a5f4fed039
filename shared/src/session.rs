//! Idle-session tracking for one calendar viewing session.
//!
//! Maintains a 15-minute idle budget and surfaces a warning for the final
//! minute before expiry. Every tracked interaction resets the full budget,
//! so the reset path must stay cheap and idempotent. What happens after
//! expiry (ending the session) belongs to the surrounding app.

use chrono::{DateTime, Duration, Utc};

/// Idle budget configuration
#[derive(Debug, Clone, PartialEq)]
pub struct SessionTimeoutConfig {
    pub idle_budget: Duration,
    /// How long before expiry the warning appears
    pub warning_lead: Duration,
}

impl Default for SessionTimeoutConfig {
    fn default() -> Self {
        Self {
            idle_budget: Duration::minutes(15),
            warning_lead: Duration::minutes(1),
        }
    }
}

/// Where the session currently sits in its idle budget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Active,
    Warning,
    Expired,
}

/// Idle-timer state machine. The clock is always passed in, never read,
/// so tests run against fixed timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionTracker {
    last_activity: DateTime<Utc>,
    warning_shown: bool,
    config: SessionTimeoutConfig,
}

impl SessionTracker {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self::with_config(now, SessionTimeoutConfig::default())
    }

    pub fn with_config(now: DateTime<Utc>, config: SessionTimeoutConfig) -> Self {
        Self {
            last_activity: now,
            warning_shown: false,
            config,
        }
    }

    /// Record a tracked interaction, restoring the full idle budget and
    /// clearing any pending warning
    pub fn record_activity(&mut self, now: DateTime<Utc>) {
        self.last_activity = now;
        self.warning_shown = false;
    }

    /// Report the current phase, updating the warning flag as a side effect.
    /// The flag is true only between the warning mark and a reset or expiry.
    pub fn phase(&mut self, now: DateTime<Utc>) -> SessionPhase {
        let idle = now - self.last_activity;
        if idle >= self.config.idle_budget {
            self.warning_shown = false;
            SessionPhase::Expired
        } else if idle >= self.config.idle_budget - self.config.warning_lead {
            self.warning_shown = true;
            SessionPhase::Warning
        } else {
            SessionPhase::Active
        }
    }

    pub fn warning_shown(&self) -> bool {
        self.warning_shown
    }

    /// Instant the warning becomes visible, given no further activity
    pub fn warning_deadline(&self) -> DateTime<Utc> {
        self.last_activity + (self.config.idle_budget - self.config.warning_lead)
    }

    /// Instant the idle budget runs out, given no further activity
    pub fn expiry_deadline(&self) -> DateTime<Utc> {
        self.last_activity + self.config.idle_budget
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(minutes: i64, seconds: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 10, 0, 0).unwrap()
            + Duration::minutes(minutes)
            + Duration::seconds(seconds)
    }

    #[test]
    fn test_active_until_fourteen_minutes() {
        let mut tracker = SessionTracker::new(at(0, 0));

        assert_eq!(tracker.phase(at(0, 1)), SessionPhase::Active);
        assert_eq!(tracker.phase(at(13, 59)), SessionPhase::Active);
        assert!(!tracker.warning_shown());

        // Exactly at the 14-minute mark the warning appears
        assert_eq!(tracker.phase(at(14, 0)), SessionPhase::Warning);
        assert!(tracker.warning_shown());
    }

    #[test]
    fn test_expires_at_fifteen_minutes() {
        let mut tracker = SessionTracker::new(at(0, 0));

        assert_eq!(tracker.phase(at(14, 59)), SessionPhase::Warning);
        assert_eq!(tracker.phase(at(15, 0)), SessionPhase::Expired);
        // Warning window is closed once the session has expired
        assert!(!tracker.warning_shown());
    }

    #[test]
    fn test_activity_resets_full_budget() {
        let mut tracker = SessionTracker::new(at(0, 0));

        assert_eq!(tracker.phase(at(14, 30)), SessionPhase::Warning);
        tracker.record_activity(at(14, 30));
        assert!(!tracker.warning_shown());

        // The clock starts over from the reset, not from session start
        assert_eq!(tracker.phase(at(28, 0)), SessionPhase::Active);
        assert_eq!(tracker.phase(at(28, 30)), SessionPhase::Warning);
        assert_eq!(tracker.phase(at(29, 30)), SessionPhase::Expired);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut tracker = SessionTracker::new(at(0, 0));

        tracker.record_activity(at(5, 0));
        tracker.record_activity(at(5, 0));
        tracker.record_activity(at(5, 0));

        assert_eq!(tracker.phase(at(18, 59)), SessionPhase::Active);
        assert_eq!(tracker.phase(at(19, 0)), SessionPhase::Warning);
    }

    #[test]
    fn test_deadlines_follow_last_activity() {
        let mut tracker = SessionTracker::new(at(0, 0));
        assert_eq!(tracker.warning_deadline(), at(14, 0));
        assert_eq!(tracker.expiry_deadline(), at(15, 0));

        tracker.record_activity(at(3, 0));
        assert_eq!(tracker.warning_deadline(), at(17, 0));
        assert_eq!(tracker.expiry_deadline(), at(18, 0));
    }

    #[test]
    fn test_custom_budget() {
        let config = SessionTimeoutConfig {
            idle_budget: Duration::minutes(5),
            warning_lead: Duration::seconds(30),
        };
        let mut tracker = SessionTracker::with_config(at(0, 0), config);

        assert_eq!(tracker.phase(at(4, 29)), SessionPhase::Active);
        assert_eq!(tracker.phase(at(4, 30)), SessionPhase::Warning);
        assert_eq!(tracker.phase(at(5, 0)), SessionPhase::Expired);
    }
}
