//! Login attempt state machine.
//!
//! Counts consecutive failed logins for one identity and locks it out for a
//! fixed duration once the maximum is reached. Attempts whose outcome is not
//! known yet are reserved and count toward the maximum, so no more than
//! `max_failed_attempts` checks can be outstanding or failed at once. The
//! state is plain data; the caller supplies the current time and owns
//! synchronization.

use chrono::{DateTime, Duration, Utc};

use crate::constants::{LOCKOUT_DURATION_MINUTES, MAX_FAILED_LOGIN_ATTEMPTS};

/// Lockout rules applied to every tracked identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutPolicy {
    pub max_failed_attempts: u32,
    pub lockout_duration: Duration,
}

impl LockoutPolicy {
    pub fn new(max_failed_attempts: u32, lockout_duration: Duration) -> Self {
        Self {
            max_failed_attempts,
            lockout_duration,
        }
    }
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            max_failed_attempts: MAX_FAILED_LOGIN_ATTEMPTS,
            lockout_duration: Duration::minutes(LOCKOUT_DURATION_MINUTES),
        }
    }
}

/// Result of a lock check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockStatus {
    /// No lockout in effect
    Clear,
    /// Locked until the given instant
    Locked { until: DateTime<Utc> },
    /// A lockout had run out; the state was reset by this check
    Expired,
}

impl LockStatus {
    pub fn is_locked(&self) -> bool {
        matches!(self, LockStatus::Locked { .. })
    }
}

/// Failed-attempt counter and lockout for one identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginAttemptState {
    failed_attempts: u32,
    in_flight: u32,
    locked_out_until: Option<DateTime<Utc>>,
    last_attempt: DateTime<Utc>,
}

impl LoginAttemptState {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            failed_attempts: 0,
            in_flight: 0,
            locked_out_until: None,
            last_attempt: now,
        }
    }

    pub fn failed_attempts(&self) -> u32 {
        self.failed_attempts
    }

    pub fn locked_out_until(&self) -> Option<DateTime<Utc>> {
        self.locked_out_until
    }

    pub fn last_attempt(&self) -> DateTime<Utc> {
        self.last_attempt
    }

    /// Attempts reserved but not yet settled
    pub fn in_flight(&self) -> u32 {
        self.in_flight
    }

    /// Reserve one attempt at `now`.
    ///
    /// Refused while locked, or while recorded failures plus outstanding
    /// reservations already reach the maximum. A granted reservation must be
    /// settled with [`release`](Self::release) once its outcome is known.
    pub fn reserve(&mut self, policy: &LockoutPolicy, now: DateTime<Utc>) -> bool {
        if self.check(now).is_locked() {
            return false;
        }
        if self.failed_attempts.saturating_add(self.in_flight) >= policy.max_failed_attempts {
            return false;
        }

        self.in_flight += 1;
        self.last_attempt = now;
        true
    }

    /// Settle one reservation.
    pub fn release(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
    }

    /// Clear the counter and any lockout. Outstanding reservations are kept.
    pub fn reset(&mut self, now: DateTime<Utc>) {
        self.failed_attempts = 0;
        self.locked_out_until = None;
        self.last_attempt = now;
    }

    /// Record one failed attempt. Returns `true` when the identity is locked
    /// out after this failure.
    ///
    /// Every failure at or past the maximum pushes the lockout to
    /// `now + lockout_duration`.
    pub fn record_failure(&mut self, policy: &LockoutPolicy, now: DateTime<Utc>) -> bool {
        self.failed_attempts = self.failed_attempts.saturating_add(1);
        self.last_attempt = now;

        if self.failed_attempts >= policy.max_failed_attempts {
            self.locked_out_until = Some(now + policy.lockout_duration);
            return true;
        }

        false
    }

    /// Check the lockout at `now`, resetting the whole state if it has run out.
    pub fn check(&mut self, now: DateTime<Utc>) -> LockStatus {
        match self.locked_out_until {
            Some(until) if now < until => LockStatus::Locked { until },
            Some(_) => {
                self.reset(now);
                LockStatus::Expired
            }
            None => LockStatus::Clear,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> LockoutPolicy {
        LockoutPolicy::default()
    }

    #[test]
    fn test_default_policy() {
        let policy = policy();
        assert_eq!(policy.max_failed_attempts, 5);
        assert_eq!(policy.lockout_duration, Duration::minutes(15));
    }

    #[test]
    fn test_fifth_failure_locks() {
        let now = Utc::now();
        let mut state = LoginAttemptState::new(now);

        for _ in 0..4 {
            assert!(!state.record_failure(&policy(), now));
        }
        assert_eq!(state.check(now), LockStatus::Clear);

        assert!(state.record_failure(&policy(), now));
        assert_eq!(
            state.check(now),
            LockStatus::Locked {
                until: now + Duration::minutes(15)
            }
        );
    }

    #[test]
    fn test_expired_lockout_resets_on_check() {
        let start = Utc::now();
        let mut state = LoginAttemptState::new(start);
        for _ in 0..5 {
            state.record_failure(&policy(), start);
        }

        let later = start + Duration::minutes(15);
        assert_eq!(state.check(later), LockStatus::Expired);
        assert_eq!(state.failed_attempts(), 0);
        assert_eq!(state.locked_out_until(), None);
        assert_eq!(state.last_attempt(), later);
        assert_eq!(state.check(later), LockStatus::Clear);
    }

    #[test]
    fn test_reservations_count_toward_maximum() {
        let now = Utc::now();
        let mut state = LoginAttemptState::new(now);
        state.record_failure(&policy(), now);

        for _ in 0..4 {
            assert!(state.reserve(&policy(), now));
        }
        assert!(!state.reserve(&policy(), now));
        assert_eq!(state.in_flight(), 4);

        state.release();
        assert!(state.reserve(&policy(), now));
    }

    #[test]
    fn test_reserve_refused_while_locked() {
        let now = Utc::now();
        let mut state = LoginAttemptState::new(now);
        for _ in 0..5 {
            state.record_failure(&policy(), now);
        }

        assert!(!state.reserve(&policy(), now));
        assert_eq!(state.in_flight(), 0);
        assert!(state.reserve(&policy(), now + Duration::minutes(15)));
    }

    #[test]
    fn test_reset_restarts_count() {
        let now = Utc::now();
        let mut state = LoginAttemptState::new(now);
        for _ in 0..5 {
            state.record_failure(&policy(), now);
        }

        state.reset(now);
        assert!(!state.check(now).is_locked());
        assert!(!state.record_failure(&policy(), now));
        assert_eq!(state.failed_attempts(), 1);
    }
}
