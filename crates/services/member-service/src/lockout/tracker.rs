//! Per-identity login attempt tracker.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use domain::{LockStatus, LockoutPolicy, LoginAttemptState};

use super::clock::{Clock, SystemClock};

/// Tracks consecutive failed logins for one identity.
///
/// Every operation runs under the tracker's own lock, so concurrent calls for
/// the same identity are serialized and none of them is lost.
pub struct LoginAttemptTracker {
    identity: String,
    policy: LockoutPolicy,
    clock: Arc<dyn Clock>,
    state: Mutex<LoginAttemptState>,
}

impl LoginAttemptTracker {
    /// Tracker with the default policy and the wall clock.
    pub fn new(identity: impl Into<String>) -> Self {
        Self::with_policy(identity, LockoutPolicy::default(), Arc::new(SystemClock))
    }

    pub fn with_policy(identity: impl Into<String>, policy: LockoutPolicy, clock: Arc<dyn Clock>) -> Self {
        let now = clock.now();
        Self {
            identity: identity.into(),
            policy,
            clock,
            state: Mutex::new(LoginAttemptState::new(now)),
        }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Forget all failures and any lockout, typically after a successful login.
    pub fn reset(&self) {
        let now = self.clock.now();
        self.state.lock().reset(now);
        debug!(identity = %self.identity, "Login attempts reset");
    }

    /// Record one failed login. Returns `true` when the identity is locked out.
    pub fn increment_failed_attempts(&self) -> bool {
        let now = self.clock.now();
        let mut state = self.state.lock();
        self.record_failure(&mut state, now)
    }

    /// Reserve one login attempt, or `None` when no attempt may run now.
    ///
    /// The lockout check and the reservation happen under one lock, and
    /// reservations count toward the failure maximum until settled. Concurrent
    /// callers therefore cannot run more credential checks than the maximum.
    pub fn reserve(&self) -> Option<AttemptReservation<'_>> {
        let now = self.clock.now();
        let granted = self.state.lock().reserve(&self.policy, now);

        if granted {
            Some(AttemptReservation {
                tracker: self,
                settled: false,
            })
        } else {
            debug!(identity = %self.identity, "Login attempt refused");
            None
        }
    }

    fn record_failure(&self, state: &mut LoginAttemptState, now: DateTime<Utc>) -> bool {
        let locked = state.record_failure(&self.policy, now);
        if locked {
            warn!(
                identity = %self.identity,
                failed_attempts = state.failed_attempts(),
                locked_until = ?state.locked_out_until(),
                "Account locked after repeated failed logins"
            );
        } else {
            debug!(
                identity = %self.identity,
                failed_attempts = state.failed_attempts(),
                "Failed login recorded"
            );
        }

        locked
    }

    /// Whether a lockout is in effect now.
    ///
    /// A lockout that has run out is cleared by this call, together with the
    /// failure count.
    pub fn is_locked(&self) -> bool {
        let now = self.clock.now();
        let status = self.state.lock().check(now);

        if status == LockStatus::Expired {
            info!(identity = %self.identity, "Lockout expired, attempts reset");
        }

        status.is_locked()
    }

    pub fn last_attempt(&self) -> DateTime<Utc> {
        self.state.lock().last_attempt()
    }

    pub fn failed_attempts(&self) -> u32 {
        self.state.lock().failed_attempts()
    }

    /// End of the current lockout, if one was set and has not been cleared
    pub fn locked_until(&self) -> Option<DateTime<Utc>> {
        self.state.lock().locked_out_until()
    }

    /// Unlocked, with no reserved attempt, and untouched for at least `idle`.
    pub(crate) fn is_idle(&self, idle: Duration) -> bool {
        let now = self.clock.now();
        let mut state = self.state.lock();

        !state.check(now).is_locked() && state.in_flight() == 0 && now - state.last_attempt() >= idle
    }
}

/// A reserved login attempt.
///
/// Settle it with [`succeed`](Self::succeed) or [`fail`](Self::fail).
/// Dropping it unsettled gives the reservation back without counting a
/// failure.
#[must_use = "an unsettled reservation is released without recording an outcome"]
pub struct AttemptReservation<'a> {
    tracker: &'a LoginAttemptTracker,
    settled: bool,
}

impl AttemptReservation<'_> {
    /// Credentials were valid: clear failures and any lockout.
    pub fn succeed(mut self) {
        self.settled = true;
        let now = self.tracker.clock.now();
        let mut state = self.tracker.state.lock();
        state.release();
        state.reset(now);
        debug!(identity = %self.tracker.identity, "Login attempts reset");
    }

    /// Credentials were invalid. Returns `true` when this failure locked the
    /// identity out.
    pub fn fail(mut self) -> bool {
        self.settled = true;
        let now = self.tracker.clock.now();
        let mut state = self.tracker.state.lock();
        state.release();
        self.tracker.record_failure(&mut state, now)
    }
}

impl Drop for AttemptReservation<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.tracker.state.lock().release();
        }
    }
}

impl std::fmt::Debug for LoginAttemptTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginAttemptTracker")
            .field("identity", &self.identity)
            .field("policy", &self.policy)
            .field("state", &*self.state.lock())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lockout::clock::ManualClock;

    fn tracker(clock: &Arc<ManualClock>) -> LoginAttemptTracker {
        LoginAttemptTracker::with_policy("ann@example.com", LockoutPolicy::default(), clock.clone())
    }

    #[test]
    fn test_last_attempt_follows_failures() {
        let clock = Arc::new(ManualClock::default());
        let tracker = tracker(&clock);
        let created = tracker.last_attempt();

        clock.advance(Duration::seconds(30));
        tracker.increment_failed_attempts();
        assert_eq!(tracker.last_attempt(), created + Duration::seconds(30));
    }

    #[test]
    fn test_reservation_settlement() {
        let clock = Arc::new(ManualClock::default());
        let tracker = tracker(&clock);

        let reservations: Vec<_> = (0..5).filter_map(|_| tracker.reserve()).collect();
        assert_eq!(reservations.len(), 5);
        assert!(tracker.reserve().is_none());
        assert!(!tracker.is_idle(Duration::zero()));

        let mut outcomes = reservations.into_iter();
        assert!(!outcomes.next().unwrap().fail());
        outcomes.next().unwrap().succeed();
        assert_eq!(tracker.failed_attempts(), 0);

        // the rest are dropped unsettled and counted as nothing
        drop(outcomes);
        assert_eq!(tracker.failed_attempts(), 0);
        assert!(tracker.reserve().is_some());
    }

    #[test]
    fn test_locked_tracker_is_never_idle() {
        let clock = Arc::new(ManualClock::default());
        let tracker = tracker(&clock);
        for _ in 0..5 {
            tracker.increment_failed_attempts();
        }

        assert!(!tracker.is_idle(Duration::zero()));

        clock.advance(Duration::minutes(15));
        assert!(tracker.is_idle(Duration::zero()));
    }
}
