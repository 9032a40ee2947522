//! Concurrent registry of login attempt trackers keyed by identity.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, info};

use common::LockoutConfig;
use domain::LockoutPolicy;

use super::clock::{Clock, SystemClock};
use super::tracker::LoginAttemptTracker;

/// Hands out one shared tracker per identity.
///
/// Identities are normalized (trimmed, lowercased) so `Ann@Example.com` and
/// `ann@example.com` share a tracker. Cloning the registry shares the map.
#[derive(Clone)]
pub struct LoginAttemptRegistry {
    trackers: Arc<DashMap<String, Arc<LoginAttemptTracker>>>,
    policy: LockoutPolicy,
    clock: Arc<dyn Clock>,
    idle_eviction: chrono::Duration,
}

impl LoginAttemptRegistry {
    pub fn new(policy: LockoutPolicy) -> Self {
        Self::with_clock(policy, Arc::new(SystemClock))
    }

    pub fn with_clock(policy: LockoutPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            trackers: Arc::new(DashMap::new()),
            policy,
            clock,
            idle_eviction: LockoutConfig::default().idle_eviction(),
        }
    }

    pub fn from_config(config: &LockoutConfig) -> Self {
        let mut registry = Self::new(config.policy());
        registry.idle_eviction = config.idle_eviction();
        registry
    }

    pub fn policy(&self) -> &LockoutPolicy {
        &self.policy
    }

    /// Tracker for `identity`, created on first use.
    pub fn tracker(&self, identity: &str) -> Arc<LoginAttemptTracker> {
        let key = normalize(identity);

        self.trackers
            .entry(key.clone())
            .or_insert_with(|| {
                debug!(identity = %key, "Tracking login attempts");
                Arc::new(LoginAttemptTracker::with_policy(
                    key.clone(),
                    self.policy,
                    self.clock.clone(),
                ))
            })
            .value()
            .clone()
    }

    /// Existing tracker for `identity`, without creating one
    pub fn get(&self, identity: &str) -> Option<Arc<LoginAttemptTracker>> {
        self.trackers
            .get(&normalize(identity))
            .map(|entry| entry.value().clone())
    }

    pub fn remove(&self, identity: &str) -> bool {
        self.trackers.remove(&normalize(identity)).is_some()
    }

    pub fn len(&self) -> usize {
        self.trackers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trackers.is_empty()
    }

    /// Drop trackers that are unlocked and idle for the configured window.
    /// Returns how many were dropped.
    ///
    /// An evicted identity starts over from zero failures, so failure counts
    /// below the maximum are forgotten once they sit idle for the window.
    /// Trackers still held outside the registry (for example by a login in
    /// progress) are kept, so no failure is recorded on a tracker the
    /// registry no longer hands out.
    pub fn evict_idle(&self) -> usize {
        let before = self.trackers.len();
        self.trackers.retain(|_, tracker| {
            Arc::strong_count(tracker) > 1 || !tracker.is_idle(self.idle_eviction)
        });

        let evicted = before.saturating_sub(self.trackers.len());
        if evicted > 0 {
            info!(evicted, remaining = self.trackers.len(), "Evicted idle login trackers");
        }
        evicted
    }
}

impl Default for LoginAttemptRegistry {
    fn default() -> Self {
        Self::new(LockoutPolicy::default())
    }
}

fn normalize(identity: &str) -> String {
    identity.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lockout::clock::ManualClock;
    use chrono::Duration;

    #[test]
    fn test_identities_are_normalized() {
        let registry = LoginAttemptRegistry::default();
        let a = registry.tracker(" Ann@Example.com");
        let b = registry.tracker("ann@example.com");

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.identity(), "ann@example.com");
        assert_eq!(registry.len(), 1);
        assert!(registry.get("ANN@EXAMPLE.COM").is_some());
        assert!(registry.remove("ann@example.com "));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_evict_idle_forgets_counts_but_keeps_held_trackers() {
        let clock = Arc::new(ManualClock::default());
        let registry = LoginAttemptRegistry::with_clock(LockoutPolicy::default(), clock.clone());

        registry.tracker("forgotten@example.com").increment_failed_attempts();
        let held = registry.tracker("held@example.com");
        held.increment_failed_attempts();

        clock.advance(Duration::minutes(61));
        assert_eq!(registry.evict_idle(), 1);

        assert_eq!(registry.tracker("forgotten@example.com").failed_attempts(), 0);
        assert!(Arc::ptr_eq(&held, &registry.tracker("held@example.com")));
        assert_eq!(held.failed_attempts(), 1);
    }

    #[test]
    fn test_evict_idle_keeps_locked_and_recent() {
        let clock = Arc::new(ManualClock::default());
        let registry = LoginAttemptRegistry::with_clock(LockoutPolicy::default(), clock.clone());

        registry.tracker("idle@example.com");
        let locked = registry.tracker("locked@example.com");
        for _ in 0..5 {
            locked.increment_failed_attempts();
        }

        drop(locked);

        clock.advance(Duration::minutes(14));
        registry.tracker("recent@example.com");
        clock.advance(Duration::minutes(50));

        // the lockout ran out 49 minutes ago; the reset by check restarts its idle window
        assert_eq!(registry.evict_idle(), 1);
        assert!(registry.get("idle@example.com").is_none());
        assert!(registry.get("locked@example.com").is_some());
        assert!(registry.get("recent@example.com").is_some());
    }
}
