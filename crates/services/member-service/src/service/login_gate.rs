//! Login gate - applies lockout rules around a credential check.

use std::future::Future;

use tracing::{debug, warn};

use common::{AppError, AppResult};

use crate::lockout::LoginAttemptRegistry;

/// Guards credential checks with per-identity lockout.
#[derive(Clone, Default)]
pub struct LoginGate {
    registry: LoginAttemptRegistry,
}

impl LoginGate {
    pub fn new(registry: LoginAttemptRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &LoginAttemptRegistry {
        &self.registry
    }

    /// Run `check` for `identity` unless it is locked out.
    ///
    /// `check` yields `Some(value)` for valid credentials and `None` for
    /// invalid ones. A failing `check` leaves the attempt count untouched.
    ///
    /// The attempt is reserved before `check` runs. While failures plus
    /// pending checks already reach the maximum, further attempts are
    /// refused with [`AppError::AccountLocked`] as well.
    pub async fn attempt<T, F, Fut>(&self, identity: &str, check: F) -> AppResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<Option<T>>>,
    {
        let tracker = self.registry.tracker(identity);

        let Some(reservation) = tracker.reserve() else {
            warn!(identity = %tracker.identity(), "Login refused, account locked");
            return Err(AppError::AccountLocked);
        };

        match check().await? {
            Some(value) => {
                reservation.succeed();
                debug!(identity = %tracker.identity(), "Login succeeded");
                Ok(value)
            }
            None if reservation.fail() => Err(AppError::AccountLocked),
            None => Err(AppError::InvalidCredentials),
        }
    }
}
