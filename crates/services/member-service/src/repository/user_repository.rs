//! User repository with email lookup on top of the generic operations.

use tracing::debug;

use common::AppResult;
use domain::{Entity, User};

use super::entities;
use super::generic::EntityRepository;
use super::sea::SeaStore;
use super::store::EntityStore;

/// SeaORM store for the `users` table
pub type UserStore = SeaStore<entities::user::Entity, entities::user::ActiveModel, User>;

/// User repository.
///
/// Generic operations are reached through [`inner`](Self::inner).
pub struct UserRepository<S> {
    inner: EntityRepository<User, S>,
}

impl<S: EntityStore<User>> UserRepository<S> {
    pub fn new(store: S) -> Self {
        Self {
            inner: EntityRepository::new(store).named(User::NAME),
        }
    }

    /// The generic repository this one is built on
    pub fn inner(&self) -> &EntityRepository<User, S> {
        &self.inner
    }

    /// Find an active user by email, ignoring case.
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let email = email.trim().to_lowercase();
        debug!(email = %email, "Looking up user by email");

        let users = self.inner.find_active().await?;
        Ok(users
            .into_iter()
            .find(|user| user.email.to_lowercase() == email))
    }

    /// Active users holding the admin role
    pub async fn find_admins(&self) -> AppResult<Vec<User>> {
        let users = self.inner.find_active().await?;
        Ok(users.into_iter().filter(User::is_admin).collect())
    }
}
