//! Booking repository.

use uuid::Uuid;

use common::AppResult;
use domain::{Booking, Entity};

use super::entities;
use super::generic::EntityRepository;
use super::sea::SeaStore;
use super::store::EntityStore;

/// SeaORM store for the `bookings` table
pub type BookingStore = SeaStore<entities::booking::Entity, entities::booking::ActiveModel, Booking>;

pub struct BookingRepository<S> {
    inner: EntityRepository<Booking, S>,
}

impl<S: EntityStore<Booking>> BookingRepository<S> {
    pub fn new(store: S) -> Self {
        Self {
            inner: EntityRepository::new(store).named(Booking::NAME),
        }
    }

    /// The generic repository this one is built on
    pub fn inner(&self) -> &EntityRepository<Booking, S> {
        &self.inner
    }

    /// Active bookings held by a member, earliest start first.
    pub async fn find_active_for_member(&self, member_id: Uuid) -> AppResult<Vec<Booking>> {
        let mut bookings: Vec<Booking> = self
            .inner
            .find_active()
            .await?
            .into_iter()
            .filter(|booking| booking.belongs_to(member_id))
            .collect();

        bookings.sort_by_key(|booking| booking.starts_at);
        Ok(bookings)
    }
}
