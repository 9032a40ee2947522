//! Repository layer for data access.

mod booking_repository;
mod email_repository;
pub mod entities;
mod generic;
mod memory;
mod sea;
mod store;
mod user_repository;

pub use booking_repository::{BookingRepository, BookingStore};
pub use email_repository::{EmailRepository, EmailStore};
pub use generic::EntityRepository;
pub use memory::InMemoryStore;
pub use sea::SeaStore;
pub use store::{EntityStore, StoreError, StoreResult};
pub use user_repository::{UserRepository, UserStore};

#[cfg(any(test, feature = "test-utils"))]
pub use store::MockEntityStore;
