//! Domain layer - Core membership entities and value objects.
//!
//! This crate contains pure domain logic with no infrastructure dependencies:
//! the [`Entity`] abstraction every persisted record implements, the field
//! tables used to patch entities from loosely typed data, the concrete
//! membership records and the login attempt state machine.

pub mod booking;
pub mod constants;
pub mod email;
pub mod entity;
pub mod error;
pub mod fields;
pub mod login_attempt;
pub mod user;

pub use booking::Booking;
pub use constants::*;
pub use email::Email;
pub use entity::{same_identity, AuditFields, Entity, EntityId};
pub use error::{DomainError, DomainResult};
pub use fields::{FieldMap, FieldPatch, FieldTable, FieldTableBuilder};
pub use login_attempt::{LockStatus, LockoutPolicy, LoginAttemptState};
pub use user::{Person, User, UserRole};
