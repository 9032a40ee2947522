//! Entity abstraction shared by every persisted domain record.
//!
//! An entity is identified by an opaque id assigned on first persistence and
//! carries audit timestamps. Soft delete is expressed through `deleted_at`:
//! an entity is active while it is absent and deleted once it is set.

use std::fmt::{Debug, Display};
use std::hash::Hash;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::DEFAULT_ENTITY_NAME;
use crate::error::{DomainError, DomainResult};
use crate::fields::FieldTable;

/// Identifier type usable as an entity primary key.
pub trait EntityId: Clone + Debug + Display + Eq + Hash + Send + Sync + 'static {
    /// Generate a fresh identifier for a row about to be inserted.
    fn generate() -> Self;
}

impl EntityId for Uuid {
    fn generate() -> Self {
        Uuid::new_v4()
    }
}

/// Audit timestamps carried by every entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditFields {
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    /// Soft delete timestamp (None = active, Some = deleted)
    deleted_at: Option<DateTime<Utc>>,
}

impl AuditFields {
    /// Rebuild audit fields from a stored row.
    pub fn from_parts(
        created_at: Option<DateTime<Utc>>,
        updated_at: Option<DateTime<Utc>>,
        deleted_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            created_at,
            updated_at,
            deleted_at,
        }
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    /// Stamp a save: first persistence sets `created_at`, later ones `updated_at`.
    pub fn mark_saved(&mut self, now: DateTime<Utc>) {
        match self.created_at {
            None => self.created_at = Some(now),
            Some(_) => self.updated_at = Some(now),
        }
    }

    /// Carry over the lifecycle timestamps of the row being replaced.
    pub fn inherit_lifecycle(&mut self, stored: &AuditFields) {
        self.created_at = stored.created_at;
        self.deleted_at = stored.deleted_at;
    }

    fn mark_deleted(&mut self, now: DateTime<Utc>) -> bool {
        if self.deleted_at.is_some() {
            return false;
        }
        self.deleted_at = Some(now);
        self.updated_at = Some(now);
        true
    }

    fn mark_restored(&mut self, now: DateTime<Utc>) -> bool {
        if self.deleted_at.is_none() {
            return false;
        }
        self.deleted_at = None;
        self.updated_at = Some(now);
        true
    }
}

/// A persisted domain record.
///
/// Implementors supply identity, audit fields, a zero-argument constructor
/// (`Default`) and the field table used for dynamic patching. Lifecycle
/// helpers are provided on top of those.
pub trait Entity: Clone + Debug + Default + Send + Sync + 'static {
    type Id: EntityId;

    /// Human-readable label used in logs and error messages.
    const NAME: &'static str = DEFAULT_ENTITY_NAME;

    fn id(&self) -> Option<&Self::Id>;

    /// Assign the identifier. Only stores and repositories call this.
    fn assign_id(&mut self, id: Self::Id);

    fn audit(&self) -> &AuditFields;

    fn audit_mut(&mut self) -> &mut AuditFields;

    /// Setter table used by dynamic creation and patching.
    fn field_table() -> &'static FieldTable<Self>;

    /// Check if the entity is active (not deleted)
    fn is_active(&self) -> bool {
        self.audit().deleted_at().is_none()
    }

    /// Check if the entity is soft deleted
    fn is_deleted(&self) -> bool {
        self.audit().deleted_at().is_some()
    }

    /// Soft delete the entity. Deleting a deleted entity is a contract violation.
    fn soft_delete(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        if self.audit_mut().mark_deleted(now) {
            Ok(())
        } else {
            Err(DomainError::invalid_state(format!(
                "{} {} is already deleted",
                Self::NAME,
                describe_id(self.id())
            )))
        }
    }

    /// Restore a soft-deleted entity. Restoring an active entity is a contract violation.
    fn restore(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        if self.audit_mut().mark_restored(now) {
            Ok(())
        } else {
            Err(DomainError::invalid_state(format!(
                "{} {} is not deleted",
                Self::NAME,
                describe_id(self.id())
            )))
        }
    }

    /// Fill in store-assigned state before a write.
    fn prepare_for_save(&mut self, now: DateTime<Utc>) {
        if self.id().is_none() {
            self.assign_id(Self::Id::generate());
        }
        self.audit_mut().mark_saved(now);
    }
}

/// Identity equality: same non-absent id, or the very same instance.
pub fn same_identity<E: Entity>(a: &E, b: &E) -> bool {
    match (a.id(), b.id()) {
        (Some(left), Some(right)) => left == right,
        _ => std::ptr::eq(a, b),
    }
}

fn describe_id<I: Display>(id: Option<&I>) -> String {
    id.map(ToString::to_string)
        .unwrap_or_else(|| "<unsaved>".to_string())
}

/// Implement `PartialEq`/`Eq` for an entity through [`same_identity`].
#[macro_export]
macro_rules! impl_entity_identity {
    ($entity:ty) => {
        impl PartialEq for $entity {
            fn eq(&self, other: &Self) -> bool {
                $crate::entity::same_identity(self, other)
            }
        }

        impl Eq for $entity {}
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::User;
    use chrono::Duration;

    #[test]
    fn test_prepare_for_save_assigns_id_and_created_at_once() {
        let mut user = User::default();
        let first = Utc::now();
        user.prepare_for_save(first);

        let id = user.id().cloned();
        assert!(id.is_some());
        assert_eq!(user.audit().created_at(), Some(first));
        assert_eq!(user.audit().updated_at(), None);

        let second = first + Duration::seconds(5);
        user.prepare_for_save(second);
        assert_eq!(user.id().cloned(), id);
        assert_eq!(user.audit().created_at(), Some(first));
        assert_eq!(user.audit().updated_at(), Some(second));
    }

    #[test]
    fn test_soft_delete_twice_is_rejected() {
        let mut user = User::default();
        user.prepare_for_save(Utc::now());

        user.soft_delete(Utc::now()).unwrap();
        assert!(user.is_deleted());

        let err = user.soft_delete(Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));
    }

    #[test]
    fn test_restore_active_is_rejected() {
        let mut user = User::default();
        let err = user.restore(Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));

        user.soft_delete(Utc::now()).unwrap();
        user.restore(Utc::now()).unwrap();
        assert!(user.is_active());
    }

    #[test]
    fn test_identity_equality() {
        let mut a = User::default();
        let mut b = User::default();

        // Unsaved entities are only equal to themselves
        assert_eq!(a, a);
        assert_ne!(a, b);

        let id = Uuid::new_v4();
        a.assign_id(id);
        b.assign_id(id);
        b.email = "other@example.com".to_string();
        assert_eq!(a, b);

        b.assign_id(Uuid::new_v4());
        assert_ne!(a, b);
    }
}
