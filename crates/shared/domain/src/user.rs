//! User domain entity and related types.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{ROLE_ADMIN, ROLE_MEMBER};
use crate::entity::{AuditFields, Entity};
use crate::fields::FieldTable;

/// User roles enumeration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    Member,
    Admin,
}

impl UserRole {
    /// Check if this role has admin privileges
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }
}

impl From<&str> for UserRole {
    fn from(s: &str) -> Self {
        match s {
            ROLE_ADMIN => UserRole::Admin,
            _ => UserRole::Member,
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::Admin => write!(f, "{}", ROLE_ADMIN),
            UserRole::Member => write!(f, "{}", ROLE_MEMBER),
        }
    }
}

/// Personal details shared by people-like records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
}

impl Person {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

static PERSON_FIELDS: Lazy<FieldTable<Person>> = Lazy::new(|| {
    FieldTable::builder()
        .field("first_name", |p: &mut Person, v: String| p.first_name = v)
        .field("last_name", |p: &mut Person, v: String| p.last_name = v)
        .field("phone", |p: &mut Person, v: Option<String>| p.phone = v)
        .build()
});

static USER_FIELDS: Lazy<FieldTable<User>> = Lazy::new(|| {
    FieldTable::builder()
        .field("email", |u: &mut User, v: String| u.email = v)
        .field("role", |u: &mut User, v: UserRole| u.role = v)
        .field("email_verified", |u: &mut User, v: bool| u.email_verified = v)
        .parent(&*PERSON_FIELDS, person_mut)
        .build()
});

fn person_mut(user: &mut User) -> &mut Person {
    &mut user.person
}

/// Membership account
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct User {
    pub(crate) id: Option<Uuid>,
    pub email: String,
    #[serde(flatten)]
    pub person: Person,
    pub role: UserRole,
    pub email_verified: bool,
    #[serde(flatten)]
    pub(crate) audit: AuditFields,
}

crate::impl_entity_identity!(User);

impl User {
    /// Create a new, not yet persisted member
    pub fn new(email: impl Into<String>, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            person: Person {
                first_name: first_name.into(),
                last_name: last_name.into(),
                phone: None,
            },
            ..Self::default()
        }
    }

    /// Rebuild a user from stored state
    pub fn from_stored(
        id: Uuid,
        email: String,
        person: Person,
        role: UserRole,
        email_verified: bool,
        audit: AuditFields,
    ) -> Self {
        Self {
            id: Some(id),
            email,
            person,
            role,
            email_verified,
            audit,
        }
    }

    /// Check if user has admin role
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

impl Entity for User {
    type Id = Uuid;

    const NAME: &'static str = "User";

    fn id(&self) -> Option<&Uuid> {
        self.id.as_ref()
    }

    fn assign_id(&mut self, id: Uuid) {
        self.id = Some(id);
    }

    fn audit(&self) -> &AuditFields {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut AuditFields {
        &mut self.audit
    }

    fn field_table() -> &'static FieldTable<Self> {
        &USER_FIELDS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DomainError;
    use serde_json::json;

    #[test]
    fn test_user_fields_include_person() {
        let mut user = User::new("ada@example.com", "Ada", "Lovelace");
        let data = json!({
            "first_name": "Augusta",
            "role": "admin",
            "phone": "+44 20 7946 0000",
            "nickname": "countess"
        });

        let patch = User::field_table()
            .apply(&mut user, data.as_object().unwrap())
            .unwrap();

        assert_eq!(user.person.first_name, "Augusta");
        assert_eq!(user.person.phone.as_deref(), Some("+44 20 7946 0000"));
        assert!(user.is_admin());
        assert_eq!(patch.skipped, vec!["nickname".to_string()]);
    }

    #[test]
    fn test_audit_fields_are_not_patchable() {
        let mut user = User::default();
        let data = json!({"id": "3f0f1f3c-8c4c-4a51-9f7d-2b7e0f1b9b11", "deleted_at": "2024-01-01T00:00:00Z"});

        let patch = User::field_table()
            .apply(&mut user, data.as_object().unwrap())
            .unwrap();

        assert!(user.id().is_none());
        assert!(user.is_active());
        assert_eq!(patch.skipped.len(), 2);
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let mut user = User::default();
        let data = json!({"role": "superuser"});

        let err = User::field_table()
            .apply(&mut user, data.as_object().unwrap())
            .unwrap_err();

        assert!(matches!(err, DomainError::Field { ref field, .. } if field == "role"));
        assert_eq!(user.role, UserRole::Member);
    }

    #[test]
    fn test_full_name() {
        let user = User::new("a@example.com", "Ada", "");
        assert_eq!(user.person.full_name(), "Ada");
    }
}
