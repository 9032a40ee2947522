//! User database entity for SeaORM.

use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue::{NotSet, Set};

use domain::{AuditFields, Entity as _, Person, User, UserRole};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: String,
    pub email_verified: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: Option<DateTimeUtc>,
    /// Soft delete timestamp (NULL = active, set = deleted)
    pub deleted_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Convert database model to domain entity
impl From<Model> for User {
    fn from(model: Model) -> Self {
        User::from_stored(
            model.id,
            model.email,
            Person {
                first_name: model.first_name,
                last_name: model.last_name,
                phone: model.phone,
            },
            UserRole::from(model.role.as_str()),
            model.email_verified,
            AuditFields::from_parts(Some(model.created_at), model.updated_at, model.deleted_at),
        )
    }
}

/// Convert domain entity to an active model for insert or update
impl From<User> for ActiveModel {
    fn from(user: User) -> Self {
        let audit = user.audit().clone();
        ActiveModel {
            id: user.id().copied().map(Set).unwrap_or(NotSet),
            email: Set(user.email),
            first_name: Set(user.person.first_name),
            last_name: Set(user.person.last_name),
            phone: Set(user.person.phone),
            role: Set(user.role.to_string()),
            email_verified: Set(user.email_verified),
            created_at: audit.created_at().map(Set).unwrap_or(NotSet),
            updated_at: Set(audit.updated_at()),
            deleted_at: Set(audit.deleted_at()),
        }
    }
}
