//! Email database entity for SeaORM.

use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue::{NotSet, Set};

use domain::{AuditFields, Email, Entity as _};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "emails")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub recipient: String,
    pub subject: String,
    #[sea_orm(column_type = "Text")]
    pub body: String,
    pub sent_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: Option<DateTimeUtc>,
    pub deleted_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Email {
    fn from(model: Model) -> Self {
        Email::from_stored(
            model.id,
            model.recipient,
            model.subject,
            model.body,
            model.sent_at,
            AuditFields::from_parts(Some(model.created_at), model.updated_at, model.deleted_at),
        )
    }
}

impl From<Email> for ActiveModel {
    fn from(email: Email) -> Self {
        let audit = email.audit().clone();
        ActiveModel {
            id: email.id().copied().map(Set).unwrap_or(NotSet),
            recipient: Set(email.recipient),
            subject: Set(email.subject),
            body: Set(email.body),
            sent_at: Set(email.sent_at),
            created_at: audit.created_at().map(Set).unwrap_or(NotSet),
            updated_at: Set(audit.updated_at()),
            deleted_at: Set(audit.deleted_at()),
        }
    }
}
