//! Booking database entity for SeaORM.

use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue::{NotSet, Set};

use domain::{AuditFields, Booking, Entity as _};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "bookings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub member_id: Option<Uuid>,
    pub resource: String,
    pub starts_at: Option<DateTimeUtc>,
    pub ends_at: Option<DateTimeUtc>,
    pub notes: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: Option<DateTimeUtc>,
    pub deleted_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Booking {
    fn from(model: Model) -> Self {
        Booking::from_stored(
            model.id,
            model.member_id,
            model.resource,
            model.starts_at,
            model.ends_at,
            model.notes,
            AuditFields::from_parts(Some(model.created_at), model.updated_at, model.deleted_at),
        )
    }
}

impl From<Booking> for ActiveModel {
    fn from(booking: Booking) -> Self {
        let audit = booking.audit().clone();
        ActiveModel {
            id: booking.id().copied().map(Set).unwrap_or(NotSet),
            member_id: Set(booking.member_id),
            resource: Set(booking.resource),
            starts_at: Set(booking.starts_at),
            ends_at: Set(booking.ends_at),
            notes: Set(booking.notes),
            created_at: audit.created_at().map(Set).unwrap_or(NotSet),
            updated_at: Set(audit.updated_at()),
            deleted_at: Set(audit.deleted_at()),
        }
    }
}
