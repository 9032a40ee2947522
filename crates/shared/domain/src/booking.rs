//! Booking of a club resource by a member.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::{AuditFields, Entity};
use crate::fields::FieldTable;

static BOOKING_FIELDS: Lazy<FieldTable<Booking>> = Lazy::new(|| {
    FieldTable::builder()
        .field("member_id", |b: &mut Booking, v: Option<Uuid>| b.member_id = v)
        .field("resource", |b: &mut Booking, v: String| b.resource = v)
        .field("starts_at", |b: &mut Booking, v: Option<DateTime<Utc>>| b.starts_at = v)
        .field("ends_at", |b: &mut Booking, v: Option<DateTime<Utc>>| b.ends_at = v)
        .field("notes", |b: &mut Booking, v: Option<String>| b.notes = v)
        .build()
});

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Booking {
    pub(crate) id: Option<Uuid>,
    pub member_id: Option<Uuid>,
    pub resource: String,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    #[serde(flatten)]
    pub(crate) audit: AuditFields,
}

crate::impl_entity_identity!(Booking);

impl Booking {
    pub fn new(member_id: Uuid, resource: impl Into<String>, starts_at: DateTime<Utc>, ends_at: DateTime<Utc>) -> Self {
        Self {
            member_id: Some(member_id),
            resource: resource.into(),
            starts_at: Some(starts_at),
            ends_at: Some(ends_at),
            ..Self::default()
        }
    }

    /// Rebuild a booking from stored state
    pub fn from_stored(
        id: Uuid,
        member_id: Option<Uuid>,
        resource: String,
        starts_at: Option<DateTime<Utc>>,
        ends_at: Option<DateTime<Utc>>,
        notes: Option<String>,
        audit: AuditFields,
    ) -> Self {
        Self {
            id: Some(id),
            member_id,
            resource,
            starts_at,
            ends_at,
            notes,
            audit,
        }
    }

    pub fn belongs_to(&self, member_id: Uuid) -> bool {
        self.member_id == Some(member_id)
    }
}

impl Entity for Booking {
    type Id = Uuid;

    const NAME: &'static str = "Booking";

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
        &BOOKING_FIELDS
    }
}
