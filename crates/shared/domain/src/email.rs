//! Outgoing email queued for a member.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::{AuditFields, Entity};
use crate::fields::FieldTable;

static EMAIL_FIELDS: Lazy<FieldTable<Email>> = Lazy::new(|| {
    FieldTable::builder()
        .field("recipient", |e: &mut Email, v: String| e.recipient = v)
        .field("subject", |e: &mut Email, v: String| e.subject = v)
        .field("body", |e: &mut Email, v: String| e.body = v)
        .build()
});

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Email {
    pub(crate) id: Option<Uuid>,
    pub recipient: String,
    pub subject: String,
    pub body: String,
    pub sent_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub(crate) audit: AuditFields,
}

crate::impl_entity_identity!(Email);

impl Email {
    pub fn new(recipient: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
            subject: subject.into(),
            body: body.into(),
            ..Self::default()
        }
    }

    /// Rebuild an email from stored state
    pub fn from_stored(
        id: Uuid,
        recipient: String,
        subject: String,
        body: String,
        sent_at: Option<DateTime<Utc>>,
        audit: AuditFields,
    ) -> Self {
        Self {
            id: Some(id),
            recipient,
            subject,
            body,
            sent_at,
            audit,
        }
    }

    pub fn is_sent(&self) -> bool {
        self.sent_at.is_some()
    }

    pub fn mark_sent(&mut self, now: DateTime<Utc>) {
        self.sent_at = Some(now);
    }
}

impl Entity for Email {
    type Id = Uuid;

    const NAME: &'static str = "Email";

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
        &EMAIL_FIELDS
    }
}
