//! Outgoing email repository.

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use common::AppResult;
use domain::{Email, Entity};

use super::entities;
use super::generic::EntityRepository;
use super::sea::SeaStore;
use super::store::EntityStore;

/// SeaORM store for the `emails` table
pub type EmailStore = SeaStore<entities::email::Entity, entities::email::ActiveModel, Email>;

pub struct EmailRepository<S> {
    inner: EntityRepository<Email, S>,
}

impl<S: EntityStore<Email>> EmailRepository<S> {
    pub fn new(store: S) -> Self {
        Self {
            inner: EntityRepository::new(store).named(Email::NAME),
        }
    }

    /// The generic repository this one is built on
    pub fn inner(&self) -> &EntityRepository<Email, S> {
        &self.inner
    }

    /// Active emails that have not been sent yet
    pub async fn find_unsent(&self) -> AppResult<Vec<Email>> {
        let emails = self.inner.find_active().await?;
        Ok(emails.into_iter().filter(|email| !email.is_sent()).collect())
    }

    /// Stamp an email as sent now.
    pub async fn mark_sent(&self, id: &Uuid) -> AppResult<Email> {
        let mut email = self.inner.find_by_id_or_fail(id).await?;
        email.mark_sent(Utc::now());

        let email = self.inner.update(id, email).await?;
        info!(email_id = %id, recipient = %email.recipient, "Email marked as sent");
        Ok(email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::memory::InMemoryStore;

    #[tokio::test]
    async fn test_mark_sent_removes_from_unsent() {
        let repo = EmailRepository::new(InMemoryStore::<Email>::new());
        let first = repo
            .inner()
            .create(Email::new("a@example.com", "Welcome", "Hi"))
            .await
            .unwrap();
        repo.inner().create(Email::new("b@example.com", "Welcome", "Hi"))
            .await
            .unwrap();
        assert_eq!(repo.find_unsent().await.unwrap().len(), 2);

        let sent = repo.mark_sent(first.id().unwrap()).await.unwrap();
        assert!(sent.is_sent());

        let unsent = repo.find_unsent().await.unwrap();
        assert_eq!(unsent.len(), 1);
        assert_eq!(unsent[0].recipient, "b@example.com");
    }
}
