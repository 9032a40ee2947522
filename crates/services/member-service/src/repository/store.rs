//! Single-entity store the generic repository delegates to.
//!
//! A store performs the actual reads and writes for one entity type. Stores
//! fill in store-assigned state (id, audit timestamps) on save.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use common::{Page, PageRequest};
use domain::Entity;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Failures raised by a store implementation.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Lower-level data access for one entity type.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait EntityStore<E: Entity>: Send + Sync {
    /// Every stored row, soft-deleted ones included
    async fn find_all(&self) -> StoreResult<Vec<E>>;

    /// One page of rows in the store's natural order unless a sort is given
    async fn find_page(&self, request: &PageRequest) -> StoreResult<Page<E>>;

    async fn find_by_id(&self, id: &E::Id) -> StoreResult<Option<E>>;

    async fn exists_by_id(&self, id: &E::Id) -> StoreResult<bool>;

    /// Insert when the entity has no id yet, otherwise replace the stored row
    async fn save(&self, entity: E) -> StoreResult<E>;

    async fn save_all(&self, entities: Vec<E>) -> StoreResult<Vec<E>>;

    /// Save and make the write durable before returning
    async fn save_and_flush(&self, entity: E) -> StoreResult<E>;

    async fn flush(&self) -> StoreResult<()>;

    /// Physically remove a row. Returns whether a row was removed.
    async fn delete_by_id(&self, id: &E::Id) -> StoreResult<bool>;

    async fn count(&self) -> StoreResult<u64>;

    /// Rows for the given ids; missing ids are omitted
    async fn find_all_by_id(&self, ids: &[E::Id]) -> StoreResult<Vec<E>>;
}

#[async_trait]
impl<E, S> EntityStore<E> for Arc<S>
where
    E: Entity,
    S: EntityStore<E> + ?Sized,
{
    async fn find_all(&self) -> StoreResult<Vec<E>> {
        (**self).find_all().await
    }

    async fn find_page(&self, request: &PageRequest) -> StoreResult<Page<E>> {
        (**self).find_page(request).await
    }

    async fn find_by_id(&self, id: &E::Id) -> StoreResult<Option<E>> {
        (**self).find_by_id(id).await
    }

    async fn exists_by_id(&self, id: &E::Id) -> StoreResult<bool> {
        (**self).exists_by_id(id).await
    }

    async fn save(&self, entity: E) -> StoreResult<E> {
        (**self).save(entity).await
    }

    async fn save_all(&self, entities: Vec<E>) -> StoreResult<Vec<E>> {
        (**self).save_all(entities).await
    }

    async fn save_and_flush(&self, entity: E) -> StoreResult<E> {
        (**self).save_and_flush(entity).await
    }

    async fn flush(&self) -> StoreResult<()> {
        (**self).flush().await
    }

    async fn delete_by_id(&self, id: &E::Id) -> StoreResult<bool> {
        (**self).delete_by_id(id).await
    }

    async fn count(&self) -> StoreResult<u64> {
        (**self).count().await
    }

    async fn find_all_by_id(&self, ids: &[E::Id]) -> StoreResult<Vec<E>> {
        (**self).find_all_by_id(ids).await
    }
}
