//! Generic entity repository.
//!
//! Wraps an [`EntityStore`] and gives every entity type the same logged CRUD,
//! pagination, soft delete, dynamic field patching and chunked processing.
//!
//! Failure policy is two-tier. `count`, `exists_by_id` and `find_first` are
//! best-effort: a store failure is logged and a default (`0`, `false`,
//! `None`) is returned. Every other operation logs the failure and returns
//! [`AppError::Storage`] carrying the store error as its cause.

use std::future::Future;
use std::marker::PhantomData;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use common::{AppError, AppResult, OptionExt, Page, PageRequest};
use domain::{Entity, FieldMap, FieldPatch, DEFAULT_ENTITY_NAME};

use super::store::{EntityStore, StoreError, StoreResult};

/// Uniform repository over one entity type and its store.
///
/// Holds no mutable state of its own; concurrency guarantees are those of
/// the underlying store.
pub struct EntityRepository<E, S> {
    store: S,
    entity_name: &'static str,
    _entity: PhantomData<fn() -> E>,
}

impl<E, S> EntityRepository<E, S>
where
    E: Entity,
    S: EntityStore<E>,
{
    /// Create a repository labelled with the generic entity name.
    pub fn new(store: S) -> Self {
        Self {
            store,
            entity_name: DEFAULT_ENTITY_NAME,
            _entity: PhantomData,
        }
    }

    /// Override the human-readable label used in logs and errors.
    pub fn named(mut self, entity_name: &'static str) -> Self {
        self.entity_name = entity_name;
        self
    }

    pub fn entity_name(&self) -> &'static str {
        self.entity_name
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // =========================================================================
    // Operation wrappers
    // =========================================================================

    async fn execute<T, F>(&self, operation: &'static str, call: F) -> AppResult<T>
    where
        F: Future<Output = StoreResult<T>>,
    {
        debug!(operation, entity = self.entity_name, "Executing repository operation");

        call.await.map_err(|e| {
            error!(
                operation,
                entity = self.entity_name,
                error = ?e,
                "Repository operation failed"
            );
            AppError::storage(operation, self.entity_name, e)
        })
    }

    async fn execute_or<T, F>(&self, operation: &'static str, default: T, call: F) -> T
    where
        F: Future<Output = StoreResult<T>>,
    {
        debug!(operation, entity = self.entity_name, "Executing repository operation");

        match call.await {
            Ok(value) => value,
            Err(e) => {
                warn!(
                    operation,
                    entity = self.entity_name,
                    error = ?e,
                    "Repository operation failed, returning default"
                );
                default
            }
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Every stored row, soft-deleted ones included.
    pub async fn find_all(&self) -> AppResult<Vec<E>> {
        self.execute("find all", self.store.find_all()).await
    }

    /// Look up a row; an absent row is `Ok(None)`.
    pub async fn find_by_id(&self, id: &E::Id) -> AppResult<Option<E>> {
        self.execute("find by id", self.store.find_by_id(id)).await
    }

    /// Look up a row, failing with [`AppError::NotFound`] when it is absent.
    pub async fn find_by_id_or_fail(&self, id: &E::Id) -> AppResult<E> {
        self.find_by_id(id)
            .await?
            .ok_or_not_found(self.entity_name, id)
    }

    /// First row in the store's natural order, fetched as a one-row page.
    pub async fn find_first(&self) -> Option<E> {
        let call = async {
            let page = self.store.find_page(&PageRequest::first()).await?;
            Ok::<_, StoreError>(page.content.into_iter().next())
        };
        self.execute_or("find first", None, call).await
    }

    pub async fn find_page(&self, request: &PageRequest) -> AppResult<Page<E>> {
        if request.size == 0 {
            return Err(AppError::validation("Page size must be greater than zero"));
        }
        self.execute("find page", self.store.find_page(request)).await
    }

    /// Batch lookup; ids without a row are left out of the result.
    pub async fn find_all_by_id(&self, ids: &[E::Id]) -> AppResult<Vec<E>> {
        self.execute("find all by id", self.store.find_all_by_id(ids))
            .await
    }

    /// Total row count, `0` if the store fails.
    pub async fn count(&self) -> u64 {
        self.execute_or("count", 0, self.store.count()).await
    }

    /// Whether a row exists, `false` if the store fails.
    pub async fn exists_by_id(&self, id: &E::Id) -> bool {
        self.execute_or("exists by id", false, self.store.exists_by_id(id))
            .await
    }

    // =========================================================================
    // Soft delete views
    // =========================================================================

    /// Rows whose `deleted_at` is absent
    pub async fn find_active(&self) -> AppResult<Vec<E>> {
        let rows = self.find_all().await?;
        Ok(rows.into_iter().filter(|row| row.is_active()).collect())
    }

    /// Rows whose `deleted_at` is set
    pub async fn find_deleted(&self) -> AppResult<Vec<E>> {
        let rows = self.find_all().await?;
        Ok(rows.into_iter().filter(|row| row.is_deleted()).collect())
    }

    /// Every row, deleted or not
    pub async fn find_with_deleted(&self) -> AppResult<Vec<E>> {
        self.find_all().await
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Persist a new entity and return it with store-assigned fields filled in.
    pub async fn create(&self, entity: E) -> AppResult<E> {
        self.execute("create", self.store.save(entity)).await
    }

    pub async fn create_all(&self, entities: Vec<E>) -> AppResult<Vec<E>> {
        self.execute("create all", self.store.save_all(entities))
            .await
    }

    /// Create, then force the write to be durable before returning.
    pub async fn create_and_flush(&self, entity: E) -> AppResult<E> {
        self.execute("create and flush", self.store.save_and_flush(entity))
            .await
    }

    pub async fn flush(&self) -> AppResult<()> {
        self.execute("flush", self.store.flush()).await
    }

    /// Replace the state stored under `id` with `entity`.
    ///
    /// The stored row's creation and deletion timestamps are kept; use
    /// [`restore`](Self::restore) to undo a soft delete.
    pub async fn update(&self, id: &E::Id, mut entity: E) -> AppResult<E> {
        let stored = self.find_by_id_or_fail(id).await?;

        entity.assign_id(id.clone());
        entity.audit_mut().inherit_lifecycle(stored.audit());

        self.execute("update", self.store.save(entity)).await
    }

    /// Soft delete the row. Returns `false` when there is no such row.
    pub async fn delete_by_id(&self, id: &E::Id) -> AppResult<bool> {
        let Some(mut entity) = self.find_by_id(id).await? else {
            debug!(entity = self.entity_name, %id, "Nothing to delete");
            return Ok(false);
        };

        entity.soft_delete(Utc::now())?;
        self.execute("delete", self.store.save(entity)).await?;
        Ok(true)
    }

    /// Clear the soft delete of a row.
    pub async fn restore(&self, id: &E::Id) -> AppResult<E> {
        let mut entity = self.find_by_id_or_fail(id).await?;

        entity.restore(Utc::now())?;
        self.execute("restore", self.store.save(entity)).await
    }

    /// Physically remove the row. Returns whether a row was removed.
    pub async fn hard_delete_by_id(&self, id: &E::Id) -> AppResult<bool> {
        self.execute("hard delete", self.store.delete_by_id(id))
            .await
    }

    // =========================================================================
    // Dynamic creation and patching
    // =========================================================================

    /// Apply loosely typed `data` to `entity` through its field table.
    ///
    /// Keys that match no field on the entity or its parent record are logged
    /// and ignored.
    pub fn update_entity_from_data(&self, entity: &mut E, data: &FieldMap) -> AppResult<FieldPatch> {
        let patch = E::field_table().apply(entity, data)?;

        for field in &patch.skipped {
            warn!(entity = self.entity_name, field = %field, "Ignoring unknown field");
        }

        Ok(patch)
    }

    /// Build a new entity from `data` and persist it.
    pub async fn create_from_data(&self, data: &FieldMap) -> AppResult<E> {
        let mut entity = E::default();
        self.update_entity_from_data(&mut entity, data)?;
        self.create(entity).await
    }

    /// Build one entity per map and persist them as a batch.
    pub async fn create_many_from_data(&self, data: &[FieldMap]) -> AppResult<Vec<E>> {
        let mut entities = Vec::with_capacity(data.len());
        for fields in data {
            let mut entity = E::default();
            self.update_entity_from_data(&mut entity, fields)?;
            entities.push(entity);
        }
        self.create_all(entities).await
    }

    /// Load the row under `id`, apply `data` and persist it.
    pub async fn update_with_data(&self, id: &E::Id, data: &FieldMap) -> AppResult<E> {
        let mut entity = self.find_by_id_or_fail(id).await?;
        self.update_entity_from_data(&mut entity, data)?;
        self.execute("update", self.store.save(entity)).await
    }

    // =========================================================================
    // Bulk processing
    // =========================================================================

    /// Visit the whole table in pages of `chunk_size`, returning the number of
    /// chunks handed to `processor`.
    ///
    /// The chunk count is fixed from the row count taken at the start. Rows
    /// inserted or deleted while the scan runs shift later pages, so a row may
    /// be seen twice or not at all.
    pub async fn process_in_chunks<F>(&self, chunk_size: u64, mut processor: F) -> AppResult<u64>
    where
        F: FnMut(Vec<E>) -> AppResult<()>,
    {
        if chunk_size == 0 {
            return Err(AppError::validation("Chunk size must be greater than zero"));
        }

        let total = self.execute("count", self.store.count()).await?;
        let chunks = total.div_ceil(chunk_size);
        info!(
            entity = self.entity_name,
            total,
            chunk_size,
            chunks,
            "Processing entities in chunks"
        );

        for index in 0..chunks {
            let request = PageRequest::of(index, chunk_size);
            let page = self
                .execute("find page", self.store.find_page(&request))
                .await?;
            debug!(entity = self.entity_name, chunk = index, rows = page.content.len(), "Processing chunk");
            processor(page.content)?;
        }

        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::store::MockEntityStore;
    use domain::Booking;
    use std::error::Error as _;
    use uuid::Uuid;

    fn unavailable() -> StoreError {
        StoreError::Unavailable("connection refused".to_string())
    }

    fn repository(store: MockEntityStore<Booking>) -> EntityRepository<Booking, MockEntityStore<Booking>> {
        EntityRepository::new(store).named("Booking")
    }

    #[test]
    fn test_default_entity_name() {
        let repo = EntityRepository::new(MockEntityStore::<Booking>::new());
        assert_eq!(repo.entity_name(), "Entity");
    }

    #[tokio::test]
    async fn test_count_degrades_to_zero() {
        let mut store = MockEntityStore::<Booking>::new();
        store.expect_count().returning(|| Err(unavailable()));

        assert_eq!(repository(store).count().await, 0);
    }

    #[tokio::test]
    async fn test_exists_degrades_to_false() {
        let mut store = MockEntityStore::<Booking>::new();
        store.expect_exists_by_id().returning(|_| Err(unavailable()));

        assert!(!repository(store).exists_by_id(&Uuid::new_v4()).await);
    }

    #[tokio::test]
    async fn test_find_first_requests_single_row_page() {
        let mut store = MockEntityStore::<Booking>::new();
        store
            .expect_find_page()
            .withf(|request| request.page == 0 && request.size == 1)
            .times(1)
            .returning(|request| Ok(Page::new(vec![Booking::default()], request, 7)));

        assert!(repository(store).find_first().await.is_some());
    }

    #[tokio::test]
    async fn test_find_first_degrades_to_none() {
        let mut store = MockEntityStore::<Booking>::new();
        store.expect_find_page().returning(|_| Err(unavailable()));

        assert!(repository(store).find_first().await.is_none());
    }

    #[tokio::test]
    async fn test_find_all_wraps_store_failure() {
        let mut store = MockEntityStore::<Booking>::new();
        store.expect_find_all().returning(|| Err(unavailable()));

        let err = repository(store).find_all().await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to find all Booking");
        assert_eq!(err.code(), "STORAGE_ERROR");
        assert!(err
            .source()
            .unwrap()
            .to_string()
            .contains("connection refused"));
    }

    #[tokio::test]
    async fn test_find_by_id_propagates_store_failure() {
        let mut store = MockEntityStore::<Booking>::new();
        store.expect_find_by_id().returning(|_| Err(unavailable()));

        let err = repository(store)
            .find_by_id(&Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Storage { .. }));
    }

    #[tokio::test]
    async fn test_update_missing_row_never_saves() {
        let mut store = MockEntityStore::<Booking>::new();
        store.expect_find_by_id().returning(|_| Ok(None));
        store.expect_save().never();

        let err = repository(store)
            .update(&Uuid::new_v4(), Booking::default())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().starts_with("Booking not found with id: "));
    }

    #[tokio::test]
    async fn test_process_in_chunks_propagates_count_failure() {
        let mut store = MockEntityStore::<Booking>::new();
        store.expect_count().returning(|| Err(unavailable()));
        store.expect_find_page().never();

        let result = repository(store)
            .process_in_chunks(10, |_| Ok(()))
            .await;
        assert!(matches!(result, Err(AppError::Storage { .. })));
    }

    #[tokio::test]
    async fn test_zero_sizes_are_rejected() {
        let repo = repository(MockEntityStore::<Booking>::new());

        let err = repo.find_page(&PageRequest::of(0, 0)).await.unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");

        let err = repo.process_in_chunks(0, |_| Ok(())).await.unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }
}
