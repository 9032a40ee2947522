//! SeaORM-backed entity store.
//!
//! Generic over the SeaORM entity, its active model and the domain entity it
//! maps to. Writes are committed as they execute, so `flush` has nothing
//! left to do.

use std::marker::PhantomData;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    IntoActiveModel, PaginatorTrait, PrimaryKeyTrait, QueryOrder, TransactionTrait,
};

use common::{Page, PageRequest, SortDirection};
use domain::Entity;

use super::store::{EntityStore, StoreError, StoreResult};

/// Entity store over a SeaORM table.
pub struct SeaStore<E, A, D> {
    db: DatabaseConnection,
    _marker: PhantomData<fn() -> (E, A, D)>,
}

impl<E, A, D> SeaStore<E, A, D> {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            _marker: PhantomData,
        }
    }

    /// Get database connection reference
    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl<E, A, D> SeaStore<E, A, D>
where
    D: Entity,
    E: EntityTrait,
    E::Model: Into<D> + IntoActiveModel<A> + Send + Sync + 'static,
    A: ActiveModelTrait<Entity = E> + ActiveModelBehavior + From<D> + Send + 'static,
{
    /// Insert a new row or update the existing one on `conn`.
    async fn write<C: ConnectionTrait>(conn: &C, mut entity: D) -> Result<D, DbErr> {
        let is_new = entity.id().is_none();
        entity.prepare_for_save(Utc::now());

        let active: A = entity.into();
        let model = if is_new {
            active.insert(conn).await?
        } else {
            active.update(conn).await?
        };

        Ok(model.into())
    }
}

#[async_trait]
impl<E, A, D> EntityStore<D> for SeaStore<E, A, D>
where
    D: Entity,
    E: EntityTrait,
    E::Model: Into<D> + IntoActiveModel<A> + Send + Sync + 'static,
    E::PrimaryKey: PrimaryKeyTrait<ValueType = D::Id>,
    E::Column: FromStr,
    A: ActiveModelTrait<Entity = E> + ActiveModelBehavior + From<D> + Send + 'static,
{
    async fn find_all(&self) -> StoreResult<Vec<D>> {
        let models = E::find().all(&self.db).await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn find_page(&self, request: &PageRequest) -> StoreResult<Page<D>> {
        let mut query = E::find();

        if let Some(sort) = &request.sort {
            let column = E::Column::from_str(&sort.field).map_err(|_| {
                StoreError::InvalidQuery(format!("unknown sort field '{}'", sort.field))
            })?;
            query = match sort.direction {
                SortDirection::Asc => query.order_by_asc(column),
                SortDirection::Desc => query.order_by_desc(column),
            };
        }

        let paginator = query.paginate(&self.db, request.size);
        let total = paginator.num_items().await?;
        let models = paginator.fetch_page(request.page).await?;

        Ok(Page::new(
            models.into_iter().map(Into::into).collect(),
            request,
            total,
        ))
    }

    async fn find_by_id(&self, id: &D::Id) -> StoreResult<Option<D>> {
        let model = E::find_by_id(id.clone()).one(&self.db).await?;
        Ok(model.map(Into::into))
    }

    async fn exists_by_id(&self, id: &D::Id) -> StoreResult<bool> {
        let model = E::find_by_id(id.clone()).one(&self.db).await?;
        Ok(model.is_some())
    }

    async fn save(&self, entity: D) -> StoreResult<D> {
        Ok(Self::write(&self.db, entity).await?)
    }

    async fn save_all(&self, entities: Vec<D>) -> StoreResult<Vec<D>> {
        let txn = self.db.begin().await?;

        let mut saved = Vec::with_capacity(entities.len());
        for entity in entities {
            saved.push(Self::write(&txn, entity).await?);
        }

        txn.commit().await?;
        Ok(saved)
    }

    async fn save_and_flush(&self, entity: D) -> StoreResult<D> {
        self.save(entity).await
    }

    async fn flush(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn delete_by_id(&self, id: &D::Id) -> StoreResult<bool> {
        let result = E::delete_by_id(id.clone()).exec(&self.db).await?;
        Ok(result.rows_affected > 0)
    }

    async fn count(&self) -> StoreResult<u64> {
        Ok(E::find().paginate(&self.db, 1).num_items().await?)
    }

    async fn find_all_by_id(&self, ids: &[D::Id]) -> StoreResult<Vec<D>> {
        let mut found = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(model) = E::find_by_id(id.clone()).one(&self.db).await? {
                found.push(model.into());
            }
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::repository::entities::user;
    use crate::repository::UserStore;
    use common::Sort;
    use domain::User;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value};
    use uuid::Uuid;

    fn model(email: &str) -> user::Model {
        user::Model {
            id: Uuid::new_v4(),
            email: email.to_string(),
            first_name: "Ann".to_string(),
            last_name: "Lee".to_string(),
            phone: None,
            role: "member".to_string(),
            email_verified: false,
            created_at: Utc::now(),
            updated_at: None,
            deleted_at: None,
        }
    }

    fn count_row(n: i64) -> BTreeMap<&'static str, Value> {
        BTreeMap::from([("num_items", Value::from(n))])
    }

    #[tokio::test]
    async fn test_save_inserts_new_and_updates_existing() {
        let stored = model("ann@example.com");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![stored.clone()], vec![stored.clone()]])
            .into_connection();
        let store = UserStore::new(db.clone());

        let created = store
            .save(User::new("ann@example.com", "Ann", "Lee"))
            .await
            .unwrap();
        assert_eq!(created.id(), Some(&stored.id));

        store.save(created).await.unwrap();

        let log = format!("{:?}", db.into_transaction_log());
        let insert = log.find("INSERT INTO").unwrap();
        let update = log.find("UPDATE").unwrap();
        assert!(insert < update);
    }

    #[tokio::test]
    async fn test_save_all_runs_in_one_transaction() {
        let first = model("a@example.com");
        let second = model("b@example.com");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![first.clone()], vec![second.clone()]])
            .into_connection();
        let store = UserStore::new(db.clone());

        let saved = store
            .save_all(vec![
                User::new("a@example.com", "A", "A"),
                User::new("b@example.com", "B", "B"),
            ])
            .await
            .unwrap();

        let emails: Vec<_> = saved.iter().map(|u| u.email.as_str()).collect();
        assert_eq!(emails, vec!["a@example.com", "b@example.com"]);
        assert_eq!(db.into_transaction_log().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_sort_column_is_invalid_query() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let store = UserStore::new(db);

        let request = PageRequest::of(0, 10).sorted_by(Sort::asc("priority"));
        let err = store.find_page(&request).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidQuery(_)));
    }

    #[tokio::test]
    async fn test_find_page_counts_then_fetches() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![count_row(3)]])
            .append_query_results([vec![model("c@example.com")]])
            .into_connection();
        let store = UserStore::new(db);

        let request = PageRequest::of(1, 2).sorted_by(Sort::desc("email"));
        let page = store.find_page(&request).await.unwrap();

        assert_eq!(page.total, 3);
        assert_eq!(page.content.len(), 1);
        assert_eq!(page.content[0].email, "c@example.com");
    }

    #[tokio::test]
    async fn test_delete_reports_rows_affected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                },
            ])
            .into_connection();
        let store = UserStore::new(db);
        let id = Uuid::new_v4();

        assert!(store.delete_by_id(&id).await.unwrap());
        assert!(!store.delete_by_id(&id).await.unwrap());
    }

    #[tokio::test]
    async fn test_count_and_lookup() {
        let stored = model("ann@example.com");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![count_row(7)]])
            .append_query_results([vec![stored.clone()]])
            .append_query_results([Vec::<user::Model>::new()])
            .into_connection();
        let store = UserStore::new(db);

        assert_eq!(store.count().await.unwrap(), 7);

        let found = store.find_by_id(&stored.id).await.unwrap().unwrap();
        assert_eq!(found.email, "ann@example.com");
        assert!(found.is_active());

        assert!(!store.exists_by_id(&Uuid::new_v4()).await.unwrap());
    }
}
