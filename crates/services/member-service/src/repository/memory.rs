//! In-memory entity store.
//!
//! Keeps rows in insertion order, which is also its natural ordering for
//! pagination. Sorting by field name goes through the entity's serialized
//! form, so only serializable fields can be sorted on.

use std::cmp::Ordering;
use std::marker::PhantomData;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;

use common::{Page, PageRequest, Sort, SortDirection};
use domain::Entity;

use super::store::{EntityStore, StoreError, StoreResult};

/// Thread-safe in-memory store for one entity type.
pub struct InMemoryStore<E> {
    rows: RwLock<Vec<E>>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> InMemoryStore<E> {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
            _entity: PhantomData,
        }
    }

    /// Number of rows currently held
    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }

    fn write(rows: &mut Vec<E>, mut entity: E) -> E {
        entity.prepare_for_save(Utc::now());

        let position = entity
            .id()
            .and_then(|id| rows.iter().position(|row| row.id() == Some(id)));

        match position {
            Some(index) => rows[index] = entity.clone(),
            None => rows.push(entity.clone()),
        }

        entity
    }
}

impl<E: Entity> Default for InMemoryStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<E> EntityStore<E> for InMemoryStore<E>
where
    E: Entity + Serialize,
{
    async fn find_all(&self) -> StoreResult<Vec<E>> {
        Ok(self.rows.read().clone())
    }

    async fn find_page(&self, request: &PageRequest) -> StoreResult<Page<E>> {
        let rows = self.rows.read().clone();
        let total = rows.len() as u64;

        let rows = match &request.sort {
            Some(sort) => sort_rows(rows, sort)?,
            None => rows,
        };

        let offset = usize::try_from(request.offset()).unwrap_or(usize::MAX);
        let size = usize::try_from(request.size).unwrap_or(usize::MAX);
        let content = rows.into_iter().skip(offset).take(size).collect();

        Ok(Page::new(content, request, total))
    }

    async fn find_by_id(&self, id: &E::Id) -> StoreResult<Option<E>> {
        Ok(self
            .rows
            .read()
            .iter()
            .find(|row| row.id() == Some(id))
            .cloned())
    }

    async fn exists_by_id(&self, id: &E::Id) -> StoreResult<bool> {
        Ok(self.rows.read().iter().any(|row| row.id() == Some(id)))
    }

    async fn save(&self, entity: E) -> StoreResult<E> {
        let mut rows = self.rows.write();
        Ok(Self::write(&mut rows, entity))
    }

    async fn save_all(&self, entities: Vec<E>) -> StoreResult<Vec<E>> {
        let mut rows = self.rows.write();
        Ok(entities
            .into_iter()
            .map(|entity| Self::write(&mut rows, entity))
            .collect())
    }

    async fn save_and_flush(&self, entity: E) -> StoreResult<E> {
        self.save(entity).await
    }

    async fn flush(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn delete_by_id(&self, id: &E::Id) -> StoreResult<bool> {
        let mut rows = self.rows.write();
        let before = rows.len();
        rows.retain(|row| row.id() != Some(id));
        Ok(rows.len() < before)
    }

    async fn count(&self) -> StoreResult<u64> {
        Ok(self.rows.read().len() as u64)
    }

    async fn find_all_by_id(&self, ids: &[E::Id]) -> StoreResult<Vec<E>> {
        let rows = self.rows.read();
        Ok(ids
            .iter()
            .filter_map(|id| rows.iter().find(|row| row.id() == Some(id)).cloned())
            .collect())
    }
}

fn sort_rows<E: Serialize>(rows: Vec<E>, sort: &Sort) -> StoreResult<Vec<E>> {
    let mut keyed = rows
        .into_iter()
        .map(|row| Ok((sort_key(&row, &sort.field)?, row)))
        .collect::<StoreResult<Vec<_>>>()?;

    keyed.sort_by(|(a, _), (b, _)| match sort.direction {
        SortDirection::Asc => compare_values(a, b),
        SortDirection::Desc => compare_values(b, a),
    });

    Ok(keyed.into_iter().map(|(_, row)| row).collect())
}

fn sort_key<E: Serialize>(row: &E, field: &str) -> StoreResult<Value> {
    let value = serde_json::to_value(row).map_err(|e| StoreError::InvalidQuery(e.to_string()))?;
    value
        .get(field)
        .cloned()
        .ok_or_else(|| StoreError::InvalidQuery(format!("unknown sort field '{}'", field)))
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::Email;

    #[tokio::test]
    async fn test_save_assigns_id_and_replaces_existing_row() {
        let store = InMemoryStore::<Email>::new();
        let saved = store
            .save(Email::new("a@example.com", "Welcome", "Hello"))
            .await
            .unwrap();
        assert!(saved.id().is_some());
        assert!(saved.audit().created_at().is_some());

        let mut changed = saved.clone();
        changed.subject = "Welcome aboard".to_string();
        let resaved = store.save(changed).await.unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(resaved.subject, "Welcome aboard");
        assert!(resaved.audit().updated_at().is_some());
    }

    #[tokio::test]
    async fn test_find_page_sorted() {
        let store = InMemoryStore::<Email>::new();
        for subject in ["b", "c", "a"] {
            store
                .save(Email::new("x@example.com", subject, ""))
                .await
                .unwrap();
        }

        let request = PageRequest::of(0, 2).sorted_by(Sort::asc("subject"));
        let page = store.find_page(&request).await.unwrap();
        let subjects: Vec<_> = page.content.iter().map(|e| e.subject.as_str()).collect();
        assert_eq!(subjects, vec!["a", "b"]);
        assert_eq!(page.total, 3);

        let request = PageRequest::of(0, 3).sorted_by(Sort::desc("subject"));
        let page = store.find_page(&request).await.unwrap();
        let subjects: Vec<_> = page.content.iter().map(|e| e.subject.as_str()).collect();
        assert_eq!(subjects, vec!["c", "b", "a"]);
    }

    #[tokio::test]
    async fn test_unknown_sort_field() {
        let store = InMemoryStore::<Email>::new();
        store.save(Email::new("x@example.com", "s", "")).await.unwrap();

        let request = PageRequest::of(0, 10).sorted_by(Sort::asc("priority"));
        let err = store.find_page(&request).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidQuery(_)));
    }
}
