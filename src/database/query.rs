use std::marker::PhantomData;

use serde_json::Value;

use crate::database::entity::Entity;
use crate::database::storage::Storage;
use crate::database::DatabaseError;
use crate::filter::FilterData;

/// Untracked read over one entity type.
///
/// Soft-deleted rows are excluded unless `include_deleted(true)` is called
/// on this query; the override never leaks into other queries.
pub struct EntityQuery<'a, T: Entity> {
    storage: &'a dyn Storage,
    data: FilterData,
    _entity: PhantomData<T>,
}

impl<'a, T: Entity> EntityQuery<'a, T> {
    pub(crate) fn new(storage: &'a dyn Storage) -> Self {
        Self {
            storage,
            data: FilterData::default(),
            _entity: PhantomData,
        }
    }

    /// Where conditions in the filter language (`{"created_by_id": ...}`)
    pub fn filter(mut self, conditions: Value) -> Self {
        self.data.where_clause = Some(conditions);
        self
    }

    pub fn order(mut self, order: Value) -> Self {
        self.data.order = Some(order);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.data.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: i64) -> Self {
        self.data.offset = Some(offset);
        self
    }

    pub fn include_deleted(mut self, include: bool) -> Self {
        self.data.include_deleted = include;
        self
    }

    pub async fn all(self) -> Result<Vec<T>, DatabaseError> {
        self.storage
            .select(&T::TABLE, self.data)
            .await?
            .into_iter()
            .map(T::from_row)
            .collect()
    }

    pub async fn first(mut self) -> Result<Option<T>, DatabaseError> {
        self.data.limit = Some(1);
        Ok(self.all().await?.into_iter().next())
    }

    pub async fn count(self) -> Result<i64, DatabaseError> {
        self.storage.count(&T::TABLE, self.data).await
    }
}
