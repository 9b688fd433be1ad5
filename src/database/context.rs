use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::database::entity::Entity;
use crate::database::query::EntityQuery;
use crate::database::storage::Storage;
use crate::database::tracker::ChangeTracker;
use crate::database::DatabaseError;
use crate::filter::FilterData;
use crate::observer::ObserverPipeline;
use crate::types::EntityState;

/// Unit of work over a storage backend.
///
/// Holds the tracked entities of one request. Reads through `find` and
/// `find_by` attach what they load; `save_changes` runs the observer
/// pipeline over everything pending and writes the result in one
/// transaction.
pub struct DbContext {
    storage: Arc<dyn Storage>,
    pipeline: Arc<ObserverPipeline>,
    tracker: ChangeTracker,
}

impl DbContext {
    pub fn new(storage: Arc<dyn Storage>, pipeline: Arc<ObserverPipeline>) -> Self {
        Self {
            storage,
            pipeline,
            tracker: ChangeTracker::new(),
        }
    }

    /// Current time from the pipeline clock
    pub fn now(&self) -> DateTime<Utc> {
        self.pipeline.now()
    }

    pub fn add<T: Entity>(&mut self, entity: T) -> Result<(), DatabaseError> {
        self.tracker.add(entity)
    }

    pub fn update<T: Entity>(&mut self, entity: T) -> Result<(), DatabaseError> {
        self.tracker.update(entity)
    }

    pub fn remove<T: Entity>(&mut self, entity: T) {
        self.tracker.remove(entity)
    }

    /// Tracked copy of an entity, reflecting anything the last save stamped
    pub fn entry<T: Entity>(&self, key: Uuid) -> Option<T> {
        self.tracker.get::<T>(key).cloned()
    }

    pub fn state_of<T: Entity>(&self, key: Uuid) -> Option<EntityState> {
        self.tracker.state_of::<T>(key)
    }

    pub fn query<T: Entity>(&self) -> EntityQuery<'_, T> {
        EntityQuery::new(self.storage.as_ref())
    }

    /// Load by key, honoring the soft-delete filter. An entity that is
    /// already tracked is returned as tracked, unsaved edits included.
    pub async fn find<T: Entity>(&mut self, key: Uuid) -> Result<Option<T>, DatabaseError> {
        if let Some(tracked) = self.tracker.get::<T>(key) {
            return Ok((!tracked.audit().is_deleted).then(|| tracked.clone()));
        }

        let filter = FilterData {
            limit: Some(1),
            ..FilterData::with_where(json!({ "id": key.to_string() }))
        };
        let found = self.load::<T>(filter).await?;
        Ok(found.into_iter().next())
    }

    /// Load every live row matching `conditions` and track it
    pub async fn find_by<T: Entity>(&mut self, conditions: Value) -> Result<Vec<T>, DatabaseError> {
        self.load::<T>(FilterData::with_where(conditions)).await
    }

    async fn load<T: Entity>(&mut self, filter: FilterData) -> Result<Vec<T>, DatabaseError> {
        let rows = self.storage.select(&T::TABLE, filter).await?;
        let mut loaded = Vec::with_capacity(rows.len());

        for row in rows {
            let entity = T::from_row(row)?;
            match self.tracker.get::<T>(entity.key()) {
                Some(tracked) => loaded.push(tracked.clone()),
                None => {
                    self.tracker.attach(entity.clone())?;
                    loaded.push(entity);
                }
            }
        }
        Ok(loaded)
    }

    /// Persist every pending change. Returns the number of rows written.
    pub async fn save_changes(&mut self) -> Result<usize, DatabaseError> {
        self.tracker.detect_changes()?;
        if !self.tracker.has_pending() {
            return Ok(0);
        }

        self.pipeline.execute(self.tracker.entries_mut(), self.storage.as_ref()).await?;

        let writes = self.tracker.writes()?;
        let written = self.storage.apply(writes).await?;
        self.tracker.accept_all()?;

        tracing::debug!("save_changes wrote {} rows via {}", written, self.storage.name());
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{Article, User};
    use crate::observer::ObserverError;
    use crate::testing::TestContext;

    #[tokio::test]
    async fn insert_stamps_both_timestamps() {
        let test = TestContext::new();
        let user = test.seed_user("author", "author@example.com").await;
        let mut db = test.db();

        let article = Article::new("first post", user.id);
        let key = article.key();
        db.add(article).unwrap();
        assert_eq!(db.save_changes().await.unwrap(), 1);

        let saved = db.entry::<Article>(key).unwrap();
        assert_eq!(saved.audit.created_at, test.now());
        assert_eq!(saved.audit.modified_at, test.now());
        assert!(!saved.audit.is_deleted);
        assert_eq!(saved.audit.deleted_at, None);
    }

    #[tokio::test]
    async fn remove_is_a_soft_delete() {
        let test = TestContext::new();
        let user = test.seed_user("author", "author@example.com").await;
        let mut db = test.db();
        let article = Article::new("doomed", user.id);
        let key = article.key();
        db.add(article).unwrap();
        db.save_changes().await.unwrap();
        let created = test.now();

        test.clock.advance_seconds(90);
        let mut db = test.db();
        let article = db.find::<Article>(key).await.unwrap().unwrap();
        db.remove(article);
        assert_eq!(db.state_of::<Article>(key), Some(EntityState::Deleted));
        db.save_changes().await.unwrap();
        assert_eq!(db.state_of::<Article>(key), Some(EntityState::Unchanged));

        let db = test.db();
        assert!(db.query::<Article>().filter(json!({ "id": key.to_string() })).first().await.unwrap().is_none());

        let stored = db
            .query::<Article>()
            .filter(json!({ "id": key.to_string() }))
            .include_deleted(true)
            .first()
            .await
            .unwrap()
            .unwrap();
        assert!(stored.audit.is_deleted);
        assert_eq!(stored.audit.deleted_at, Some(test.now()));
        assert_eq!(stored.audit.modified_at, test.now());
        assert_eq!(stored.audit.created_at, created);
        assert_eq!(test.storage.raw_rows(&Article::TABLE).await.len(), 1);
    }

    #[tokio::test]
    async fn update_without_changes_writes_nothing() {
        let test = TestContext::new();
        let user = test.seed_user("author", "author@example.com").await;
        let mut db = test.db();

        let loaded = db.find::<User>(user.key()).await.unwrap().unwrap();
        db.update(loaded).unwrap();
        assert_eq!(db.save_changes().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn update_moves_modified_at_only() {
        let test = TestContext::new();
        let user = test.seed_user("author", "author@example.com").await;
        let created = test.now();

        test.clock.advance_seconds(60);
        let mut db = test.db();
        let mut loaded = db.find::<User>(user.key()).await.unwrap().unwrap();
        loaded.username = "renamed".to_string();
        db.update(loaded).unwrap();
        db.save_changes().await.unwrap();

        let saved = db.entry::<User>(user.key()).unwrap();
        assert_eq!(saved.audit.created_at, created);
        assert_eq!(saved.audit.modified_at, test.now());
        assert!(saved.audit.created_at < saved.audit.modified_at);
    }

    #[tokio::test]
    async fn deleting_an_owner_is_restricted_and_writes_nothing() {
        let test = TestContext::new();
        let user = test.seed_user("author", "author@example.com").await;
        let mut db = test.db();
        db.add(Article::new("mine", user.id)).unwrap();
        db.save_changes().await.unwrap();

        let mut db = test.db();
        let loaded = db.find::<User>(user.key()).await.unwrap().unwrap();
        db.remove(loaded);
        let err = db.save_changes().await.unwrap_err();

        assert!(matches!(err, DatabaseError::Observer(ObserverError::Integrity(_))));
        let users = test.storage.raw_rows(&User::TABLE).await;
        assert_eq!(users[0]["is_deleted"], json!(false));
    }

    #[tokio::test]
    async fn find_does_not_return_soft_deleted_rows() {
        let test = TestContext::new();
        let user = test.seed_user("author", "author@example.com").await;
        let mut db = test.db();
        let mut article = Article::new("hidden", user.id);
        article.audit.is_deleted = true;
        let key = article.key();
        db.add(article).unwrap();
        db.save_changes().await.unwrap();

        let mut db = test.db();
        assert!(db.find::<Article>(key).await.unwrap().is_none());
        assert_eq!(db.query::<Article>().include_deleted(true).count().await.unwrap(), 1);
    }
}
