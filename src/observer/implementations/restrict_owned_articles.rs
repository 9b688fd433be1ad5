// Ring 2: Integrity - a user who still owns articles cannot be deleted
use async_trait::async_trait;
use serde_json::json;

use crate::database::entity::Entity;
use crate::database::models::{Article, User};
use crate::filter::FilterData;
use crate::observer::context::SaveContext;
use crate::observer::error::ObserverError;
use crate::observer::traits::{Observer, ObserverRing, SaveObserver};
use crate::types::EntityState;

/// Rejects deleting a user while any article, soft-deleted ones included,
/// references it through `created_by_id`. Mirrors the `ON DELETE RESTRICT`
/// foreign key, which never fires on its own because deletes are soft.
#[derive(Default)]
pub struct RestrictOwnedArticlesObserver;

impl Observer for RestrictOwnedArticlesObserver {
    fn name(&self) -> &'static str {
        "RestrictOwnedArticlesObserver"
    }

    fn ring(&self) -> ObserverRing {
        ObserverRing::Integrity
    }

    fn applies_to_state(&self, state: EntityState) -> bool {
        state == EntityState::Deleted
    }

    fn applies_to_table(&self, table: &str) -> bool {
        table == User::TABLE.name
    }
}

#[async_trait]
impl SaveObserver for RestrictOwnedArticlesObserver {
    async fn execute(&self, ctx: &mut SaveContext<'_>) -> Result<(), ObserverError> {
        let keys: Vec<_> = ctx.matching(self).map(|e| e.key()).collect();

        for key in keys {
            let filter = FilterData {
                include_deleted: true,
                ..FilterData::with_where(json!({ "created_by_id": key.to_string() }))
            };
            let owned = ctx.storage.count(&Article::TABLE, filter).await?;

            if owned > 0 {
                return Err(ObserverError::Integrity(format!(
                    "User {} cannot be deleted while it owns {} article(s)",
                    key, owned
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::storage::{MemoryStorage, Storage, Write};
    use crate::database::tracker::ChangeTracker;

    async fn run(storage: &MemoryStorage, tracker: &mut ChangeTracker) -> Result<(), ObserverError> {
        let mut ctx = SaveContext::new(chrono::Utc::now(), storage, tracker.entries_mut());
        RestrictOwnedArticlesObserver.execute(&mut ctx).await
    }

    #[tokio::test]
    async fn user_without_articles_may_be_deleted() {
        let storage = MemoryStorage::new();
        let user = User::new("loner", "loner@example.com");
        let mut tracker = ChangeTracker::new();
        tracker.attach(user.clone()).unwrap();
        tracker.remove(user);

        assert!(run(&storage, &mut tracker).await.is_ok());
    }

    #[tokio::test]
    async fn soft_deleted_articles_still_block() {
        let storage = MemoryStorage::new();
        let user = User::new("author", "author@example.com");
        let mut article = Article::new("gone but not forgotten", user.id);
        article.audit.is_deleted = true;
        article.audit.deleted_at = Some(chrono::Utc::now());
        storage
            .apply(vec![
                Write::Insert { table: User::TABLE, row: user.to_row().unwrap() },
                Write::Insert { table: Article::TABLE, row: article.to_row().unwrap() },
            ])
            .await
            .unwrap();

        let mut tracker = ChangeTracker::new();
        tracker.attach(user.clone()).unwrap();
        tracker.remove(user);

        let err = run(&storage, &mut tracker).await.unwrap_err();
        assert!(matches!(err, ObserverError::Integrity(_)));
    }
}
