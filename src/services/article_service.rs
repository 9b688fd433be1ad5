use serde_json::json;

use crate::database::models::{Article, ArticleId, User, UserId};
use crate::database::{DbContext, Entity};
use crate::services::validation::Validator;
use crate::services::ServiceError;

/// Article CRUD. Deletes are requested like hard deletes; the save
/// pipeline turns them into soft deletes.
pub struct ArticleService {
    db: DbContext,
}

impl ArticleService {
    pub fn new(db: DbContext) -> Self {
        Self { db }
    }

    pub async fn create(&mut self, content: &str, owner: UserId) -> Result<Article, ServiceError> {
        Validator::new().content(content).finish()?;
        self.require_user(owner).await?;

        let article = Article::new(content, owner);
        let key = article.key();
        self.db.add(article)?;
        self.db.save_changes().await?;

        tracing::debug!("User {} created article {}", owner, key);
        self.saved(key)
    }

    pub async fn update(&mut self, id: ArticleId, content: &str, requestor: UserId) -> Result<Article, ServiceError> {
        self.require_user(requestor).await?;
        let mut article = self.find(id).await?;
        if article.created_by_id != requestor {
            return Err(ServiceError::unauthorized("Only the creator is allowed to update an article"));
        }
        Validator::new().content(content).finish()?;

        article.content = content.to_string();
        self.db.update(article)?;
        self.db.save_changes().await?;
        self.saved(id.as_uuid())
    }

    pub async fn delete(&mut self, id: ArticleId, requestor: UserId) -> Result<(), ServiceError> {
        let article = self.find(id).await?;
        if article.created_by_id != requestor {
            return Err(ServiceError::unauthorized("Only the creator is allowed to delete an article"));
        }

        self.db.remove(article);
        self.db.save_changes().await?;

        tracing::debug!("User {} deleted article {}", requestor, id);
        Ok(())
    }

    pub async fn get_by_id(&self, id: ArticleId, include_deleted: bool) -> Result<Article, ServiceError> {
        self.db
            .query::<Article>()
            .filter(json!({ "id": id }))
            .include_deleted(include_deleted)
            .first()
            .await?
            .ok_or_else(|| Self::not_found(id))
    }

    pub async fn get_all_by_owner(&self, owner: UserId, include_deleted: bool) -> Result<Vec<Article>, ServiceError> {
        Ok(self
            .db
            .query::<Article>()
            .filter(json!({ "created_by_id": owner }))
            .order(json!("created_at asc"))
            .include_deleted(include_deleted)
            .all()
            .await?)
    }

    async fn find(&mut self, id: ArticleId) -> Result<Article, ServiceError> {
        self.db.find::<Article>(id.as_uuid()).await?.ok_or_else(|| Self::not_found(id))
    }

    async fn require_user(&mut self, id: UserId) -> Result<User, ServiceError> {
        self.db
            .find::<User>(id.as_uuid())
            .await?
            .ok_or_else(|| ServiceError::unauthorized(format!("User with id {} not found", id)))
    }

    fn not_found(id: ArticleId) -> ServiceError {
        ServiceError::not_found(format!("Article with id {} not found", id))
    }

    fn saved(&self, key: uuid::Uuid) -> Result<Article, ServiceError> {
        self.db
            .entry::<Article>(key)
            .ok_or_else(|| ServiceError::Unexpected(format!("article {} is no longer tracked", key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestContext;

    #[tokio::test]
    async fn create_validates_content_and_owner() {
        let test = TestContext::new();
        let user = test.seed_user("author", "author@example.com").await;

        let err = ArticleService::new(test.db()).create("", user.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let err = ArticleService::new(test.db()).create(&"x".repeat(1001), user.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let err = ArticleService::new(test.db()).create("hello", UserId::new()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn soft_deleted_article_is_only_visible_with_override() {
        let test = TestContext::new();
        let user = test.seed_user("author", "author@example.com").await;
        let article = ArticleService::new(test.db()).create("hello", user.id).await.unwrap();
        assert!(!article.audit.is_deleted);

        ArticleService::new(test.db()).delete(article.id, user.id).await.unwrap();

        let service = ArticleService::new(test.db());
        assert!(matches!(service.get_by_id(article.id, false).await, Err(ServiceError::NotFound(_))));

        let stored = service.get_by_id(article.id, true).await.unwrap();
        assert!(stored.audit.is_deleted);
        assert!(stored.audit.deleted_at.is_some());

        assert!(service.get_all_by_owner(user.id, false).await.unwrap().is_empty());
        assert_eq!(service.get_all_by_owner(user.id, true).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn only_the_owner_may_change_an_article() {
        let test = TestContext::new();
        let owner = test.seed_user("owner", "owner@example.com").await;
        let other = test.seed_user("other", "other@example.com").await;
        let article = ArticleService::new(test.db()).create("mine", owner.id).await.unwrap();

        let err = ArticleService::new(test.db()).update(article.id, "hijacked", other.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));

        let err = ArticleService::new(test.db()).delete(article.id, other.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));

        let unchanged = ArticleService::new(test.db()).get_by_id(article.id, false).await.unwrap();
        assert_eq!(unchanged.content, "mine");
    }

    #[tokio::test]
    async fn update_stamps_modified_at() {
        let test = TestContext::new();
        let owner = test.seed_user("owner", "owner@example.com").await;
        let article = ArticleService::new(test.db()).create("draft", owner.id).await.unwrap();

        test.clock.advance_seconds(120);
        let updated = ArticleService::new(test.db()).update(article.id, "final", owner.id).await.unwrap();

        assert_eq!(updated.content, "final");
        assert_eq!(updated.audit.created_at, article.audit.created_at);
        assert_eq!(updated.audit.modified_at, test.now());
    }

    #[tokio::test]
    async fn missing_article_is_not_found() {
        let test = TestContext::new();
        let owner = test.seed_user("owner", "owner@example.com").await;
        let mut service = ArticleService::new(test.db());

        assert!(matches!(service.delete(ArticleId::new(), owner.id).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(service.update(ArticleId::new(), "x", owner.id).await, Err(ServiceError::NotFound(_))));
    }
}
