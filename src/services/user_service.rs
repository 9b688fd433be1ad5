use serde_json::json;

use crate::database::models::user::normalize_email;
use crate::database::models::{User, UserId};
use crate::database::{DbContext, Entity};
use crate::services::validation::Validator;
use crate::services::ServiceError;

pub struct UserService {
    db: DbContext,
}

impl UserService {
    pub fn new(db: DbContext) -> Self {
        Self { db }
    }

    pub async fn create(&mut self, username: &str, email: &str) -> Result<User, ServiceError> {
        Validator::new().username(username).email(email).finish()?;

        if Self::find_live_by_email(&mut self.db, email).await?.is_some() {
            return Err(ServiceError::validation("Email is already taken"));
        }

        let user = User::new(username.trim(), email);
        let key = user.key();
        self.db.add(user)?;
        self.db.save_changes().await?;

        tracing::info!("Created user {}", key);
        self.saved(key)
    }

    pub async fn get_by_id(&mut self, id: UserId) -> Result<User, ServiceError> {
        self.db
            .find::<User>(id.as_uuid())
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("User with ID {} not found", id)))
    }

    pub async fn get_by_email(&mut self, email: &str) -> Result<User, ServiceError> {
        Self::find_live_by_email(&mut self.db, email)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("User with email {} not found", email)))
    }

    /// Rename a user. Only the user themselves may do this.
    pub async fn update(&mut self, id: UserId, username: &str, requestor: UserId) -> Result<User, ServiceError> {
        Validator::new().username(username).finish()?;

        let mut user = self.get_by_id(id).await?;
        if requestor != id {
            return Err(ServiceError::unauthorized("Users are only allowed to update their own profile"));
        }

        user.username = username.trim().to_string();
        self.db.update(user)?;
        self.db.save_changes().await?;
        self.saved(id.as_uuid())
    }

    /// The live user registered under `email`, tracked in `db`
    pub(crate) async fn find_live_by_email(db: &mut DbContext, email: &str) -> Result<Option<User>, ServiceError> {
        let email = normalize_email(email);
        Ok(db.find_by::<User>(json!({ "email": email })).await?.into_iter().next())
    }

    fn saved(&self, key: uuid::Uuid) -> Result<User, ServiceError> {
        self.db
            .entry::<User>(key)
            .ok_or_else(|| ServiceError::Unexpected(format!("user {} is no longer tracked", key)))
    }
}
