use chrono::Duration;
use serde::Serialize;

use crate::auth::JwtKeys;
use crate::config::RegistrationConfig;
use crate::database::models::User;
use crate::database::{DbContext, Entity};
use crate::services::pending_registrations::PendingRegistrations;
use crate::services::user_service::UserService;
use crate::services::validation::Validator;
use crate::services::ServiceError;

#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    pub user: User,
    pub jwt: String,
}

/// Registration by emailed confirmation code, and password-less login.
///
/// The password is required on login but never checked: there is no
/// credential store. Anyone who knows a registered email can log in.
pub struct AuthService {
    db: DbContext,
    jwt: JwtKeys,
    registration: RegistrationConfig,
}

impl AuthService {
    pub fn new(db: DbContext, jwt: JwtKeys, registration: RegistrationConfig) -> Self {
        Self { db, jwt, registration }
    }

    /// Store a pending registration and return its confirmation code
    pub async fn register(&mut self, email: &str) -> Result<String, ServiceError> {
        Validator::new().email(email).finish()?;

        if UserService::find_live_by_email(&mut self.db, email).await?.is_some() {
            return Err(ServiceError::validation("Email is already taken"));
        }

        let expires_at = self.db.now() + Duration::hours(self.registration.confirmation_ttl_hours);
        let pending = PendingRegistrations::new(&mut self.db).create(email, expires_at)?;
        self.db.save_changes().await?;

        tracing::info!("Pending registration {} created, expires at {}", pending.id, expires_at);
        Ok(pending.confirmation_code)
    }

    /// Redeem a confirmation code: create the user and consume the code in
    /// one save.
    pub async fn confirm_registration(&mut self, code: &str, username: &str, _password: &str) -> Result<User, ServiceError> {
        Validator::new().username(username).finish()?;

        let pending = PendingRegistrations::new(&mut self.db)
            .get_by_code(code)
            .await?
            .ok_or_else(|| ServiceError::validation("Invalid confirmation code"))?;

        if self.registration.enforce_expiry && pending.is_expired(self.db.now()) {
            tracing::warn!("Confirmation code for registration {} has expired", pending.id);
            return Err(ServiceError::validation("Confirmation code has expired"));
        }

        if UserService::find_live_by_email(&mut self.db, &pending.email).await?.is_some() {
            return Err(ServiceError::validation("Email is already taken"));
        }

        let user = User::new(username.trim(), pending.email.clone());
        let key = user.key();
        self.db.add(user)?;
        PendingRegistrations::new(&mut self.db).consume(pending);
        self.db.save_changes().await?;

        tracing::info!("Registration confirmed for user {}", key);
        self.db
            .entry::<User>(key)
            .ok_or_else(|| ServiceError::Unexpected(format!("user {} is no longer tracked", key)))
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<LoginResult, ServiceError> {
        Validator::new().email_present(email).password(password).finish()?;

        let mut user = UserService::find_live_by_email(&mut self.db, email)
            .await?
            .ok_or_else(|| ServiceError::unauthorized("Invalid email or password"))?;

        let now = self.db.now();
        user.last_login_at = Some(now);
        let key = user.key();
        self.db.update(user)?;
        self.db.save_changes().await?;

        let user = self
            .db
            .entry::<User>(key)
            .ok_or_else(|| ServiceError::Unexpected(format!("user {} is no longer tracked", key)))?;
        let jwt = self.jwt.issue(&user, now)?;

        tracing::debug!("User {} logged in", key);
        Ok(LoginResult { user, jwt })
    }
}
