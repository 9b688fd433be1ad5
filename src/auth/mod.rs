use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::JwtConfig;
use crate::database::models::User;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub userid: Uuid,
    pub username: String,
    pub email: String,
    pub iss: String,
    pub aud: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn for_user(user: &User, config: &JwtConfig, now: DateTime<Utc>) -> Self {
        Self {
            userid: user.id.as_uuid(),
            username: user.username.clone(),
            email: user.email.clone(),
            iss: config.issuer.clone(),
            aud: config.audience.clone(),
            exp: (now + Duration::minutes(config.expires_in_minutes)).timestamp(),
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),

    #[error("JWT secret not configured")]
    InvalidSecret,
}

/// HS256 signing and verification keys plus the claim rules they enforce
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    config: JwtConfig,
}

impl JwtKeys {
    pub fn from_config(config: &JwtConfig) -> Result<Self, JwtError> {
        let secret = config
            .secret
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or(JwtError::InvalidSecret)?;

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            config: config.clone(),
        })
    }

    /// Sign a token for `user`, valid for the configured number of minutes
    pub fn issue(&self, user: &User, now: DateTime<Utc>) -> Result<String, JwtError> {
        let claims = Claims::for_user(user, &self.config, now);
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| JwtError::TokenGeneration(e.to_string()))
    }

    /// Check signature, expiry, issuer and audience
    pub fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_audience(&[&self.config.audience]);

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| JwtError::InvalidToken(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn keys() -> JwtKeys {
        JwtKeys::from_config(&AppConfig::development().jwt).unwrap()
    }

    #[test]
    fn issued_token_round_trips_claims() {
        let user = User::new("writer", "writer@example.com");
        let token = keys().issue(&user, Utc::now()).unwrap();

        let claims = keys().verify(&token).unwrap();
        assert_eq!(claims.userid, user.id.as_uuid());
        assert_eq!(claims.username, "writer");
        assert_eq!(claims.email, "writer@example.com");
    }

    #[test]
    fn expired_token_is_rejected() {
        let user = User::new("writer", "writer@example.com");
        let token = keys().issue(&user, Utc::now() - Duration::days(30)).unwrap();
        assert!(matches!(keys().verify(&token), Err(JwtError::InvalidToken(_))));
    }

    #[test]
    fn wrong_audience_is_rejected() {
        let mut other = AppConfig::development().jwt;
        other.audience = "someone-else".to_string();
        let token = JwtKeys::from_config(&other)
            .unwrap()
            .issue(&User::new("writer", "writer@example.com"), Utc::now())
            .unwrap();
        assert!(keys().verify(&token).is_err());
    }

    #[test]
    fn missing_secret_is_an_error() {
        let config = AppConfig::production().jwt;
        assert!(matches!(JwtKeys::from_config(&config), Err(JwtError::InvalidSecret)));
    }
}
