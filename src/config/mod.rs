use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

/// Development-only signing secret; production must set `JWT_SECRET`
const DEV_JWT_SECRET: &str = "bloqqer-development-secret-change-me";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub jwt: JwtConfig,
    pub registration: RegistrationConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(skip_serializing)]
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub enable_request_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// HS256 shared secret; `None` when nothing is configured
    #[serde(skip_serializing)]
    pub secret: Option<String>,
    pub issuer: String,
    pub audience: String,
    pub expires_in_minutes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationConfig {
    pub confirmation_ttl_hours: i64,
    /// Reject confirmation codes past `expires_at`
    pub enforce_expiry: bool,
    /// Link sent to the user; the code is appended as `?code=`
    pub confirmation_url: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    pub fn with_env_overrides(mut self) -> Self {
        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Ok(v) = env::var("DATABASE_RUN_MIGRATIONS") {
            self.database.run_migrations = v.parse().unwrap_or(self.database.run_migrations);
        }

        // API overrides
        if let Ok(v) = env::var("BLOQQER_API_PORT").or_else(|_| env::var("PORT")) {
            self.api.port = v.parse().unwrap_or(self.api.port);
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        // JWT overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            self.jwt.secret = Some(v);
        }
        if let Ok(v) = env::var("JWT_ISSUER") {
            self.jwt.issuer = v;
        }
        if let Ok(v) = env::var("JWT_AUDIENCE") {
            self.jwt.audience = v;
        }
        if let Ok(v) = env::var("JWT_EXPIRES_IN_MINUTES") {
            self.jwt.expires_in_minutes = v.parse().unwrap_or(self.jwt.expires_in_minutes);
        }

        // Registration overrides
        if let Ok(v) = env::var("REGISTRATION_TTL_HOURS") {
            self.registration.confirmation_ttl_hours = v.parse().unwrap_or(self.registration.confirmation_ttl_hours);
        }
        if let Ok(v) = env::var("REGISTRATION_ENFORCE_EXPIRY") {
            self.registration.enforce_expiry = v.parse().unwrap_or(self.registration.enforce_expiry);
        }
        if let Ok(v) = env::var("REGISTRATION_CONFIRMATION_URL") {
            self.registration.confirmation_url = v;
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
                run_migrations: true,
            },
            api: ApiConfig {
                port: 5000,
                enable_request_logging: true,
            },
            security: SecurityConfig {
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
            },
            jwt: JwtConfig {
                secret: Some(DEV_JWT_SECRET.to_string()),
                issuer: "bloqqer".to_string(),
                audience: "bloqqer".to_string(),
                expires_in_minutes: 60 * 24 * 7, // 1 week
            },
            registration: RegistrationConfig {
                confirmation_ttl_hours: 24,
                enforce_expiry: true,
                confirmation_url: "http://localhost:3000/register/confirm".to_string(),
            },
        }
    }

    pub fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 10,
                run_migrations: true,
            },
            api: ApiConfig {
                port: 5000,
                enable_request_logging: true,
            },
            security: SecurityConfig {
                cors_origins: vec!["https://staging.bloqqer.example.com".to_string()],
            },
            jwt: JwtConfig {
                secret: None,
                issuer: "bloqqer".to_string(),
                audience: "bloqqer".to_string(),
                expires_in_minutes: 60 * 24,
            },
            registration: RegistrationConfig {
                confirmation_ttl_hours: 24,
                enforce_expiry: true,
                confirmation_url: "https://staging.bloqqer.example.com/register/confirm".to_string(),
            },
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                connection_timeout: 5,
                run_migrations: false,
            },
            api: ApiConfig {
                port: 5000,
                enable_request_logging: false,
            },
            security: SecurityConfig {
                cors_origins: vec!["https://bloqqer.example.com".to_string()],
            },
            jwt: JwtConfig {
                secret: None,
                issuer: "bloqqer".to_string(),
                audience: "bloqqer".to_string(),
                expires_in_minutes: 60 * 4,
            },
            registration: RegistrationConfig {
                confirmation_ttl_hours: 24,
                enforce_expiry: true,
                confirmation_url: "https://bloqqer.example.com/register/confirm".to_string(),
            },
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
