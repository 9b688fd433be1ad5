use async_trait::async_trait;

use crate::services::ServiceError;

/// Outbound notifications sent by the auth flow
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_registration_confirmation(&self, email: &str, code: &str) -> Result<(), ServiceError>;
}

/// Writes the confirmation link to the log instead of sending mail
pub struct LogMailer {
    confirmation_url: String,
}

impl LogMailer {
    pub fn new(confirmation_url: impl Into<String>) -> Self {
        Self {
            confirmation_url: confirmation_url.into(),
        }
    }

    pub fn link(&self, code: &str) -> String {
        format!("{}?code={}", self.confirmation_url, code)
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send_registration_confirmation(&self, email: &str, code: &str) -> Result<(), ServiceError> {
        tracing::info!("Registration confirmation for {}: {}", email, self.link(code));
        Ok(())
    }
}
