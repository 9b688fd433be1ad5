// Input rules shared by the services. Every failed rule is reported, one
// message per line.

use crate::database::models::article::CONTENT_MAX_CHARS;
use crate::services::ServiceError;

pub const USERNAME_MIN_CHARS: usize = 5;
pub const USERNAME_MAX_CHARS: usize = 50;
pub const EMAIL_MAX_CHARS: usize = 320;

#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<String>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(&mut self, content: &str) -> &mut Self {
        if content.trim().is_empty() {
            self.errors.push("Content is required".to_string());
        } else if content.chars().count() > CONTENT_MAX_CHARS {
            self.errors.push(format!("Content must be at most {} characters", CONTENT_MAX_CHARS));
        }
        self
    }

    pub fn username(&mut self, username: &str) -> &mut Self {
        let len = username.trim().chars().count();
        if len == 0 {
            self.errors.push("Username is required".to_string());
        } else if !(USERNAME_MIN_CHARS..=USERNAME_MAX_CHARS).contains(&len) {
            self.errors.push(format!(
                "Username must be between {} and {} characters",
                USERNAME_MIN_CHARS, USERNAME_MAX_CHARS
            ));
        }
        self
    }

    pub fn email(&mut self, email: &str) -> &mut Self {
        if email.trim().is_empty() {
            self.errors.push("Email is required".to_string());
        } else if email.trim().chars().count() > EMAIL_MAX_CHARS {
            self.errors.push(format!("Email must be at most {} characters", EMAIL_MAX_CHARS));
        } else if !is_email(email.trim()) {
            self.errors.push("Email is not a valid email address".to_string());
        }
        self
    }

    /// Presence only; login looks the address up instead of judging its shape
    pub fn email_present(&mut self, email: &str) -> &mut Self {
        if email.trim().is_empty() {
            self.errors.push("Email is required".to_string());
        }
        self
    }

    pub fn password(&mut self, password: &str) -> &mut Self {
        if password.is_empty() {
            self.errors.push("Password is required".to_string());
        }
        self
    }

    pub fn finish(&mut self) -> Result<(), ServiceError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::Validation(std::mem::take(&mut self.errors).join("\n")))
        }
    }
}

/// Shape check only: one `@` with a non-empty local part and a dotted domain
fn is_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.split('.').count() >= 2
                && domain.split('.').all(|label| !label.is_empty())
        }
        None => false,
    }
}
