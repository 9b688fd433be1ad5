use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::UserId;
use crate::database::entity::{audited_columns, AuditFields, Auditable, Entity, Table};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub last_login_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub audit: AuditFields,
}

/// Canonical form of an email address: one mailbox is one account, so
/// addresses are stored and compared trimmed and lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl User {
    pub fn new(username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: UserId::new(),
            username: username.into(),
            email: normalize_email(&email.into()),
            last_login_at: None,
            audit: AuditFields::new(),
        }
    }
}

impl Auditable for User {
    fn audit(&self) -> &AuditFields {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut AuditFields {
        &mut self.audit
    }
}

impl Entity for User {
    const TABLE: Table = Table {
        name: "users",
        columns: audited_columns![
            ("id", Uuid),
            ("username", Text),
            ("email", Text),
            ("last_login_at", Timestamp),
        ],
    };

    fn key(&self) -> Uuid {
        self.id.as_uuid()
    }
}
