use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::normalize_email;
use super::PendingRegistrationId;
use crate::database::entity::{audited_columns, AuditFields, Auditable, Entity, Table};

/// An email address waiting for its confirmation code to be redeemed.
/// Consumed registrations are soft-deleted, so the query filter hides them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingRegistration {
    pub id: PendingRegistrationId,
    pub email: String,
    pub confirmation_code: String,
    pub expires_at: DateTime<Utc>,
    #[serde(flatten)]
    pub audit: AuditFields,
}

impl PendingRegistration {
    pub fn new(email: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            id: PendingRegistrationId::new(),
            email: normalize_email(&email.into()),
            confirmation_code: Uuid::new_v4().to_string(),
            expires_at,
            audit: AuditFields::new(),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

impl Auditable for PendingRegistration {
    fn audit(&self) -> &AuditFields {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut AuditFields {
        &mut self.audit
    }
}

impl Entity for PendingRegistration {
    const TABLE: Table = Table {
        name: "pending_registrations",
        columns: audited_columns![
            ("id", Uuid),
            ("email", Text),
            ("confirmation_code", Text),
            ("expires_at", Timestamp),
        ],
    };

    fn key(&self) -> Uuid {
        self.id.as_uuid()
    }
}
