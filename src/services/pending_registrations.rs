use chrono::{DateTime, Utc};
use serde_json::json;

use crate::database::models::PendingRegistration;
use crate::database::DbContext;
use crate::services::ServiceError;

/// Confirmation codes waiting to be redeemed, over a borrowed unit of work.
/// Nothing here saves; the caller decides when the changes are written.
pub struct PendingRegistrations<'a> {
    db: &'a mut DbContext,
}

impl<'a> PendingRegistrations<'a> {
    pub fn new(db: &'a mut DbContext) -> Self {
        Self { db }
    }

    pub fn create(&mut self, email: &str, expires_at: DateTime<Utc>) -> Result<PendingRegistration, ServiceError> {
        let registration = PendingRegistration::new(email, expires_at);
        self.db.add(registration.clone())?;
        Ok(registration)
    }

    /// The unconsumed registration for `code`
    pub async fn get_by_code(&mut self, code: &str) -> Result<Option<PendingRegistration>, ServiceError> {
        Ok(self
            .db
            .find_by::<PendingRegistration>(json!({ "confirmation_code": code }))
            .await?
            .into_iter()
            .next())
    }

    /// Mark a code as used. The row is soft-deleted on save and drops out
    /// of every later lookup.
    pub fn consume(&mut self, registration: PendingRegistration) {
        self.db.remove(registration);
    }
}
