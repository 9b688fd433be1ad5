// Ring 7: Audit - timestamps and soft-delete conversion for every audited table
use async_trait::async_trait;

use crate::observer::context::SaveContext;
use crate::observer::error::ObserverError;
use crate::observer::traits::{Observer, ObserverRing, SaveObserver};
use crate::types::EntityState;

/// Stamps audit timestamps and turns delete requests into soft deletes.
///
/// * `Added`: `created_at` and `modified_at` become `now`; `deleted_at` is
///   `now` only if the entity was constructed already deleted.
/// * `Modified`: `modified_at` becomes `now`; `deleted_at` follows
///   `is_deleted`.
/// * `Deleted`: rewritten to `Modified` with `is_deleted = true` and both
///   `deleted_at` and `modified_at` set to `now`. No row is removed.
///
/// Works purely through the audit fields, so every entity type gets the same
/// treatment.
#[derive(Default)]
pub struct AuditTimestampObserver;

impl Observer for AuditTimestampObserver {
    fn name(&self) -> &'static str {
        "AuditTimestampObserver"
    }

    fn ring(&self) -> ObserverRing {
        ObserverRing::Audit
    }

    fn applies_to_state(&self, state: EntityState) -> bool {
        state.is_pending()
    }

    fn applies_to_table(&self, _table: &str) -> bool {
        true // Applies to all tables
    }
}

#[async_trait]
impl SaveObserver for AuditTimestampObserver {
    async fn execute(&self, ctx: &mut SaveContext<'_>) -> Result<(), ObserverError> {
        let now = ctx.now;
        let mut stamped = 0usize;

        for entry in ctx.matching_mut(self) {
            match entry.state() {
                EntityState::Added => {
                    let audit = entry.audit_mut();
                    audit.created_at = now;
                    audit.modified_at = now;
                    audit.deleted_at = audit.is_deleted.then_some(now);
                }
                EntityState::Modified => {
                    let audit = entry.audit_mut();
                    audit.modified_at = now;
                    if !audit.is_deleted {
                        audit.deleted_at = None;
                    } else if audit.deleted_at.is_none() {
                        audit.deleted_at = Some(now);
                    }
                }
                EntityState::Deleted => {
                    entry.set_state(EntityState::Modified);
                    let audit = entry.audit_mut();
                    audit.is_deleted = true;
                    audit.deleted_at = Some(now);
                    audit.modified_at = now;
                    tracing::debug!("Soft delete of {} {}", entry.table().name, entry.key());
                }
                EntityState::Unchanged => continue,
            }
            stamped += 1;
        }

        tracing::debug!("Stamped audit fields on {} entries at {}", stamped, now);
        Ok(())
    }
}
