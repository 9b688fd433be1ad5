use async_trait::async_trait;
use std::time::Duration;

use crate::observer::context::SaveContext;
use crate::observer::error::ObserverError;
use crate::types::EntityState;

/// Observer rings, executed in ascending order during a save
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum ObserverRing {
    Integrity = 2, // Relationship rules, checked before anything is rewritten
    Audit = 7,     // Timestamps and soft-delete conversion
}

/// Base trait for all observers with metadata and applicability checks
pub trait Observer: Send + Sync {
    /// Observer name for logging and debugging
    fn name(&self) -> &'static str;

    /// Which ring this observer belongs to
    fn ring(&self) -> ObserverRing;

    /// Check if observer applies to entries in this state
    fn applies_to_state(&self, state: EntityState) -> bool;

    /// Check if observer applies to this table
    fn applies_to_table(&self, table: &str) -> bool;

    /// Execution timeout (default 5 seconds)
    fn timeout(&self) -> Duration {
        Duration::from_secs(5)
    }

    /// Priority within ring (lower numbers execute first)
    fn priority(&self) -> u8 {
        50
    }
}

/// An observer that runs inside `DbContext::save_changes`, before the
/// physical writes, with mutable access to the pending entries.
#[async_trait]
pub trait SaveObserver: Observer {
    async fn execute(&self, ctx: &mut SaveContext<'_>) -> Result<(), ObserverError>;
}
