use serde::{Deserialize, Serialize};

/// Lifecycle state of an entity tracked by a `DbContext`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityState {
    /// Loaded (or saved) and not changed since
    Unchanged,
    /// New entity, inserted on the next save
    Added,
    /// Persisted entity whose fields changed
    Modified,
    /// Removal requested; the audit observer rewrites this into a soft delete
    Deleted,
}

impl EntityState {
    /// True when the next save has to write something for this entry
    pub fn is_pending(&self) -> bool {
        !matches!(self, EntityState::Unchanged)
    }
}
