use std::any::Any;

use uuid::Uuid;

use crate::database::entity::{AuditFields, Auditable, Entity, Row, Table};
use crate::database::storage::Write;
use crate::database::DatabaseError;
use crate::types::EntityState;

/// Object-safe view of an [`Entity`] held by the change tracker
pub trait TrackedEntity: Auditable + Send + Sync {
    fn entity_table(&self) -> Table;
    fn entity_key(&self) -> Uuid;
    fn entity_row(&self) -> Result<Row, DatabaseError>;
    fn as_any(&self) -> &dyn Any;
}

impl<T: Entity> TrackedEntity for T {
    fn entity_table(&self) -> Table {
        T::TABLE
    }

    fn entity_key(&self) -> Uuid {
        self.key()
    }

    fn entity_row(&self) -> Result<Row, DatabaseError> {
        self.to_row()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A tracked entity, its state, and the row it had when loaded or last saved
pub struct EntityEntry {
    state: EntityState,
    entity: Box<dyn TrackedEntity>,
    snapshot: Option<Row>,
}

impl EntityEntry {
    fn new<T: Entity>(entity: T, state: EntityState, snapshot: Option<Row>) -> Self {
        Self { state, entity: Box::new(entity), snapshot }
    }

    pub fn state(&self) -> EntityState {
        self.state
    }

    pub fn set_state(&mut self, state: EntityState) {
        self.state = state;
    }

    pub fn table(&self) -> Table {
        self.entity.entity_table()
    }

    pub fn key(&self) -> Uuid {
        self.entity.entity_key()
    }

    pub fn audit(&self) -> &AuditFields {
        self.entity.audit()
    }

    pub fn audit_mut(&mut self) -> &mut AuditFields {
        self.entity.audit_mut()
    }

    pub fn entity<T: Entity>(&self) -> Option<&T> {
        self.entity.as_any().downcast_ref::<T>()
    }

    fn is<T: Entity>(&self, key: Uuid) -> bool {
        self.table().name == T::TABLE.name && self.key() == key
    }

    fn has_changed(&self) -> Result<bool, DatabaseError> {
        match &self.snapshot {
            Some(snapshot) => Ok(&self.entity.entity_row()? != snapshot),
            None => Ok(true),
        }
    }
}

impl std::fmt::Debug for EntityEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityEntry")
            .field("table", &self.table().name)
            .field("key", &self.key())
            .field("state", &self.state)
            .finish()
    }
}

/// Unit-of-work bookkeeping for one `DbContext`
#[derive(Default, Debug)]
pub struct ChangeTracker {
    entries: Vec<EntityEntry>,
}

impl ChangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn position<T: Entity>(&self, key: Uuid) -> Option<usize> {
        self.entries.iter().position(|e| e.is::<T>(key))
    }

    /// Start tracking a loaded entity as `Unchanged`
    pub fn attach<T: Entity>(&mut self, entity: T) -> Result<(), DatabaseError> {
        let snapshot = entity.to_row()?;
        match self.position::<T>(entity.key()) {
            Some(i) => self.entries[i] = EntityEntry::new(entity, EntityState::Unchanged, Some(snapshot)),
            None => self.entries.push(EntityEntry::new(entity, EntityState::Unchanged, Some(snapshot))),
        }
        Ok(())
    }

    pub fn add<T: Entity>(&mut self, entity: T) -> Result<(), DatabaseError> {
        if self.position::<T>(entity.key()).is_some() {
            return Err(DatabaseError::Conflict(format!("{} {} is already tracked", T::TABLE.name, entity.key())));
        }
        self.entries.push(EntityEntry::new(entity, EntityState::Added, None));
        Ok(())
    }

    /// Replace the tracked copy. A loaded entity becomes `Modified` only if
    /// its row differs from the snapshot; an untracked one is attached as
    /// `Modified`.
    pub fn update<T: Entity>(&mut self, entity: T) -> Result<(), DatabaseError> {
        match self.position::<T>(entity.key()) {
            Some(i) => {
                let entry = &mut self.entries[i];
                let state = entry.state;
                entry.entity = Box::new(entity);
                entry.state = match state {
                    EntityState::Added => EntityState::Added,
                    _ if entry.has_changed()? => EntityState::Modified,
                    _ => EntityState::Unchanged,
                };
            }
            None => self.entries.push(EntityEntry::new(entity, EntityState::Modified, None)),
        }
        Ok(())
    }

    /// Mark for deletion; an entity that was only added is simply dropped
    pub fn remove<T: Entity>(&mut self, entity: T) {
        match self.position::<T>(entity.key()) {
            Some(i) if self.entries[i].state == EntityState::Added => {
                self.entries.remove(i);
            }
            Some(i) => {
                let entry = &mut self.entries[i];
                entry.entity = Box::new(entity);
                entry.state = EntityState::Deleted;
            }
            None => self.entries.push(EntityEntry::new(entity, EntityState::Deleted, None)),
        }
    }

    pub fn get<T: Entity>(&self, key: Uuid) -> Option<&T> {
        self.position::<T>(key).and_then(|i| self.entries[i].entity::<T>())
    }

    pub fn state_of<T: Entity>(&self, key: Uuid) -> Option<EntityState> {
        self.position::<T>(key).map(|i| self.entries[i].state)
    }

    /// Promote `Unchanged` entries whose row drifted from the snapshot
    pub fn detect_changes(&mut self) -> Result<(), DatabaseError> {
        for entry in &mut self.entries {
            if entry.state == EntityState::Unchanged && entry.has_changed()? {
                entry.state = EntityState::Modified;
            }
        }
        Ok(())
    }

    pub fn has_pending(&self) -> bool {
        self.entries.iter().any(|e| e.state.is_pending())
    }

    pub fn entries_mut(&mut self) -> &mut [EntityEntry] {
        &mut self.entries
    }

    /// Physical writes for every pending entry, in tracking order
    pub fn writes(&self) -> Result<Vec<Write>, DatabaseError> {
        let mut writes = Vec::new();
        for entry in &self.entries {
            let table = entry.table();
            match entry.state {
                EntityState::Unchanged => {}
                EntityState::Added => writes.push(Write::Insert { table, row: entry.entity.entity_row()? }),
                EntityState::Modified => writes.push(Write::Update { table, key: entry.key(), row: entry.entity.entity_row()? }),
                EntityState::Deleted => writes.push(Write::Delete { table, key: entry.key() }),
            }
        }
        Ok(writes)
    }

    /// After a successful save: drop removed rows, snapshot the rest
    pub fn accept_all(&mut self) -> Result<(), DatabaseError> {
        self.entries.retain(|e| e.state != EntityState::Deleted);
        for entry in &mut self.entries {
            entry.snapshot = Some(entry.entity.entity_row()?);
            entry.state = EntityState::Unchanged;
        }
        Ok(())
    }

    pub fn into_entries(self) -> Vec<EntityEntry> {
        self.entries
    }
}
