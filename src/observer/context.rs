use chrono::{DateTime, Utc};
use std::time::Instant;

use crate::database::storage::Storage;
use crate::database::tracker::EntityEntry;
use crate::observer::traits::{Observer, ObserverRing};

/// State shared by the observers of one `save_changes` call
pub struct SaveContext<'a> {
    /// Captured once per save; every stamped timestamp uses this value
    pub now: DateTime<Utc>,
    pub storage: &'a dyn Storage,
    pub current_ring: Option<ObserverRing>,
    pub start_time: Instant,
    entries: &'a mut [EntityEntry],
}

impl<'a> SaveContext<'a> {
    pub fn new(now: DateTime<Utc>, storage: &'a dyn Storage, entries: &'a mut [EntityEntry]) -> Self {
        Self {
            now,
            storage,
            current_ring: None,
            start_time: Instant::now(),
            entries,
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = &EntityEntry> {
        self.entries.iter()
    }

    /// Pending entries the observer applies to, by state and table
    pub fn matching<'s, O: Observer + ?Sized>(&'s self, observer: &'s O) -> impl Iterator<Item = &'s EntityEntry> + 's {
        self.entries.iter().filter(move |e| Self::applies(observer, e))
    }

    pub fn matching_mut<'s, O: Observer + ?Sized>(&'s mut self, observer: &'s O) -> impl Iterator<Item = &'s mut EntityEntry> + 's {
        self.entries.iter_mut().filter(move |e| Self::applies(observer, e))
    }

    pub fn has_matching<O: Observer + ?Sized>(&self, observer: &O) -> bool {
        self.entries.iter().any(|e| Self::applies(observer, e))
    }

    fn applies<O: Observer + ?Sized>(observer: &O, entry: &EntityEntry) -> bool {
        entry.state().is_pending()
            && observer.applies_to_state(entry.state())
            && observer.applies_to_table(entry.table().name)
    }

    pub fn execution_time(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }
}
