// Observer pipeline run by DbContext::save_changes before any row is written

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, SubsecRound, Utc};
use mockable::{Clock, DefaultClock};
use tokio::time::timeout;

use crate::database::storage::Storage;
use crate::database::tracker::EntityEntry;
use crate::observer::context::SaveContext;
use crate::observer::error::ObserverError;
use crate::observer::implementations::{AuditTimestampObserver, RestrictOwnedArticlesObserver};
use crate::observer::traits::{ObserverRing, SaveObserver};

/// Executes registered observers ring by ring over the pending entries of
/// one save. An error in any ring aborts the save before storage is touched.
pub struct ObserverPipeline {
    observers: BTreeMap<ObserverRing, Vec<Box<dyn SaveObserver>>>,
    clock: Arc<dyn Clock>,
}

impl ObserverPipeline {
    /// Empty pipeline; observers are added with `register_observer`
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            observers: BTreeMap::new(),
            clock,
        }
    }

    /// Pipeline with the standard observers: the owned-articles restriction
    /// and audit timestamping with soft delete.
    pub fn with_defaults(clock: Arc<dyn Clock>) -> Self {
        let mut pipeline = Self::new(clock);
        pipeline.register_observer(Box::new(RestrictOwnedArticlesObserver));
        pipeline.register_observer(Box::new(AuditTimestampObserver));
        pipeline
    }

    pub fn register_observer(&mut self, observer: Box<dyn SaveObserver>) {
        let ring = observer.ring();
        let name = observer.name();
        let observers = self.observers.entry(ring).or_default();
        observers.push(observer);
        observers.sort_by_key(|o| o.priority());

        tracing::debug!("Registered observer '{}' for ring {:?}", name, ring);
    }

    /// Current time from the pipeline clock, truncated to microseconds so it
    /// survives a round trip through PostgreSQL unchanged.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.utc().trunc_subsecs(6)
    }

    pub async fn execute(&self, entries: &mut [EntityEntry], storage: &dyn Storage) -> Result<(), ObserverError> {
        let mut ctx = SaveContext::new(self.now(), storage, entries);

        tracing::debug!(
            "Observer pipeline starting: entries={}, now={}",
            ctx.entries().filter(|e| e.state().is_pending()).count(),
            ctx.now
        );

        for (&ring, observers) in &self.observers {
            ctx.current_ring = Some(ring);
            let mut errors = Vec::new();

            for observer in observers {
                if !ctx.has_matching(&**observer) {
                    tracing::trace!("Observer {} skipped - no matching entries", observer.name());
                    continue;
                }

                let observer_start = Instant::now();
                match timeout(observer.timeout(), observer.execute(&mut ctx)).await {
                    Ok(Ok(())) => {
                        tracing::debug!("Observer: {} completed in {:?}", observer.name(), observer_start.elapsed());
                    }
                    Ok(Err(error)) => {
                        tracing::warn!("Observer: {} failed in {:?}: {}", observer.name(), observer_start.elapsed(), error);
                        errors.push(error);
                    }
                    Err(_elapsed) => {
                        tracing::error!("Observer: {} timed out after {:?}", observer.name(), observer.timeout());
                        errors.push(ObserverError::Timeout(format!(
                            "Observer {} timed out after {:?}",
                            observer.name(),
                            observer.timeout()
                        )));
                    }
                }
            }

            if let Some(first) = errors.into_iter().next() {
                tracing::warn!("Observer pipeline stopped at ring {:?}", ring);
                return Err(first);
            }
        }

        tracing::debug!("Observer pipeline finished in {:?}", ctx.execution_time());
        Ok(())
    }
}

impl Default for ObserverPipeline {
    fn default() -> Self {
        Self::with_defaults(Arc::new(DefaultClock))
    }
}
