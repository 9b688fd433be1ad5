use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use mockable::Clock;

use crate::database::entity::Entity;
use crate::database::models::User;
use crate::database::storage::MemoryStorage;
use crate::database::DbContext;
use crate::observer::ObserverPipeline;

/// Clock pinned to a fixed instant, moved forward explicitly by tests
#[derive(Debug)]
pub struct FixtureClock(Mutex<DateTime<Utc>>);

impl FixtureClock {
    pub fn at(rfc3339: &str) -> Self {
        let instant = DateTime::parse_from_rfc3339(rfc3339)
            .expect("fixture timestamp")
            .with_timezone(&Utc);
        Self(Mutex::new(instant))
    }

    fn lock_clock(&self) -> MutexGuard<'_, DateTime<Utc>> {
        self.0.lock().expect("clock mutex")
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.lock_clock();
        *now += by;
    }

    pub fn advance_seconds(&self, secs: i64) {
        self.advance(Duration::seconds(secs));
    }
}

impl Default for FixtureClock {
    fn default() -> Self {
        Self(Mutex::new(Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()))
    }
}

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

/// Memory storage, fixture clock and the default pipeline wired together
pub struct TestContext {
    pub storage: Arc<MemoryStorage>,
    pub clock: Arc<FixtureClock>,
    pub pipeline: Arc<ObserverPipeline>,
}

impl TestContext {
    pub fn new() -> Self {
        let clock = Arc::new(FixtureClock::default());
        Self {
            storage: Arc::new(MemoryStorage::new()),
            pipeline: Arc::new(ObserverPipeline::with_defaults(clock.clone())),
            clock,
        }
    }

    /// A fresh unit of work over the shared storage
    pub fn db(&self) -> DbContext {
        DbContext::new(self.storage.clone(), self.pipeline.clone())
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.pipeline.now()
    }

    /// Insert a live user through the save pipeline
    pub async fn seed_user(&self, username: &str, email: &str) -> User {
        let mut db = self.db();
        let user = User::new(username, email);
        let key = user.key();
        db.add(user).expect("track seeded user");
        db.save_changes().await.expect("save seeded user");
        db.entry::<User>(key).expect("seeded user is tracked")
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}
