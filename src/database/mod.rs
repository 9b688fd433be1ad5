pub mod context;
pub mod entity;
pub mod manager;
pub mod models;
pub mod query;
pub mod storage;
pub mod tracker;

pub use context::DbContext;
pub use entity::{AuditFields, Auditable, Entity, Row, Table};
pub use manager::{DatabaseError, DatabaseManager};
pub use query::EntityQuery;
pub use storage::{MemoryStorage, PgStorage, Storage, Write};
pub use tracker::ChangeTracker;
