pub mod memory;
pub mod postgres;

pub use memory::MemoryStorage;
pub use postgres::PgStorage;

use async_trait::async_trait;
use uuid::Uuid;

use crate::database::entity::{Row, Table};
use crate::database::DatabaseError;
use crate::filter::FilterData;

/// One physical write produced by `DbContext::save_changes`
#[derive(Debug, Clone)]
pub enum Write {
    Insert { table: Table, row: Row },
    Update { table: Table, key: Uuid, row: Row },
    Delete { table: Table, key: Uuid },
}

/// Backend the persistence context reads from and writes to.
///
/// Reads take a `FilterData`, so the soft-delete predicate is applied by
/// the backend exactly as the filter layer defines it.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Backend name for logs and the health endpoint
    fn name(&self) -> &'static str;

    async fn ping(&self) -> Result<(), DatabaseError>;

    async fn select(&self, table: &Table, filter: FilterData) -> Result<Vec<Row>, DatabaseError>;

    async fn count(&self, table: &Table, filter: FilterData) -> Result<i64, DatabaseError>;

    /// Apply all writes atomically; returns the number of affected rows
    async fn apply(&self, writes: Vec<Write>) -> Result<usize, DatabaseError>;
}
