use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::database::DatabaseError;
use crate::filter::Column;

/// One stored row as a JSON object keyed by column name
pub type Row = Map<String, Value>;

/// Audit columns carried by every persisted entity.
///
/// Invariants kept by the save pipeline: `deleted_at` is set iff
/// `is_deleted`, and `created_at <= modified_at`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AuditFields {
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl AuditFields {
    /// Fields for a row that has not been saved yet; the audit observer
    /// stamps the timestamps on insert.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Access to the audit columns of an entity. This is the only thing the
/// audit observer needs to know about a type.
pub trait Auditable {
    fn audit(&self) -> &AuditFields;
    fn audit_mut(&mut self) -> &mut AuditFields;
}

/// Static table description: name plus typed columns
#[derive(Debug, Clone, Copy)]
pub struct Table {
    pub name: &'static str,
    pub columns: &'static [Column],
}

impl Table {
    pub const KEY_COLUMN: &'static str = "id";
}

/// A persisted, audited type the `DbContext` can track and store
pub trait Entity: Auditable + Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const TABLE: Table;

    fn key(&self) -> Uuid;

    fn to_row(&self) -> Result<Row, DatabaseError> {
        match serde_json::to_value(self)? {
            Value::Object(row) => Ok(row),
            other => Err(DatabaseError::QueryError(format!(
                "{} did not serialize to an object: {}",
                Self::TABLE.name,
                other
            ))),
        }
    }

    fn from_row(row: Row) -> Result<Self, DatabaseError> {
        Ok(serde_json::from_value(Value::Object(row))?)
    }
}

/// Column list of an audited table: the given columns followed by the four
/// audit columns.
macro_rules! audited_columns {
    ($(($name:literal, $ty:ident)),* $(,)?) => {
        &[
            $($crate::filter::Column::new($name, $crate::filter::ColumnType::$ty),)*
            $crate::filter::Column::new("is_deleted", $crate::filter::ColumnType::Boolean),
            $crate::filter::Column::new("created_at", $crate::filter::ColumnType::Timestamp),
            $crate::filter::Column::new("modified_at", $crate::filter::ColumnType::Timestamp),
            $crate::filter::Column::new("deleted_at", $crate::filter::ColumnType::Timestamp),
        ]
    };
}
pub(crate) use audited_columns;
