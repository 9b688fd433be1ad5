use async_trait::async_trait;
use futures::TryStreamExt;
use serde_json::Value;
use sqlx::postgres::PgArguments;
use sqlx::{PgPool, Postgres, Row as _};

use super::{Storage, Write};
use crate::database::entity::{Row, Table};
use crate::database::{DatabaseError, DatabaseManager};
use crate::filter::{Column, Filter, FilterData};

type PgQuery<'q> = sqlx::query::Query<'q, Postgres, PgArguments>;

/// PostgreSQL backend. Rows travel as JSON (`row_to_json`) and parameters
/// are cast to the declared column types inside the SQL text.
#[derive(Clone)]
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn filter(table: &Table, data: FilterData) -> Result<Filter, DatabaseError> {
        let mut filter = Filter::new(table.name)?;
        filter.columns(table.columns);
        filter.assign(data)?;
        Ok(filter)
    }
}

#[async_trait]
impl Storage for PgStorage {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }

    async fn select(&self, table: &Table, filter: FilterData) -> Result<Vec<Row>, DatabaseError> {
        let sql = Self::filter(table, filter)?.to_json_sql()?;
        tracing::trace!("select on {}: {}", table.name, sql.query);

        let mut query = sqlx::query(&sql.query);
        for param in &sql.params {
            query = bind_json(query, param);
        }

        let mut rows = Vec::new();
        let mut stream = query.fetch(&self.pool);
        while let Some(pg_row) = stream.try_next().await? {
            match pg_row.try_get::<Value, _>("row")? {
                Value::Object(row) => rows.push(row),
                other => {
                    return Err(DatabaseError::QueryError(format!("expected JSON object row, got {}", other)));
                }
            }
        }
        Ok(rows)
    }

    async fn count(&self, table: &Table, filter: FilterData) -> Result<i64, DatabaseError> {
        let sql = Self::filter(table, filter)?.to_count_sql()?;

        let mut query = sqlx::query(&sql.query);
        for param in &sql.params {
            query = bind_json(query, param);
        }
        let row = query.fetch_one(&self.pool).await?;
        Ok(row.try_get::<i64, _>("count")?)
    }

    async fn apply(&self, writes: Vec<Write>) -> Result<usize, DatabaseError> {
        let mut tx = self.pool.begin().await?;
        let mut affected = 0usize;

        for write in &writes {
            match write {
                Write::Insert { table, row } => {
                    let sql = insert_sql(table);
                    let mut query = sqlx::query(&sql);
                    for column in table.columns {
                        query = bind_json(query, row.get(column.name).unwrap_or(&Value::Null));
                    }
                    affected += query.execute(&mut *tx).await?.rows_affected() as usize;
                }
                Write::Update { table, key, row } => {
                    let (sql, columns) = update_sql(table);
                    let mut query = sqlx::query(&sql);
                    for column in &columns {
                        query = bind_json(query, row.get(column.name).unwrap_or(&Value::Null));
                    }
                    let result = query.bind(*key).execute(&mut *tx).await?;
                    if result.rows_affected() == 0 {
                        return Err(DatabaseError::NotFound(format!("{} {}", table.name, key)));
                    }
                    affected += result.rows_affected() as usize;
                }
                Write::Delete { table, key } => {
                    let sql = format!("DELETE FROM \"{}\" WHERE \"{}\" = $1", table.name, Table::KEY_COLUMN);
                    affected += sqlx::query(&sql).bind(*key).execute(&mut *tx).await?.rows_affected() as usize;
                }
            }
        }

        tx.commit().await?;
        Ok(affected)
    }
}

fn placeholder(index: usize, column: &Column) -> String {
    format!("${}::{}", index, column.column_type.sql_cast())
}

fn insert_sql(table: &Table) -> String {
    let names: Vec<String> = table.columns.iter().map(|c| format!("\"{}\"", c.name)).collect();
    let values: Vec<String> = table.columns.iter().enumerate().map(|(i, c)| placeholder(i + 1, c)).collect();
    format!("INSERT INTO \"{}\" ({}) VALUES ({})", table.name, names.join(", "), values.join(", "))
}

/// UPDATE of every non-key column; the key binds last
fn update_sql(table: &Table) -> (String, Vec<Column>) {
    let columns: Vec<Column> = table.columns.iter().filter(|c| c.name != Table::KEY_COLUMN).copied().collect();
    let sets: Vec<String> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| format!("\"{}\" = {}", c.name, placeholder(i + 1, c)))
        .collect();
    let sql = format!(
        "UPDATE \"{}\" SET {} WHERE \"{}\" = ${}",
        table.name,
        sets.join(", "),
        Table::KEY_COLUMN,
        columns.len() + 1
    );
    (sql, columns)
}

fn bind_json<'q>(q: PgQuery<'q>, v: &Value) -> PgQuery<'q> {
    match v {
        Value::Null => {
            let none: Option<String> = None;
            q.bind(none)
        }
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => q.bind(s.clone()),
        Value::Array(_) | Value::Object(_) => q.bind(v.clone()),
    }
}
