use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Storage, Write};
use crate::database::entity::{Row, Table};
use crate::database::DatabaseError;
use crate::filter::{FilterData, FilterOrder, FilterWhere, FilterWhereOptions, RowMatcher};

/// In-process backend for tests and `--in-memory` runs. Rows keep insertion
/// order per table; reads go through the same where language and
/// soft-delete rule as the PostgreSQL backend.
#[derive(Default)]
pub struct MemoryStorage {
    tables: RwLock<HashMap<&'static str, Vec<Row>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored row of a table, soft-deleted ones included
    pub async fn raw_rows(&self, table: &Table) -> Vec<Row> {
        self.tables.read().await.get(table.name).cloned().unwrap_or_default()
    }

    fn row_key(row: &Row) -> Option<Uuid> {
        row.get(Table::KEY_COLUMN)
            .and_then(Value::as_str)
            .and_then(|s| Uuid::parse_str(s).ok())
    }

    fn filtered(rows: &[Row], table: &Table, filter: &FilterData) -> Result<Vec<Row>, DatabaseError> {
        if let Some(where_data) = &filter.where_clause {
            FilterWhere::validate(where_data)?;
        }
        let matcher = RowMatcher::new(table.columns);
        let options = FilterWhereOptions { include_deleted: filter.include_deleted };

        let mut out = Vec::new();
        for row in rows {
            if matcher.matches(row, filter.where_clause.as_ref(), &options)? {
                out.push(row.clone());
            }
        }
        Ok(out)
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        Ok(())
    }

    async fn select(&self, table: &Table, filter: FilterData) -> Result<Vec<Row>, DatabaseError> {
        let tables = self.tables.read().await;
        let rows = tables.get(table.name).map(Vec::as_slice).unwrap_or_default();
        let mut out = Self::filtered(rows, table, &filter)?;

        if let Some(order) = &filter.order {
            let order = FilterOrder::validate_and_parse(order)?;
            RowMatcher::new(table.columns).sort(&mut out, &order);
        }

        let offset = filter.offset.unwrap_or(0).max(0) as usize;
        let out = out.into_iter().skip(offset);
        Ok(match filter.limit {
            Some(limit) => out.take(limit.max(0) as usize).collect(),
            None => out.collect(),
        })
    }

    async fn count(&self, table: &Table, filter: FilterData) -> Result<i64, DatabaseError> {
        let tables = self.tables.read().await;
        let rows = tables.get(table.name).map(Vec::as_slice).unwrap_or_default();
        Ok(Self::filtered(rows, table, &filter)?.len() as i64)
    }

    async fn apply(&self, writes: Vec<Write>) -> Result<usize, DatabaseError> {
        let mut tables = self.tables.write().await;

        // Work on a copy so a failing write leaves nothing behind
        let mut staged = tables.clone();
        let mut affected = 0usize;

        for write in writes {
            match write {
                Write::Insert { table, row } => {
                    let key = Self::row_key(&row)
                        .ok_or_else(|| DatabaseError::QueryError(format!("{} row without id", table.name)))?;
                    let rows = staged.entry(table.name).or_default();
                    if rows.iter().any(|r| Self::row_key(r) == Some(key)) {
                        return Err(DatabaseError::Conflict(format!("duplicate key {} in {}", key, table.name)));
                    }
                    rows.push(row);
                }
                Write::Update { table, key, row } => {
                    let existing = staged
                        .get_mut(table.name)
                        .and_then(|rows| rows.iter_mut().find(|r| Self::row_key(r) == Some(key)))
                        .ok_or_else(|| DatabaseError::NotFound(format!("{} {}", table.name, key)))?;
                    *existing = row;
                }
                Write::Delete { table, key } => {
                    if let Some(rows) = staged.get_mut(table.name) {
                        rows.retain(|r| Self::row_key(r) != Some(key));
                    }
                }
            }
            affected += 1;
        }

        *tables = staged;
        Ok(affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::entity::Entity;
    use crate::database::models::{Article, UserId};
    use serde_json::json;

    fn article_row(content: &str, deleted: bool) -> (Uuid, Row) {
        let mut article = Article::new(content, UserId::new());
        article.audit.is_deleted = deleted;
        (article.key(), article.to_row().unwrap())
    }

    #[tokio::test]
    async fn select_hides_deleted_rows_by_default() {
        let storage = MemoryStorage::new();
        let (_, live) = article_row("live", false);
        let (_, gone) = article_row("gone", true);
        storage
            .apply(vec![
                Write::Insert { table: Article::TABLE, row: live },
                Write::Insert { table: Article::TABLE, row: gone },
            ])
            .await
            .unwrap();

        let visible = storage.select(&Article::TABLE, FilterData::default()).await.unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0]["content"], json!("live"));

        let all = FilterData { include_deleted: true, ..Default::default() };
        assert_eq!(storage.count(&Article::TABLE, all).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn failed_batch_leaves_storage_untouched() {
        let storage = MemoryStorage::new();
        let (key, row) = article_row("first", false);
        let (_, other) = article_row("second", false);

        let result = storage
            .apply(vec![
                Write::Insert { table: Article::TABLE, row: other },
                Write::Update { table: Article::TABLE, key, row },
            ])
            .await;

        assert!(matches!(result, Err(DatabaseError::NotFound(_))));
        assert!(storage.raw_rows(&Article::TABLE).await.is_empty());
    }

    #[tokio::test]
    async fn duplicate_insert_is_a_conflict() {
        let storage = MemoryStorage::new();
        let (_, row) = article_row("dup", false);
        storage.apply(vec![Write::Insert { table: Article::TABLE, row: row.clone() }]).await.unwrap();

        let result = storage.apply(vec![Write::Insert { table: Article::TABLE, row }]).await;
        assert!(matches!(result, Err(DatabaseError::Conflict(_))));
    }

    #[tokio::test]
    async fn order_limit_and_offset() {
        let storage = MemoryStorage::new();
        let writes = ["b", "a", "c"]
            .into_iter()
            .map(|c| Write::Insert { table: Article::TABLE, row: article_row(c, false).1 })
            .collect();
        storage.apply(writes).await.unwrap();

        let filter = FilterData { order: Some(json!("content asc")), limit: Some(2), offset: Some(1), ..Default::default() };
        let rows = storage.select(&Article::TABLE, filter).await.unwrap();
        let contents: Vec<_> = rows.iter().map(|r| r["content"].clone()).collect();
        assert_eq!(contents, vec![json!("b"), json!("c")]);
    }
}
