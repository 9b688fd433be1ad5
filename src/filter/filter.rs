use serde_json::Value;

use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::{validate_identifier, FilterWhere};
use super::types::{Column, FilterData, FilterOrderInfo, FilterWhereOptions, SqlResult};

/// SQL builder for reads against one table.
///
/// The soft-delete predicate is part of every statement this produces; only
/// [`Filter::include_deleted`] (or `FilterData::include_deleted`) removes it.
pub struct Filter {
    table_name: String,
    columns: &'static [Column],
    where_data: Option<Value>,
    order_data: Vec<FilterOrderInfo>,
    limit: Option<i64>,
    offset: Option<i64>,
    options: FilterWhereOptions,
}

impl Filter {
    pub fn new(table_name: impl Into<String>) -> Result<Self, FilterError> {
        let table_name = table_name.into();
        validate_identifier(&table_name).map_err(FilterError::InvalidTable)?;
        Ok(Self {
            table_name,
            columns: &[],
            where_data: None,
            order_data: vec![],
            limit: None,
            offset: None,
            options: FilterWhereOptions::default(),
        })
    }

    /// Declare the table's columns; enables typed parameter casts and rejects
    /// unknown columns in where and order clauses.
    pub fn columns(&mut self, columns: &'static [Column]) -> &mut Self {
        self.columns = columns;
        self
    }

    pub fn assign(&mut self, data: FilterData) -> Result<&mut Self, FilterError> {
        if let Some(where_clause) = data.where_clause { self.where_clause(where_clause)?; }
        if let Some(order) = data.order { self.order(order)?; }
        if data.limit.is_some() || data.offset.is_some() { self.limit(data.limit, data.offset)?; }
        self.include_deleted(data.include_deleted);
        Ok(self)
    }

    pub fn where_clause(&mut self, conditions: Value) -> Result<&mut Self, FilterError> {
        FilterWhere::validate(&conditions)?;
        self.where_data = Some(conditions);
        Ok(self)
    }

    pub fn order(&mut self, order_spec: Value) -> Result<&mut Self, FilterError> {
        let order_info = FilterOrder::validate_and_parse(&order_spec)?;
        if !self.columns.is_empty() {
            if let Some(unknown) = order_info.iter().find(|o| !self.columns.iter().any(|c| c.name == o.column)) {
                return Err(FilterError::InvalidColumn(format!("Unknown column: {}", unknown.column)));
            }
        }
        self.order_data = order_info;
        Ok(self)
    }

    pub fn limit(&mut self, limit: Option<i64>, offset: Option<i64>) -> Result<&mut Self, FilterError> {
        if let Some(l) = limit { if l < 0 { return Err(FilterError::InvalidPaging("Limit must be non-negative".to_string())); } }
        if let Some(o) = offset { if o < 0 { return Err(FilterError::InvalidPaging("Offset must be non-negative".to_string())); } }
        self.limit = limit;
        self.offset = offset;
        Ok(self)
    }

    pub fn include_deleted(&mut self, include: bool) -> &mut Self {
        self.options.include_deleted = include;
        self
    }

    pub fn to_sql(&self) -> Result<SqlResult, FilterError> {
        let where_result = self.to_where_sql()?;
        let order_clause = FilterOrder::generate(&self.order_data);
        let limit_clause = self.build_limit_clause();

        let query = [
            "SELECT *".to_string(),
            format!("FROM \"{}\"", self.table_name),
            format!("WHERE {}", where_result.query),
            order_clause,
            limit_clause,
        ].into_iter().filter(|s| !s.is_empty()).collect::<Vec<_>>().join(" ");

        Ok(SqlResult { query, params: where_result.params })
    }

    /// Wraps [`Filter::to_sql`] so each row comes back as one JSON object.
    pub fn to_json_sql(&self) -> Result<SqlResult, FilterError> {
        let inner = self.to_sql()?;
        Ok(SqlResult {
            query: format!("SELECT row_to_json(t) AS row FROM ({}) t", inner.query),
            params: inner.params,
        })
    }

    pub fn to_where_sql(&self) -> Result<SqlResult, FilterError> {
        let (query, params) = FilterWhere::generate(self.where_data.as_ref(), self.columns, 0, &self.options)?;
        Ok(SqlResult { query, params })
    }

    pub fn to_count_sql(&self) -> Result<SqlResult, FilterError> {
        let where_result = self.to_where_sql()?;
        let query = format!("SELECT COUNT(*) AS count FROM \"{}\" WHERE {}", self.table_name, where_result.query);
        Ok(SqlResult { query, params: where_result.params })
    }

    fn build_limit_clause(&self) -> String {
        match (self.limit, self.offset) {
            (Some(l), Some(o)) => format!("LIMIT {} OFFSET {}", l, o),
            (Some(l), None) => format!("LIMIT {}", l),
            (None, Some(o)) => format!("OFFSET {}", o),
            (None, None) => String::new(),
        }
    }
}
