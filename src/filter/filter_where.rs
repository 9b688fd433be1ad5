use serde_json::Value;

use super::error::FilterError;
use super::types::{Column, FilterOp, FilterWhereInfo, FilterWhereOptions};

/// Column every audited table carries; the implicit query filter tests it.
pub const SOFT_DELETE_COLUMN: &str = "is_deleted";

/// Builds a parameterized SQL predicate from the JSON where language.
///
/// Placeholders are cast to the declared column type (`$1::uuid`) so JSON
/// strings compare correctly against uuid and timestamp columns.
pub struct FilterWhere<'a> {
    columns: &'a [Column],
    param_values: Vec<Value>,
    param_offset: usize,
}

impl<'a> FilterWhere<'a> {
    pub fn new(columns: &'a [Column], starting_param_index: usize) -> Self {
        Self {
            columns,
            param_values: vec![],
            param_offset: starting_param_index,
        }
    }

    /// Generate the full predicate, including the soft-delete filter unless
    /// `options.include_deleted` is set.
    pub fn generate(
        where_data: Option<&Value>,
        columns: &'a [Column],
        starting_param_index: usize,
        options: &FilterWhereOptions,
    ) -> Result<(String, Vec<Value>), FilterError> {
        let mut filter_where = Self::new(columns, starting_param_index);

        let mut sql_conditions = vec![];
        if !options.include_deleted {
            sql_conditions.push(format!("\"{}\" = FALSE", SOFT_DELETE_COLUMN));
        }
        if let Some(where_data) = where_data {
            sql_conditions.extend(filter_where.build_conditions(where_data)?);
        }

        let where_clause = if sql_conditions.is_empty() { "1=1".to_string() } else { sql_conditions.join(" AND ") };
        Ok((where_clause, filter_where.param_values))
    }

    pub fn validate(where_data: &Value) -> Result<(), FilterError> {
        match where_data {
            Value::Null | Value::Object(_) => Ok(()),
            _ => Err(FilterError::InvalidWhere("WHERE must be an object".to_string())),
        }
    }

    fn build_conditions(&mut self, where_data: &Value) -> Result<Vec<String>, FilterError> {
        let obj = match where_data {
            Value::Null => return Ok(vec![]),
            Value::Object(obj) => obj,
            _ => return Err(FilterError::InvalidWhere("Unsupported WHERE format".to_string())),
        };

        let mut out = vec![];
        for (key, value) in obj {
            if key.starts_with('$') {
                out.push(self.build_logical(key, value)?);
            } else {
                for condition in Self::parse_field_condition(key, value)? {
                    out.push(self.build_sql_condition(&condition)?);
                }
            }
        }
        Ok(out)
    }

    fn build_logical(&mut self, op: &str, value: &Value) -> Result<String, FilterError> {
        match op {
            "$and" | "$or" => {
                let arr = value
                    .as_array()
                    .ok_or_else(|| FilterError::InvalidOperand(format!("{} requires array", op)))?;
                if arr.is_empty() {
                    return Ok(if op == "$and" { "1=1" } else { "1=0" }.to_string());
                }
                let mut parts = Vec::with_capacity(arr.len());
                for v in arr {
                    parts.push(format!("({})", self.build_group(v)?));
                }
                let joiner = if op == "$and" { " AND " } else { " OR " };
                Ok(format!("({})", parts.join(joiner)))
            }
            "$not" => Ok(format!("NOT ({})", self.build_group(value)?)),
            _ => Err(FilterError::UnsupportedOperator(op.to_string())),
        }
    }

    fn build_group(&mut self, value: &Value) -> Result<String, FilterError> {
        let conditions = self.build_conditions(value)?;
        Ok(if conditions.is_empty() { "1=1".to_string() } else { conditions.join(" AND ") })
    }

    pub(crate) fn parse_field_condition(field: &str, value: &Value) -> Result<Vec<FilterWhereInfo>, FilterError> {
        match value {
            Value::Object(obj) if obj.keys().any(|k| k.starts_with('$')) => obj
                .iter()
                .map(|(op_key, op_val)| {
                    Ok(FilterWhereInfo {
                        column: field.to_string(),
                        operator: Self::map_operator(op_key)?,
                        data: op_val.clone(),
                    })
                })
                .collect(),
            // Implicit equality: { field: value }
            _ => Ok(vec![FilterWhereInfo { column: field.to_string(), operator: FilterOp::Eq, data: value.clone() }]),
        }
    }

    pub(crate) fn map_operator(op_key: &str) -> Result<FilterOp, FilterError> {
        Ok(match op_key {
            "$eq" => FilterOp::Eq,
            "$ne" | "$neq" => FilterOp::Ne,
            "$gt" => FilterOp::Gt,
            "$gte" => FilterOp::Gte,
            "$lt" => FilterOp::Lt,
            "$lte" => FilterOp::Lte,
            "$like" => FilterOp::Like,
            "$ilike" => FilterOp::ILike,
            "$in" => FilterOp::In,
            "$nin" => FilterOp::NIn,
            "$between" => FilterOp::Between,
            "$null" => FilterOp::Null,
            other => return Err(FilterError::UnsupportedOperator(other.to_string())),
        })
    }

    fn build_sql_condition(&mut self, condition: &FilterWhereInfo) -> Result<String, FilterError> {
        let column = self.resolve_column(&condition.column)?;
        let quoted = format!("\"{}\"", condition.column);
        let data = &condition.data;

        Ok(match condition.operator {
            FilterOp::Eq if data.is_null() => format!("{} IS NULL", quoted),
            FilterOp::Eq => format!("{} = {}", quoted, self.param(column, data)),
            FilterOp::Ne if data.is_null() => format!("{} IS NOT NULL", quoted),
            FilterOp::Ne => format!("{} <> {}", quoted, self.param(column, data)),
            FilterOp::Gt => format!("{} > {}", quoted, self.param(column, data)),
            FilterOp::Gte => format!("{} >= {}", quoted, self.param(column, data)),
            FilterOp::Lt => format!("{} < {}", quoted, self.param(column, data)),
            FilterOp::Lte => format!("{} <= {}", quoted, self.param(column, data)),
            FilterOp::Like => format!("{} LIKE {}", quoted, self.param(None, data)),
            FilterOp::ILike => format!("{} ILIKE {}", quoted, self.param(None, data)),
            FilterOp::In | FilterOp::NIn => {
                let negate = condition.operator == FilterOp::NIn;
                let values = match data {
                    Value::Array(values) => values.clone(),
                    other => vec![other.clone()],
                };
                if values.is_empty() {
                    return Ok(if negate { "1=1" } else { "1=0" }.to_string());
                }
                let params: Vec<String> = values.iter().map(|v| self.param(column, v)).collect();
                let keyword = if negate { "NOT IN" } else { "IN" };
                format!("{} {} ({})", quoted, keyword, params.join(", "))
            }
            FilterOp::Between => match data {
                Value::Array(values) if values.len() == 2 => {
                    let low = self.param(column, &values[0]);
                    let high = self.param(column, &values[1]);
                    format!("{} BETWEEN {} AND {}", quoted, low, high)
                }
                _ => return Err(FilterError::InvalidOperand("$between requires array with 2 values".to_string())),
            },
            FilterOp::Null => match data.as_bool() {
                Some(true) => format!("{} IS NULL", quoted),
                Some(false) => format!("{} IS NOT NULL", quoted),
                None => return Err(FilterError::InvalidOperand("$null requires a boolean".to_string())),
            },
        })
    }

    fn resolve_column(&self, name: &str) -> Result<Option<Column>, FilterError> {
        if self.columns.is_empty() {
            validate_identifier(name).map_err(FilterError::InvalidColumn)?;
            return Ok(None);
        }
        self.columns
            .iter()
            .find(|c| c.name == name)
            .copied()
            .map(Some)
            .ok_or_else(|| FilterError::InvalidColumn(format!("Unknown column: {}", name)))
    }

    fn param(&mut self, column: Option<Column>, value: &Value) -> String {
        self.param_values.push(value.clone());
        let index = self.param_offset + self.param_values.len();
        match column {
            Some(c) => format!("${}::{}", index, c.column_type.sql_cast()),
            None => format!("${}", index),
        }
    }
}

pub(crate) fn validate_identifier(name: &str) -> Result<(), String> {
    let mut chars = name.chars();
    match chars.next() {
        None => Err("Identifier cannot be empty".to_string()),
        Some(first) if !(first.is_ascii_alphabetic() || first == '_') => Err(format!("Invalid identifier: {}", name)),
        _ if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') => Err(format!("Invalid identifier: {}", name)),
        _ => Ok(()),
    }
}
