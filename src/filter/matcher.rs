// In-process evaluation of the JSON where language, used by the memory
// storage backend. Semantics follow the SQL generated by `FilterWhere`,
// including the implicit soft-delete predicate.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::error::FilterError;
use super::filter_where::{FilterWhere, SOFT_DELETE_COLUMN};
use super::types::{Column, ColumnType, FilterOp, FilterOrderInfo, FilterWhereOptions, SortDirection};

pub struct RowMatcher<'a> {
    columns: &'a [Column],
}

impl<'a> RowMatcher<'a> {
    pub fn new(columns: &'a [Column]) -> Self {
        Self { columns }
    }

    pub fn matches(
        &self,
        row: &Map<String, Value>,
        where_data: Option<&Value>,
        options: &FilterWhereOptions,
    ) -> Result<bool, FilterError> {
        if !options.include_deleted && row.get(SOFT_DELETE_COLUMN).and_then(Value::as_bool).unwrap_or(false) {
            return Ok(false);
        }
        match where_data {
            None => Ok(true),
            Some(where_data) => {
                FilterWhere::validate(where_data)?;
                self.matches_group(row, where_data)
            }
        }
    }

    fn matches_group(&self, row: &Map<String, Value>, where_data: &Value) -> Result<bool, FilterError> {
        let obj = match where_data {
            Value::Null => return Ok(true),
            Value::Object(obj) => obj,
            _ => return Err(FilterError::InvalidWhere("Unsupported WHERE format".to_string())),
        };

        for (key, value) in obj {
            let matched = if key.starts_with('$') {
                self.matches_logical(row, key, value)?
            } else {
                let mut all = true;
                for condition in FilterWhere::parse_field_condition(key, value)? {
                    let column_type = self.column_type(&condition.column)?;
                    if !matches_condition(row.get(&condition.column), condition.operator, &condition.data, column_type)? {
                        all = false;
                        break;
                    }
                }
                all
            };
            if !matched {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn matches_logical(&self, row: &Map<String, Value>, op: &str, value: &Value) -> Result<bool, FilterError> {
        match op {
            "$and" | "$or" => {
                let arr = value
                    .as_array()
                    .ok_or_else(|| FilterError::InvalidOperand(format!("{} requires array", op)))?;
                let mut results = Vec::with_capacity(arr.len());
                for v in arr {
                    results.push(self.matches_group(row, v)?);
                }
                Ok(if op == "$and" { results.iter().all(|r| *r) } else { results.iter().any(|r| *r) })
            }
            "$not" => Ok(!self.matches_group(row, value)?),
            _ => Err(FilterError::UnsupportedOperator(op.to_string())),
        }
    }

    fn column_type(&self, name: &str) -> Result<Option<ColumnType>, FilterError> {
        if self.columns.is_empty() {
            return Ok(None);
        }
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| Some(c.column_type))
            .ok_or_else(|| FilterError::InvalidColumn(format!("Unknown column: {}", name)))
    }

    /// Stable sort by the given order columns. Nulls compare greater than any
    /// value, as in PostgreSQL, so they lead a descending sort.
    pub fn sort(&self, rows: &mut [Map<String, Value>], order: &[FilterOrderInfo]) {
        rows.sort_by(|a, b| {
            for info in order {
                let column_type = self.columns.iter().find(|c| c.name == info.column).map(|c| c.column_type);
                let left = a.get(&info.column).unwrap_or(&Value::Null);
                let right = b.get(&info.column).unwrap_or(&Value::Null);
                let ordering = match (left.is_null(), right.is_null()) {
                    (true, true) => Ordering::Equal,
                    (true, false) => Ordering::Greater,
                    (false, true) => Ordering::Less,
                    (false, false) => compare(left, right, column_type).unwrap_or(Ordering::Equal),
                };
                let ordering = match info.sort {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            Ordering::Equal
        });
    }
}

fn matches_condition(
    actual: Option<&Value>,
    op: FilterOp,
    data: &Value,
    column_type: Option<ColumnType>,
) -> Result<bool, FilterError> {
    let actual = actual.unwrap_or(&Value::Null);
    let cmp = |expected: &Value| compare(actual, expected, column_type);

    Ok(match op {
        FilterOp::Eq if data.is_null() => actual.is_null(),
        FilterOp::Eq => cmp(data) == Some(Ordering::Equal),
        FilterOp::Ne if data.is_null() => !actual.is_null(),
        FilterOp::Ne => !actual.is_null() && cmp(data) != Some(Ordering::Equal),
        FilterOp::Gt => cmp(data) == Some(Ordering::Greater),
        FilterOp::Gte => matches!(cmp(data), Some(Ordering::Greater | Ordering::Equal)),
        FilterOp::Lt => cmp(data) == Some(Ordering::Less),
        FilterOp::Lte => matches!(cmp(data), Some(Ordering::Less | Ordering::Equal)),
        FilterOp::Like | FilterOp::ILike => {
            let pattern = data
                .as_str()
                .ok_or_else(|| FilterError::InvalidOperand("LIKE requires a string pattern".to_string()))?;
            match actual.as_str() {
                Some(text) if op == FilterOp::ILike => like(&text.to_lowercase(), &pattern.to_lowercase()),
                Some(text) => like(text, pattern),
                None => false,
            }
        }
        FilterOp::In | FilterOp::NIn => {
            let values = match data {
                Value::Array(values) => values.clone(),
                other => vec![other.clone()],
            };
            let found = values.iter().any(|v| cmp(v) == Some(Ordering::Equal));
            if op == FilterOp::In { found } else { !actual.is_null() && !found }
        }
        FilterOp::Between => match data {
            Value::Array(values) if values.len() == 2 => {
                matches!(cmp(&values[0]), Some(Ordering::Greater | Ordering::Equal))
                    && matches!(cmp(&values[1]), Some(Ordering::Less | Ordering::Equal))
            }
            _ => return Err(FilterError::InvalidOperand("$between requires array with 2 values".to_string())),
        },
        FilterOp::Null => match data.as_bool() {
            Some(true) => actual.is_null(),
            Some(false) => !actual.is_null(),
            None => return Err(FilterError::InvalidOperand("$null requires a boolean".to_string())),
        },
    })
}

/// Typed comparison; `None` when the values are not comparable (SQL NULL).
fn compare(left: &Value, right: &Value, column_type: Option<ColumnType>) -> Option<Ordering> {
    match (column_type, left, right) {
        (_, Value::Null, _) | (_, _, Value::Null) => None,
        (Some(ColumnType::Timestamp), Value::String(l), Value::String(r)) => {
            let l = l.parse::<DateTime<Utc>>().ok()?;
            let r = r.parse::<DateTime<Utc>>().ok()?;
            Some(l.cmp(&r))
        }
        (Some(ColumnType::Uuid), Value::String(l), Value::String(r)) => {
            let l = Uuid::parse_str(l).ok()?;
            let r = Uuid::parse_str(r).ok()?;
            Some(l.cmp(&r))
        }
        (_, Value::Number(l), Value::Number(r)) => l.as_f64()?.partial_cmp(&r.as_f64()?),
        (_, Value::String(l), Value::String(r)) => Some(l.cmp(r)),
        (_, Value::Bool(l), Value::Bool(r)) => Some(l.cmp(r)),
        _ => None,
    }
}

/// SQL LIKE: `%` matches any run, `_` matches one character.
fn like(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();
    let (mut t, mut p) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pattern.len() && (pattern[p] == '_' || pattern[p] == text[t]) {
            t += 1;
            p += 1;
        } else if p < pattern.len() && pattern[p] == '%' {
            backtrack = Some((p, t));
            p += 1;
        } else if let Some((bp, bt)) = backtrack {
            p = bp + 1;
            t = bt + 1;
            backtrack = Some((bp, bt + 1));
        } else {
            return false;
        }
    }
    pattern[p..].iter().all(|c| *c == '%')
}
