use serde_json::Value;

use super::error::FilterError;
use super::filter_where::validate_identifier;
use super::types::{FilterOrderInfo, SortDirection};

pub struct FilterOrder;

impl FilterOrder {
    /// Accepts `"created_at desc, id"`, `["created_at desc", "id"]` or
    /// `{ "created_at": "desc" }`.
    pub fn validate_and_parse(order: &Value) -> Result<Vec<FilterOrderInfo>, FilterError> {
        let infos = match order {
            Value::Null => vec![],
            Value::String(s) => Self::parse_order_string(s),
            Value::Array(arr) => {
                let mut out = Vec::new();
                for v in arr {
                    match v {
                        Value::String(s) => out.extend(Self::parse_order_string(s)),
                        _ => return Err(FilterError::InvalidOperand("ORDER entries must be strings".to_string())),
                    }
                }
                out
            }
            Value::Object(obj) => obj
                .iter()
                .map(|(k, v)| FilterOrderInfo { column: k.clone(), sort: Self::parse_direction(v.as_str().unwrap_or("asc")) })
                .collect(),
            _ => return Err(FilterError::InvalidOperand("Unsupported ORDER format".to_string())),
        };

        for info in &infos {
            validate_identifier(&info.column).map_err(FilterError::InvalidColumn)?;
        }
        Ok(infos)
    }

    fn parse_order_string(s: &str) -> Vec<FilterOrderInfo> {
        s.split(',')
            .filter_map(|part| {
                let mut it = part.split_whitespace();
                let column = it.next()?;
                Some(FilterOrderInfo {
                    column: column.to_string(),
                    sort: Self::parse_direction(it.next().unwrap_or("asc")),
                })
            })
            .collect()
    }

    fn parse_direction(dir: &str) -> SortDirection {
        if dir.eq_ignore_ascii_case("desc") { SortDirection::Desc } else { SortDirection::Asc }
    }

    pub fn generate(infos: &[FilterOrderInfo]) -> String {
        if infos.is_empty() { return String::new(); }
        let parts: Vec<String> = infos
            .iter()
            .map(|i| format!("\"{}\" {}", i.column, i.sort.to_sql()))
            .collect();
        format!("ORDER BY {}", parts.join(", "))
    }
}
