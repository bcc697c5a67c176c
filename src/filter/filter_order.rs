use crate::database::table::Column;

use super::error::FilterError;
use super::types::{FilterOrderInfo, SortDirection};

pub struct FilterOrder;

impl FilterOrder {
    /// Newest first, the order every list response uses unless told otherwise.
    pub fn newest_first() -> Vec<FilterOrderInfo> {
        vec![FilterOrderInfo {
            column: Column::trusted("created_at"),
            sort: SortDirection::Desc,
        }]
    }

    /// Parse `"name asc, created_at desc"`.
    pub fn validate_and_parse(s: &str) -> Result<Vec<FilterOrderInfo>, FilterError> {
        let mut out = Vec::new();
        for part in s.split(',') {
            let trimmed = part.trim();
            if trimmed.is_empty() {
                continue;
            }
            let mut it = trimmed.split_whitespace();
            if let Some(col) = it.next() {
                let sort = match it.next() {
                    None => SortDirection::Asc,
                    Some(dir) if dir.eq_ignore_ascii_case("asc") => SortDirection::Asc,
                    Some(dir) if dir.eq_ignore_ascii_case("desc") => SortDirection::Desc,
                    Some(dir) => return Err(FilterError::InvalidDirection(dir.to_string())),
                };
                if let Some(extra) = it.next() {
                    return Err(FilterError::InvalidDirection(extra.to_string()));
                }
                out.push(FilterOrderInfo { column: Column::parse(col)?, sort });
            }
        }
        Ok(out)
    }

    pub fn generate(infos: &[FilterOrderInfo]) -> String {
        if infos.is_empty() {
            return String::new();
        }
        let parts: Vec<String> = infos
            .iter()
            .map(|i| format!("t.{} {}", i.column.sql(), i.sort.to_sql()))
            .collect();
        format!("ORDER BY {}", parts.join(", "))
    }
}
