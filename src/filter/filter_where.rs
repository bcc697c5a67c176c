use serde_json::{Map, Value};

use crate::database::table::{Column, Table};

use super::error::FilterError;
use super::types::FilterWhereInfo;

pub struct FilterWhere {
    param_values: Vec<String>,
    param_index: usize,
}

impl FilterWhere {
    pub fn new(starting_param_index: usize) -> Self {
        Self {
            param_values: vec![],
            param_index: starting_param_index,
        }
    }

    pub fn validate(pairs: &[(String, String)]) -> Result<Vec<FilterWhereInfo>, FilterError> {
        pairs
            .iter()
            .map(|(key, value)| {
                Ok(FilterWhereInfo {
                    column: Column::parse(key)?,
                    data: value.clone(),
                })
            })
            .collect()
    }

    /// Build `t.col = (jsonb_populate_record(NULL::<table>, $n::jsonb)).col AND …`.
    ///
    /// Each value travels as `{"col": "<value>"}` and is parsed by the
    /// column's own input function, the same coercion writes get, so
    /// `time=10:00` matches `10:00:00` and `ownerId=03` matches 3.
    pub fn generate(
        table: Table,
        conditions: &[FilterWhereInfo],
        starting_param_index: usize,
    ) -> (String, Vec<String>) {
        let mut filter_where = Self::new(starting_param_index);
        let parts: Vec<String> = conditions
            .iter()
            .map(|c| {
                let column = c.column.sql();
                let placeholder = filter_where.param(typed_value(&column, &c.data));
                format!(
                    "t.{col} = (jsonb_populate_record(NULL::{table}, {placeholder}::jsonb)).{col}",
                    col = column,
                    table = table.as_str(),
                    placeholder = placeholder,
                )
            })
            .collect();
        (parts.join(" AND "), filter_where.param_values)
    }

    fn param(&mut self, value: String) -> String {
        self.param_values.push(value);
        self.param_index += 1;
        format!("${}", self.param_index)
    }
}

fn typed_value(column: &str, data: &str) -> String {
    let mut record = Map::new();
    record.insert(column.to_string(), Value::String(data.to_string()));
    Value::Object(record).to_string()
}
