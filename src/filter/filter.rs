use crate::database::table::Table;

use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{FilterData, FilterOrderInfo, FilterWhereInfo, SqlResult};

/// Read query for one table: equality predicates, ordering and paging.
#[derive(Debug)]
pub struct Filter {
    table: Table,
    where_data: Vec<FilterWhereInfo>,
    order_data: Vec<FilterOrderInfo>,
    limit: Option<i64>,
    offset: Option<i64>,
    max_limit: Option<i64>,
}

impl Filter {
    pub fn new(table: Table) -> Self {
        Self {
            table,
            where_data: vec![],
            order_data: FilterOrder::newest_first(),
            limit: None,
            offset: None,
            max_limit: None,
        }
    }

    pub fn with_max_limit(mut self, max_limit: Option<i64>) -> Self {
        self.max_limit = max_limit;
        self
    }

    pub fn assign(&mut self, data: FilterData) -> Result<&mut Self, FilterError> {
        self.where_data = FilterWhere::validate(&data.where_eq)?;
        if let Some(order) = data.order {
            let parsed = FilterOrder::validate_and_parse(&order)?;
            if !parsed.is_empty() {
                self.order_data = parsed;
            }
        }
        let limit = data
            .limit
            .map(|l| l.trim().parse::<i64>().map_err(|_| FilterError::InvalidLimit(l)))
            .transpose()?;
        let offset = data
            .offset
            .map(|o| o.trim().parse::<i64>().map_err(|_| FilterError::InvalidOffset(o)))
            .transpose()?;
        self.limit(limit, offset)?;
        Ok(self)
    }

    pub fn limit(&mut self, limit: Option<i64>, offset: Option<i64>) -> Result<&mut Self, FilterError> {
        if let Some(l) = limit {
            if l < 0 {
                return Err(FilterError::InvalidLimit("Limit must be non-negative".to_string()));
            }
        }
        if let Some(o) = offset {
            if o < 0 {
                return Err(FilterError::InvalidOffset("Offset must be non-negative".to_string()));
            }
        }

        // The cap bounds an explicit limit only; no limit means every row
        let applied = match (limit, self.max_limit) {
            (Some(l), Some(max)) if l > max => {
                tracing::warn!("Limit {} exceeds max {}, capping to max", l, max);
                Some(max)
            }
            (l, _) => l,
        };

        self.limit = applied;
        self.offset = offset;
        Ok(self)
    }

    pub fn to_sql(&self) -> SqlResult {
        let (where_clause, params) = FilterWhere::generate(self.table, &self.where_data, 0);
        let order_clause = FilterOrder::generate(&self.order_data);
        let limit_clause = self.build_limit_clause();

        let query = [
            "SELECT row_to_json(t) AS row".to_string(),
            format!("FROM {} t", self.table.as_str()),
            if where_clause.is_empty() { String::new() } else { format!("WHERE {}", where_clause) },
            order_clause,
            limit_clause,
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        SqlResult { query, params }
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
