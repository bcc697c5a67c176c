use crate::database::table::Column;

/// Query parameters the gateway consumes itself; everything else filters.
pub const RESERVED_PARAMS: &[&str] = &["type", "id", "ping", "health", "limit", "offset", "order"];

#[derive(Debug, Clone, Default)]
pub struct FilterData {
    /// Equality predicates in request order, compared on their text form.
    pub where_eq: Vec<(String, String)>,
    pub order: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

impl FilterData {
    /// Split raw query parameters into predicates and paging options.
    pub fn from_query<'a, I>(params: I) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        let mut data = FilterData::default();
        for (key, value) in params {
            match key.as_str() {
                "order" => data.order = Some(value.clone()),
                "limit" => data.limit = Some(value.clone()),
                "offset" => data.offset = Some(value.clone()),
                k if RESERVED_PARAMS.contains(&k) => {}
                _ => data.where_eq.push((key.clone(), value.clone())),
            }
        }
        data
    }
}

#[derive(Debug, Clone)]
pub struct FilterWhereInfo {
    pub column: Column,
    pub data: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone)]
pub struct FilterOrderInfo {
    pub column: Column,
    pub sort: SortDirection,
}

#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<String>,
}
