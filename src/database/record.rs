use serde_json::{Map, Value};

use super::table::{Column, IdentifierError, Table};

/// Errors that can occur while turning a request body into a writable record
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum RecordError {
    #[error("Missing body")]
    MissingBody,
    #[error("Invalid JSON format: {0}")]
    InvalidJson(String),
    #[error("No data to insert")]
    Empty,
    #[error("System field '{0}' cannot be set via API input")]
    SystemFieldNotAllowed(String),
    #[error(transparent)]
    InvalidColumn(#[from] IdentifierError),
    #[error("Field '{0}' given more than once")]
    DuplicateColumn(String),
    #[error("Unknown fields for {table}: {}", fields.join(", "))]
    UnknownFields { table: Table, fields: Vec<String> },
}

/// Column/value pairs from a POST or PUT body, validated for use in SQL.
#[derive(Debug, Clone)]
pub struct Record {
    fields: Vec<(Column, Value)>,
}

impl Record {
    /// Parse a raw request body. An absent or blank body is `MissingBody`.
    pub fn from_body(body: &[u8]) -> Result<Self, RecordError> {
        if body.iter().all(|b| b.is_ascii_whitespace()) {
            return Err(RecordError::MissingBody);
        }
        let json: Value =
            serde_json::from_slice(body).map_err(|e| RecordError::InvalidJson(e.to_string()))?;
        Self::from_json(json)
    }

    /// Create record from API input JSON, rejecting system fields
    pub fn from_json(json: Value) -> Result<Self, RecordError> {
        let map = match json {
            Value::Object(map) => map,
            _ => return Err(RecordError::InvalidJson("Expected JSON object".to_string())),
        };
        if map.is_empty() {
            return Err(RecordError::Empty);
        }

        let mut fields: Vec<(Column, Value)> = Vec::with_capacity(map.len());
        for (key, value) in map {
            let column = Column::parse(&key)?;
            if column.is_system() {
                return Err(RecordError::SystemFieldNotAllowed(key));
            }
            if fields.iter().any(|(c, _)| c.sql() == column.sql()) {
                return Err(RecordError::DuplicateColumn(key));
            }
            fields.push((column, value));
        }
        Ok(Self { fields })
    }

    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.fields.iter().map(|(c, _)| c)
    }

    /// Find the caller's column for a name reported back by the database.
    pub fn column_matching(&self, db_name: &str) -> Option<&Column> {
        self.columns().find(|c| c.sql().eq_ignore_ascii_case(db_name))
    }

    /// Reject anything outside the table's documented field list.
    pub fn ensure_known(&self, table: Table) -> Result<(), RecordError> {
        let unknown: Vec<String> = self
            .columns()
            .filter(|c| !table.knows_field(c.name()))
            .map(|c| c.name().to_string())
            .collect();
        if unknown.is_empty() {
            Ok(())
        } else {
            Err(RecordError::UnknownFields { table, fields: unknown })
        }
    }

    /// JSON object keyed by the folded column names, for `json_populate_record`.
    pub fn to_payload(&self) -> Value {
        let mut map = Map::new();
        for (column, value) in &self.fields {
            map.insert(column.sql(), value.clone());
        }
        Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn blank_body_is_missing() {
        assert_eq!(Record::from_body(b"").unwrap_err(), RecordError::MissingBody);
        assert_eq!(Record::from_body(b"  \n").unwrap_err(), RecordError::MissingBody);
    }

    #[test]
    fn rejects_non_objects_and_empty_objects() {
        assert!(matches!(Record::from_body(b"[1,2]"), Err(RecordError::InvalidJson(_))));
        assert!(matches!(Record::from_body(b"{not json"), Err(RecordError::InvalidJson(_))));
        assert_eq!(Record::from_json(json!({})).unwrap_err(), RecordError::Empty);
    }

    #[test]
    fn rejects_system_fields() {
        let err = Record::from_json(json!({"id": 4, "name": "Acme"})).unwrap_err();
        assert_eq!(err, RecordError::SystemFieldNotAllowed("id".to_string()));
    }

    #[test]
    fn rejects_injection_in_keys() {
        let err = Record::from_json(json!({"name) VALUES ('x'); --": "x"})).unwrap_err();
        assert!(matches!(err, RecordError::InvalidColumn(_)));
    }

    #[test]
    fn rejects_keys_that_fold_together() {
        let err = Record::from_json(json!({"ownerId": 1, "ownerid": 2})).unwrap_err();
        assert!(matches!(err, RecordError::DuplicateColumn(_)));
    }

    #[test]
    fn payload_uses_folded_names() {
        let record = Record::from_json(json!({"name": "Acme", "ownerId": 3})).unwrap();
        assert_eq!(record.to_payload(), json!({"name": "Acme", "ownerid": 3}));
        assert_eq!(record.column_matching("ownerid").unwrap().name(), "ownerId");
    }

    #[test]
    fn strict_check_lists_unknown_fields() {
        let record = Record::from_json(json!({"name": "Acme", "leadScore": 42})).unwrap();
        match record.ensure_known(Table::Clients).unwrap_err() {
            RecordError::UnknownFields { table, fields } => {
                assert_eq!(table, Table::Clients);
                assert_eq!(fields, vec!["leadScore".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(Record::from_json(json!({"status": "done"})).unwrap().ensure_known(Table::Tasks).is_ok());
    }
}
