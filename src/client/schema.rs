//! Field allowlist applied before writes, casing repair applied after reads.

use serde_json::{Map, Value};

use crate::database::Table;

/// Keep only the table's documented fields. A boolean `hasTraffic` becomes
/// the "Sim"/"Não" text the column has always held.
pub fn sanitize(table: Table, data: &Value) -> Map<String, Value> {
    let mut valid = Map::new();
    let Some(obj) = data.as_object() else {
        return valid;
    };
    for field in table.fields() {
        let Some(value) = obj.get(*field) else {
            continue;
        };
        let value = match (*field, value) {
            ("hasTraffic", Value::Bool(b)) => Value::String(if *b { "Sim" } else { "Não" }.to_string()),
            _ => value.clone(),
        };
        valid.insert((*field).to_string(), value);
    }
    valid
}

/// Copy lower-cased columns (`ownerid`) onto their documented camelCase key
/// (`ownerId`) when the latter is missing. Other keys are left as they are.
pub fn normalize(table: Table, data: Value) -> Value {
    match data {
        Value::Array(items) => Value::Array(items.into_iter().map(|item| normalize(table, item)).collect()),
        Value::Object(mut obj) => {
            for field in table.fields() {
                if obj.contains_key(*field) {
                    continue;
                }
                if let Some(value) = obj.get(&field.to_ascii_lowercase()).cloned() {
                    obj.insert((*field).to_string(), value);
                }
            }
            Value::Object(obj)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strips_unknown_fields() {
        let clean = sanitize(
            Table::Users,
            &json!({"name": "Ana", "email": "ana@example.com", "createdAt": "01/02/2024", "leadScore": 1}),
        );
        assert_eq!(Value::Object(clean), json!({"name": "Ana", "email": "ana@example.com"}));
    }

    #[test]
    fn keeps_explicit_nulls() {
        let clean = sanitize(Table::Users, &json!({"name": "Ana", "role": null}));
        assert_eq!(clean.get("role"), Some(&Value::Null));
    }

    #[test]
    fn converts_has_traffic_booleans() {
        let yes = sanitize(Table::Clients, &json!({"name": "Acme", "hasTraffic": true}));
        let no = sanitize(Table::Clients, &json!({"name": "Acme", "hasTraffic": false}));
        let text = sanitize(Table::Clients, &json!({"hasTraffic": "Sim"}));
        assert_eq!(yes["hasTraffic"], "Sim");
        assert_eq!(no["hasTraffic"], "Não");
        assert_eq!(text["hasTraffic"], "Sim");
    }

    #[test]
    fn non_objects_sanitize_to_nothing() {
        assert!(sanitize(Table::Tasks, &json!([1, 2])).is_empty());
    }

    #[test]
    fn normalizes_lowercase_columns() {
        let row = json!({"id": 9, "created_at": "2024-01-01T10:00:00", "name": "Acme", "ownerid": 3, "hastraffic": "Sim"});
        let out = normalize(Table::Clients, row);
        assert_eq!(out["ownerId"], 3);
        assert_eq!(out["hasTraffic"], "Sim");
        // original keys survive
        assert_eq!(out["ownerid"], 3);
        assert_eq!(out["id"], 9);
        assert_eq!(out["created_at"], "2024-01-01T10:00:00");
    }

    #[test]
    fn existing_camel_case_wins() {
        let out = normalize(Table::Tasks, json!({"assigneeId": 1, "assigneeid": 2}));
        assert_eq!(out["assigneeId"], 1);
    }

    #[test]
    fn normalizes_lists_and_passes_null() {
        let out = normalize(Table::Meetings, json!([{"clientid": 4}, {"clientid": 5}]));
        assert_eq!(out[0]["clientId"], 4);
        assert_eq!(out[1]["clientId"], 5);
        assert_eq!(normalize(Table::Meetings, Value::Null), Value::Null);
    }
}
