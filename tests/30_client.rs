mod common;

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use axum::{
    extract::{Query, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Json, Router,
};
use serde_json::{json, Map, Value};

use crm_gateway::client::{ClientError, CrmClient};
use crm_gateway::database::Table;

/// Bodies the stub received, in order.
type Seen = Arc<Mutex<Vec<Value>>>;

fn users() -> Vec<Value> {
    vec![
        json!({"id": 1, "name": "Ana", "email": "ana@example.com", "password": "pw", "role": "admin"}),
        json!({"id": 2, "name": "Bia", "email": "bia@example.com", "password": "secret", "role": null}),
    ]
}

/// Lower-cases keys the way PostgreSQL returns unquoted columns.
fn as_stored(body: &Value, id: i64) -> Value {
    let mut row = Map::new();
    row.insert("id".to_string(), json!(id));
    if let Some(obj) = body.as_object() {
        for (k, v) in obj {
            row.insert(k.to_ascii_lowercase(), v.clone());
        }
    }
    Value::Object(row)
}

async fn stub(
    State(seen): State<Seen>,
    method: Method,
    Query(q): Query<BTreeMap<String, String>>,
    body: axum::body::Bytes,
) -> Response {
    if q.contains_key("ping") {
        return Json(json!({"status": "pong", "message": "Gateway is running"})).into_response();
    }
    if q.contains_key("health") {
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"status": "error", "message": "db down"})))
            .into_response();
    }
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    if !body.is_null() {
        seen.lock().unwrap().push(body.clone());
    }
    let table = q.get("type").map(String::as_str).unwrap_or_default();
    let id = q.get("id").and_then(|s| s.parse::<i64>().ok());

    match (method, table, id) {
        (Method::GET, "users", None) => {
            let rows: Vec<Value> = users()
                .into_iter()
                .filter(|u| q.get("email").map_or(true, |e| u["email"] == e.as_str()))
                .collect();
            Json(Value::Array(rows)).into_response()
        }
        (Method::GET, "clients", None) => {
            assert_eq!(q.get("status").map(String::as_str), Some("Lead"));
            Json(json!([{"id": 2, "name": "Acme", "status": "Lead", "ownerid": 3, "hastraffic": "Sim"}])).into_response()
        }
        (Method::GET, "clients", Some(2)) => {
            Json(json!({"id": 2, "name": "Acme", "ownerid": 3, "created_at": "2024-05-01T12:00:00"})).into_response()
        }
        (Method::GET, "clients", Some(_)) => Json(Value::Null).into_response(),
        (Method::POST, "clients", None) => (StatusCode::CREATED, Json(as_stored(&body, 10))).into_response(),
        (Method::PUT, "tasks", Some(5)) => Json(as_stored(&body, 5)).into_response(),
        (Method::PUT, "tasks", Some(_)) => Json(Value::Null).into_response(),
        (Method::DELETE, "clients", Some(_)) => Json(json!({"success": true})).into_response(),
        (Method::POST, "tasks", None) => (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "No data to insert", "code": "BAD_REQUEST"})),
        )
            .into_response(),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "Database error: boom", "code": "INTERNAL_SERVER_ERROR"})),
        )
            .into_response(),
    }
}

async fn client() -> Result<(CrmClient, Seen)> {
    let seen: Seen = Arc::default();
    let router = Router::new().route("/db", any(stub)).with_state(seen.clone());
    let base = common::serve(router).await?;
    Ok((CrmClient::new(&format!("{}/db", base))?, seen))
}

#[tokio::test]
async fn ping_and_health() -> Result<()> {
    let (client, _) = client().await?;
    assert!(client.ping().await?);
    let health = client.health().await?;
    assert_eq!(health["status"], "error");
    Ok(())
}

#[tokio::test]
async fn filtered_reads_are_normalized() -> Result<()> {
    let (client, _) = client().await?;
    let rows = client.get_where(Table::Clients, &[("status", "Lead")]).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["ownerId"], 3);
    assert_eq!(rows[0]["hasTraffic"], "Sim");
    assert_eq!(rows[0]["ownerid"], 3);
    Ok(())
}

#[tokio::test]
async fn get_by_id_returns_none_for_missing_rows() -> Result<()> {
    let (client, _) = client().await?;
    let row = client.get_by_id(Table::Clients, 2).await.expect("row");
    assert_eq!(row["ownerId"], 3);
    assert_eq!(row["created_at"], "2024-05-01T12:00:00");
    assert!(client.get_by_id(Table::Clients, 99).await.is_none());
    Ok(())
}

#[tokio::test]
async fn read_failures_degrade_to_empty() -> Result<()> {
    let (client, _) = client().await?;
    assert!(client.get_all(Table::Meetings).await.is_empty());
    assert!(client.get_by_id(Table::Meetings, 1).await.is_none());
    Ok(())
}

#[tokio::test]
async fn unreachable_gateway_degrades_to_empty() -> Result<()> {
    let port = portpicker::pick_unused_port().expect("free port");
    let client = CrmClient::new(&format!("http://127.0.0.1:{}/db", port))?;
    assert!(client.get_all(Table::Clients).await.is_empty());
    assert!(!client.delete(Table::Clients, 1).await);
    assert!(matches!(client.ping().await, Err(ClientError::Http(_))));
    Ok(())
}

#[tokio::test]
async fn add_strips_unknown_fields_and_converts_traffic() -> Result<()> {
    let (client, seen) = client().await?;
    let row = client
        .add(
            Table::Clients,
            &json!({"name": "Acme", "status": "Lead", "ownerId": 3, "hasTraffic": true, "leadScore": 42, "createdAt": "01/05/2024"}),
        )
        .await?;

    let sent = seen.lock().unwrap().last().cloned().expect("body sent");
    assert_eq!(sent, json!({"name": "Acme", "status": "Lead", "ownerId": 3, "hasTraffic": "Sim"}));
    assert_eq!(row["id"], 10);
    assert_eq!(row["ownerId"], 3);
    Ok(())
}

#[tokio::test]
async fn add_failures_propagate() -> Result<()> {
    let (client, _) = client().await?;
    match client.add(Table::Tasks, &json!({"title": "Call"})).await {
        Err(ClientError::Status { status, message }) => {
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(message, "No data to insert");
        }
        other => panic!("expected status error, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn update_and_delete() -> Result<()> {
    let (client, _) = client().await?;
    let row = client.update(Table::Tasks, 5, &json!({"status": "done"})).await.expect("updated");
    assert_eq!(row["status"], "done");
    assert!(client.update(Table::Tasks, 6, &json!({"status": "done"})).await.is_none());

    assert!(client.delete(Table::Clients, 2).await);
    assert!(!client.delete(Table::Tasks, 2).await);
    Ok(())
}

#[tokio::test]
async fn lookup_and_authenticate_users() -> Result<()> {
    let (client, _) = client().await?;
    let bia = client.get_by_email("bia@example.com").await.expect("user");
    assert_eq!(bia["id"], 2);
    assert!(client.get_by_email("nobody@example.com").await.is_none());

    let ana = client.authenticate("ana@example.com", "pw").await.expect("authenticated");
    assert_eq!(ana["name"], "Ana");
    assert!(client.authenticate("ana@example.com", "wrong").await.is_none());
    Ok(())
}
