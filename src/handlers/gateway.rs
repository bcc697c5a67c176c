use std::collections::BTreeMap;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::api::ApiResponse;
use crate::config::Environment;
use crate::database::{Record, Repository, Table};
use crate::error::ApiError;
use crate::filter::{Filter, FilterData};
use crate::server::AppState;

type GatewayQuery = BTreeMap<String, String>;

/// ANY /db?type=<table>[&id=<id>][&<field>=<value>…]
///
/// `ping` answers before anything else is looked at, including
/// configuration. `health` runs `SELECT 1`. Everything else needs a valid
/// `type`, checked before the method so a bad table fails on every verb.
pub async fn dispatch(
    State(state): State<AppState>,
    method: Method,
    Query(query): Query<GatewayQuery>,
    body: Bytes,
) -> Result<Response, ApiError> {
    route(&state, method, &query, &body)
        .await
        .map_err(|err| err.for_environment(&state.config.environment))
}

async fn route(state: &AppState, method: Method, query: &GatewayQuery, body: &Bytes) -> Result<Response, ApiError> {
    if method == Method::OPTIONS {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    if query.contains_key("ping") {
        return Ok(Json(json!({ "status": "pong", "message": "Gateway is running" })).into_response());
    }

    if query.contains_key("health") {
        return Ok(health(state).await);
    }

    let table: Table = match query.get("type") {
        Some(name) => name.parse()?,
        None => return Err(ApiError::bad_request("Missing table type")),
    };
    let id = parse_id(query)?;

    match method {
        Method::GET => match id {
            Some(id) => get_one(state, table, id).await,
            None => get_all(state, table, query).await,
        },
        Method::POST => create(state, table, body).await,
        Method::PUT => {
            let id = id.ok_or_else(|| ApiError::bad_request("ID required for update"))?;
            update(state, table, id, body).await
        }
        Method::DELETE => {
            let id = id.ok_or_else(|| ApiError::bad_request("ID required for delete"))?;
            delete(state, table, id).await
        }
        other => Err(ApiError::method_not_allowed(format!("Method not allowed: {}", other))),
    }
}

async fn health(state: &AppState) -> Response {
    match state.db.health_check().await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "ok" }))).into_response(),
        Err(e) => {
            tracing::error!("Health Check Failed: {}", e);
            let message = match state.config.environment {
                Environment::Production => "Database unavailable".to_string(),
                _ => e.to_string(),
            };
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "status": "error", "message": message })),
            )
                .into_response()
        }
    }
}

/// An empty `id=` counts as absent; anything else must be an integer.
fn parse_id(query: &GatewayQuery) -> Result<Option<i64>, ApiError> {
    match query.get("id").map(|s| s.trim()) {
        None | Some("") => Ok(None),
        Some(raw) => raw
            .parse::<i64>()
            .map(Some)
            .map_err(|_| ApiError::bad_request(format!("Invalid id: {}", raw))),
    }
}

async fn repository(state: &AppState, table: Table) -> Result<Repository, ApiError> {
    let pool = state.db.pool().await?;
    Ok(Repository::new(table, pool, state.db.config().schema_policy))
}

async fn get_one(state: &AppState, table: Table, id: i64) -> Result<Response, ApiError> {
    let row = repository(state, table).await?.select_one(id).await?;
    Ok(ApiResponse::success(row).into_response())
}

async fn get_all(state: &AppState, table: Table, query: &GatewayQuery) -> Result<Response, ApiError> {
    let mut filter = Filter::new(table).with_max_limit(state.config.api.max_limit);
    filter.assign(FilterData::from_query(query))?;

    let rows = repository(state, table).await?.select_any(&filter).await?;
    Ok(ApiResponse::success(rows).into_response())
}

async fn create(state: &AppState, table: Table, body: &Bytes) -> Result<Response, ApiError> {
    let record = Record::from_body(body)?;
    let row = repository(state, table).await?.insert(&record).await?;
    tracing::info!(table = %table, "inserted row");
    Ok(ApiResponse::created(row).into_response())
}

async fn update(state: &AppState, table: Table, id: i64, body: &Bytes) -> Result<Response, ApiError> {
    let record = Record::from_body(body)?;
    let row = repository(state, table).await?.update(id, &record).await?;
    if row.is_none() {
        tracing::debug!(table = %table, id, "update matched no row");
    }
    Ok(ApiResponse::success(row).into_response())
}

async fn delete(state: &AppState, table: Table, id: i64) -> Result<Response, ApiError> {
    let removed = repository(state, table).await?.delete(id).await?;
    tracing::info!(table = %table, id, removed, "deleted");
    Ok(ApiResponse::success(json!({ "success": true })).into_response())
}
