#![allow(dead_code)]

use anyhow::{Context, Result};
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use crm_gateway::config::AppConfig;
use crm_gateway::server::{app, AppState};

/// Gateway router with development defaults and no database configured.
pub fn gateway() -> Router {
    gateway_with(AppConfig::development())
}

pub fn gateway_with(config: AppConfig) -> Router {
    app(AppState::new(config).expect("valid test config"))
}

/// `DATABASE_URL`, when the environment provides one.
pub fn database_url() -> Option<String> {
    let _ = dotenvy::dotenv();
    std::env::var("DATABASE_URL").ok().filter(|s| !s.trim().is_empty())
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub bytes: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.bytes).unwrap_or(Value::Null)
    }
}

/// Drive one request through the router without opening a socket.
pub async fn send(router: &Router, method: Method, uri: &str, body: Option<&str>) -> Result<TestResponse> {
    let mut builder = Request::builder().method(method).uri(uri);
    if body.is_some() {
        builder = builder.header("content-type", "application/json");
    }
    let request = builder.body(match body {
        Some(b) => Body::from(b.to_string()),
        None => Body::empty(),
    })?;

    let response = router.clone().oneshot(request).await?;
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await?.to_bytes().to_vec();
    Ok(TestResponse { status, headers, bytes })
}

/// Serve `router` on a free local port and return its base URL.
pub async fn serve(router: Router) -> Result<String> {
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    Ok(format!("http://127.0.0.1:{}", port))
}
