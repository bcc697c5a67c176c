//! Typed access to the gateway's `/db` endpoint.
//!
//! Reads degrade to empty results and log the failure, so a flaky gateway
//! never takes a caller down with it. `add` is the exception: a failed
//! insert is returned to the caller as a [`ClientError`].

use std::time::Duration;

use reqwest::{RequestBuilder, StatusCode};
use serde_json::Value;
use thiserror::Error;
use url::Url;

use super::schema::{normalize, sanitize};
use crate::database::Table;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Invalid gateway URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Gateway returned {status}: {message}")]
    Status { status: StatusCode, message: String },
}

#[derive(Debug, Clone)]
pub struct CrmClient {
    http: reqwest::Client,
    endpoint: Url,
}

impl CrmClient {
    /// `endpoint` is the full URL of the gateway route, e.g. `http://localhost:8888/db`.
    pub fn new(endpoint: &str) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            endpoint: Url::parse(endpoint)?,
        })
    }

    fn url(&self, table: Option<Table>, params: &[(&str, &str)]) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut query = url.query_pairs_mut();
            if let Some(table) = table {
                query.append_pair("type", table.as_str());
            }
            for (key, value) in params {
                query.append_pair(key, value);
            }
        }
        url
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let body: Value = response.json().await.unwrap_or(Value::Null);
        let message = body
            .get("error")
            .or_else(|| body.get("message"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown error").to_string());
        Err(ClientError::Status { status, message })
    }

    /// Rows matching every `field=value` pair, newest first.
    pub async fn get_where(&self, table: Table, filters: &[(&str, &str)]) -> Vec<Value> {
        let url = self.url(Some(table), filters);
        match self.send(self.http.get(url)).await {
            Ok(Value::Array(rows)) => rows.into_iter().map(|row| normalize(table, row)).collect(),
            Ok(other) => {
                tracing::error!("Unexpected {} listing: {}", table, other);
                Vec::new()
            }
            Err(err) => {
                tracing::error!("Error fetching {}: {}", table, err);
                Vec::new()
            }
        }
    }

    pub async fn get_all(&self, table: Table) -> Vec<Value> {
        self.get_where(table, &[]).await
    }

    pub async fn get_by_id(&self, table: Table, id: i64) -> Option<Value> {
        let url = self.url(Some(table), &[("id", &id.to_string())]);
        match self.send(self.http.get(url)).await {
            Ok(Value::Null) => None,
            Ok(row) => Some(normalize(table, row)),
            Err(err) => {
                tracing::error!("Error fetching {} {}: {}", table, id, err);
                None
            }
        }
    }

    pub async fn get_by_email(&self, email: &str) -> Option<Value> {
        self.get_where(Table::Users, &[("email", email)])
            .await
            .into_iter()
            .next()
    }

    /// Insert `item` after stripping fields the table does not document.
    pub async fn add(&self, table: Table, item: &Value) -> Result<Value, ClientError> {
        let body = sanitize(table, item);
        let url = self.url(Some(table), &[]);
        let row = self.send(self.http.post(url).json(&body)).await?;
        Ok(normalize(table, row))
    }

    pub async fn update(&self, table: Table, id: i64, updates: &Value) -> Option<Value> {
        let body = sanitize(table, updates);
        let url = self.url(Some(table), &[("id", &id.to_string())]);
        match self.send(self.http.put(url).json(&body)).await {
            Ok(Value::Null) => None,
            Ok(row) => Some(normalize(table, row)),
            Err(err) => {
                tracing::error!("Error updating {} {}: {}", table, id, err);
                None
            }
        }
    }

    pub async fn delete(&self, table: Table, id: i64) -> bool {
        let url = self.url(Some(table), &[("id", &id.to_string())]);
        match self.send(self.http.delete(url)).await {
            Ok(_) => true,
            Err(err) => {
                tracing::error!("Error deleting {} {}: {}", table, id, err);
                false
            }
        }
    }

    /// Find the user with this email and password.
    ///
    /// Passwords are stored and compared as plain text, as the users table
    /// has always held them.
    pub async fn authenticate(&self, email: &str, password: &str) -> Option<Value> {
        self.get_all(Table::Users).await.into_iter().find(|user| {
            user.get("email").and_then(Value::as_str) == Some(email)
                && user.get("password").and_then(Value::as_str) == Some(password)
        })
    }

    /// `true` when the gateway answers `pong`. Never touches the database.
    pub async fn ping(&self) -> Result<bool, ClientError> {
        let url = self.url(None, &[("ping", "1")]);
        let body = self.send(self.http.get(url)).await?;
        Ok(body.get("status").and_then(Value::as_str) == Some("pong"))
    }

    /// The gateway's health report. A failing database is reported in the
    /// body (`status: error`) rather than as an `Err`.
    pub async fn health(&self) -> Result<Value, ClientError> {
        let url = self.url(None, &[("health", "1")]);
        let response = self.http.get(url).send().await?;
        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_query_urls() {
        let client = CrmClient::new("http://localhost:8888/db").unwrap();
        let url = client.url(Some(Table::Clients), &[("status", "Lead"), ("ownerId", "3")]);
        assert_eq!(url.as_str(), "http://localhost:8888/db?type=clients&status=Lead&ownerId=3");
    }

    #[test]
    fn encodes_filter_values() {
        let client = CrmClient::new("http://localhost:8888/db").unwrap();
        let url = client.url(Some(Table::Users), &[("email", "a+b@example.com")]);
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs[1], ("email".to_string(), "a+b@example.com".to_string()));
    }

    #[test]
    fn rejects_bad_endpoints() {
        assert!(matches!(CrmClient::new("not a url"), Err(ClientError::InvalidUrl(_))));
    }
}
