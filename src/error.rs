// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};
use std::collections::BTreeMap;

use crate::database::record::RecordError;
use crate::database::repository::WriteError;
use crate::database::table::IdentifierError;
use crate::config::Environment;
use crate::database::DatabaseError;
use crate::drive::DriveError;
use crate::filter::FilterError;

/// HTTP API error. Caller mistakes are 4xx, faults on our side 5xx.
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    ValidationError {
        message: String,
        field_errors: Option<BTreeMap<String, String>>,
    },
    InvalidJson(String),

    // 405 Method Not Allowed
    MethodNotAllowed(String),

    // 500 Internal Server Error
    Configuration(String),
    /// Driver message, shown to operators outside production
    Database(String),
    InternalServerError(String),

    // 502 Bad Gateway (external service issues)
    BadGateway(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::ValidationError { .. } | ApiError::InvalidJson(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Configuration(_) | ApiError::Database(_) | ApiError::InternalServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::InvalidJson(msg)
            | ApiError::MethodNotAllowed(msg)
            | ApiError::Configuration(msg)
            | ApiError::Database(msg)
            | ApiError::InternalServerError(msg)
            | ApiError::BadGateway(msg)
            | ApiError::ServiceUnavailable(msg) => msg,
            ApiError::ValidationError { message, .. } => message,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::ValidationError { .. } => "VALIDATION_ERROR",
            ApiError::InvalidJson(_) => "INVALID_JSON",
            ApiError::MethodNotAllowed(_) => "METHOD_NOT_ALLOWED",
            ApiError::Configuration(_) => "CONFIGURATION_ERROR",
            ApiError::Database(_) | ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::BadGateway(_) => "BAD_GATEWAY",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    /// Hide driver messages when running in production.
    pub fn for_environment(self, environment: &Environment) -> Self {
        match (self, environment) {
            (ApiError::Database(_), Environment::Production) => {
                ApiError::internal_server_error("Database error occurred")
            }
            (err, _) => err,
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        let mut response = json!({
            "error": self.message(),
            "code": self.error_code(),
        });
        if let ApiError::ValidationError { field_errors: Some(field_errors), .. } = self {
            response["field_errors"] = json!(field_errors);
        }
        response
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn validation_error(
        message: impl Into<String>,
        field_errors: Option<BTreeMap<String, String>>,
    ) -> Self {
        ApiError::ValidationError {
            message: message.into(),
            field_errors,
        }
    }

    pub fn method_not_allowed(message: impl Into<String>) -> Self {
        ApiError::MethodNotAllowed(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        ApiError::BadGateway(message.into())
    }
}

impl From<IdentifierError> for ApiError {
    fn from(err: IdentifierError) -> Self {
        ApiError::bad_request(err.to_string())
    }
}

impl From<RecordError> for ApiError {
    fn from(err: RecordError) -> Self {
        match err {
            RecordError::InvalidJson(msg) => ApiError::InvalidJson(format!("Invalid JSON format: {}", msg)),
            RecordError::UnknownFields { ref fields, .. } => {
                let field_errors = fields
                    .iter()
                    .map(|f| (f.clone(), "Unknown field".to_string()))
                    .collect();
                ApiError::validation_error(err.to_string(), Some(field_errors))
            }
            RecordError::SystemFieldNotAllowed(ref field) | RecordError::DuplicateColumn(ref field) => {
                let mut field_errors = BTreeMap::new();
                field_errors.insert(field.clone(), err.to_string());
                ApiError::validation_error("Invalid field", Some(field_errors))
            }
            other => ApiError::bad_request(other.to_string()),
        }
    }
}

impl From<FilterError> for ApiError {
    fn from(err: FilterError) -> Self {
        ApiError::bad_request(err.to_string())
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::ConfigMissing(_) | DatabaseError::InvalidDatabaseUrl => {
                tracing::error!("{}", err);
                ApiError::Configuration(err.to_string())
            }
            DatabaseError::ConnectionError(msg) => {
                tracing::error!("Database unavailable: {}", msg);
                ApiError::ServiceUnavailable("Database temporarily unavailable".to_string())
            }
            DatabaseError::Sqlx(sqlx_err) => {
                tracing::error!("SQLx error: {}", sqlx_err);
                ApiError::Database(format!("Database error: {}", sqlx_err))
            }
        }
    }
}

impl From<WriteError> for ApiError {
    fn from(err: WriteError) -> Self {
        match err {
            WriteError::Record(e) => e.into(),
            WriteError::Database(e) => e.into(),
        }
    }
}

impl From<DriveError> for ApiError {
    fn from(err: DriveError) -> Self {
        tracing::error!("Proxy Error: {}", err);
        ApiError::bad_gateway(format!("Proxy Error: {}", err))
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_table_is_a_bad_request() {
        let err: ApiError = IdentifierError::UnknownTable("invalid_table".to_string()).into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_json()["error"], "Invalid table type: invalid_table");
    }

    #[test]
    fn missing_configuration_is_a_server_fault() {
        let err: ApiError = DatabaseError::ConfigMissing("DATABASE_URL").into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.error_code(), "CONFIGURATION_ERROR");
    }

    #[test]
    fn driver_messages_hidden_in_production() {
        let err = ApiError::Database("Database error: relation \"x\" does not exist".to_string());
        let shown = ApiError::Database(err.message().to_string()).for_environment(&Environment::Development);
        assert!(shown.message().contains("relation"));

        let hidden = err.for_environment(&Environment::Production);
        assert_eq!(hidden.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(hidden.message(), "Database error occurred");

        let untouched = ApiError::bad_request("Missing body").for_environment(&Environment::Production);
        assert_eq!(untouched.message(), "Missing body");
    }

    #[test]
    fn unknown_fields_are_listed() {
        let err: ApiError = RecordError::UnknownFields {
            table: crate::database::Table::Clients,
            fields: vec!["leadScore".to_string()],
        }
        .into();
        let body = err.to_json();
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["field_errors"]["leadScore"], "Unknown field");
    }
}
