use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub drive: DriveConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

/// What the gateway does when a write names a column the table lacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaPolicy {
    /// Add the missing column (INTEGER for `*Id` keys, TEXT otherwise) and retry once.
    SelfHeal,
    /// Reject fields outside the table's known field list before touching the database.
    Strict,
}

impl SchemaPolicy {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "self_heal" | "self-heal" | "selfheal" => Some(SchemaPolicy::SelfHeal),
            "strict" => Some(SchemaPolicy::Strict),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Connection string. `None` is a configuration error reported per request.
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub schema_policy: SchemaPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub max_limit: Option<i64>,
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub cors_origins: Vec<String>,
    pub session_expiry_hours: u64,
    pub session_secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriveConfig {
    pub api_base_url: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            if !v.trim().is_empty() {
                self.database.url = Some(v);
            }
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Ok(v) = env::var("DATABASE_SCHEMA_POLICY") {
            self.database.schema_policy = SchemaPolicy::parse(&v).unwrap_or(self.database.schema_policy);
        }

        // API overrides
        if let Ok(v) = env::var("CRM_API_PORT").or_else(|_| env::var("PORT")) {
            self.api.port = v.parse().unwrap_or(self.api.port);
        }
        if let Ok(v) = env::var("API_MAX_LIMIT") {
            self.api.max_limit = v.parse().ok();
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Ok(v) = env::var("SECURITY_SESSION_EXPIRY_HOURS") {
            self.security.session_expiry_hours = v.parse().unwrap_or(self.security.session_expiry_hours);
        }
        if let Ok(v) = env::var("SESSION_SECRET") {
            self.security.session_secret = v;
        }

        if let Ok(v) = env::var("DRIVE_API_BASE_URL") {
            self.drive.api_base_url = v;
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                url: None,
                max_connections: 5,
                connection_timeout: 30,
                schema_policy: SchemaPolicy::SelfHeal,
            },
            api: ApiConfig {
                port: 8888,
                max_limit: Some(1000),
                enable_request_logging: true,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
            security: SecurityConfig {
                cors_origins: vec!["*".to_string()],
                session_expiry_hours: 24 * 7, // 1 week
                session_secret: "development-session-secret".to_string(),
            },
            drive: DriveConfig::default(),
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 10,
                schema_policy: SchemaPolicy::SelfHeal,
            },
            api: ApiConfig {
                port: 8888,
                max_limit: Some(500),
                enable_request_logging: true,
                max_request_size_bytes: 5 * 1024 * 1024, // 5MB
            },
            security: SecurityConfig {
                cors_origins: vec!["*".to_string()],
                session_expiry_hours: 24,
                session_secret: String::new(),
            },
            drive: DriveConfig::default(),
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 5,
                schema_policy: SchemaPolicy::Strict,
            },
            api: ApiConfig {
                port: 8888,
                max_limit: Some(500),
                enable_request_logging: false,
                max_request_size_bytes: 2 * 1024 * 1024, // 2MB
            },
            security: SecurityConfig {
                cors_origins: vec![],
                session_expiry_hours: 12,
                session_secret: String::new(),
            },
            drive: DriveConfig::default(),
        }
    }
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://www.googleapis.com/drive/v3".to_string(),
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn development_defaults_self_heal() {
        let config = AppConfig::development();
        assert_eq!(config.database.schema_policy, SchemaPolicy::SelfHeal);
        assert!(config.database.url.is_none());
        assert_eq!(config.api.max_limit, Some(1000));
    }

    #[test]
    fn production_defaults_strict() {
        let config = AppConfig::production();
        assert_eq!(config.database.schema_policy, SchemaPolicy::Strict);
        assert!(config.security.session_secret.is_empty());
    }

    #[test]
    fn parses_schema_policy_names() {
        assert_eq!(SchemaPolicy::parse("self-heal"), Some(SchemaPolicy::SelfHeal));
        assert_eq!(SchemaPolicy::parse(" STRICT "), Some(SchemaPolicy::Strict));
        assert_eq!(SchemaPolicy::parse("lenient"), None);
    }
}
