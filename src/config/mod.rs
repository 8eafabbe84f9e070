//! Configuration module for the web API.
//!
//! Settings come from a per-environment JSON file bundled into the binary.
//! The three secrets (API username, API password, token secret) may be left
//! empty in the file and supplied through environment variables instead.
//! Process settings (bind address, log level, store timeout) are read from
//! the environment with defaults.

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use axum::http::HeaderValue;
use serde::Deserialize;

const STAGING: &str = include_str!("../../config/staging.json");
const PRODUCTION: &str = include_str!("../../config/production.json");

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no bundled configuration for environment '{0}'")]
    UnknownEnvironment(String),
    #[error("failed to parse config file; {0}")]
    Parse(#[from] serde_json::Error),
    #[error("allowedOriginHeader is not a valid header value: {0}")]
    InvalidOrigin(String),
    #[error("invalid bind address '{0}'")]
    InvalidBindAddr(String),
    #[error("invalid STORE_TIMEOUT_SECS '{0}'")]
    InvalidTimeout(String),
}

/// Shape of the bundled JSON files.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileConfig {
    #[serde(rename = "gcloudProjectID")]
    gcloud_project_id: String,
    firestore_database_name: String,
    allowed_origin_header: String,
    #[serde(default)]
    build_service_endpoint: String,
    #[serde(default)]
    backup_bucket_name: String,
    #[serde(default)]
    api_username: String,
    #[serde(default)]
    api_password: String,
    #[serde(default)]
    token_secret: String,
}

/// Application configuration. Read-only after startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Environment name selecting the bundled file (staging, production)
    pub environment: String,
    pub gcloud_project_id: String,
    pub firestore_database_name: String,
    /// Value of `Access-Control-Allow-Origin` on every response
    pub allowed_origin: HeaderValue,
    pub api_username: String,
    pub api_password: String,
    /// HMAC secret for issued tokens
    pub token_secret: String,
    /// URL receiving `POST /builds` triggers; empty disables builds
    pub build_service_endpoint: String,
    /// Identity token for the build service; fetched from the metadata
    /// server when absent
    pub build_identity_token: Option<String>,
    /// Bucket receiving Firestore exports; empty disables backups
    pub backup_bucket_name: String,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level used when RUST_LOG is unset
    pub log_level: String,
    /// Upper bound for every document store call
    pub store_timeout: Duration,
    /// Fixed OAuth access token for the store; fetched from the metadata
    /// server when absent
    pub access_token: Option<String>,
    /// `host:port` of a local Firestore emulator
    pub firestore_emulator_host: Option<String>,
}

impl Config {
    /// Load configuration from the bundled file and process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let environment = var("ENVIRONMENT").unwrap_or_else(|| "staging".to_string());
        let raw = match environment.as_str() {
            "staging" => STAGING,
            "production" => PRODUCTION,
            other => return Err(ConfigError::UnknownEnvironment(other.to_string())),
        };
        let file: FileConfig = serde_json::from_str(raw)?;

        let allowed_origin = HeaderValue::from_str(&file.allowed_origin_header)
            .map_err(|_| ConfigError::InvalidOrigin(file.allowed_origin_header.clone()))?;

        let or_env = |value: String, key: &str| {
            if value.is_empty() {
                var(key).unwrap_or_default()
            } else {
                value
            }
        };
        let api_username = or_env(file.api_username, "API_USERNAME");
        let api_password = or_env(file.api_password, "API_PASSWORD");
        let token_secret = or_env(file.token_secret, "TOKEN_SECRET");
        let build_service_endpoint =
            or_env(file.build_service_endpoint, "BUILD_SERVICE_ENDPOINT");
        let backup_bucket_name = or_env(file.backup_bucket_name, "BACKUP_BUCKET_NAME");

        let bind_addr = var("BIND_ADDR").unwrap_or_else(|| {
            format!("0.0.0.0:{}", var("PORT").unwrap_or_else(|| "8080".to_string()))
        });
        let bind_addr: SocketAddr = bind_addr
            .parse()
            .map_err(|_| ConfigError::InvalidBindAddr(bind_addr.clone()))?;

        let store_timeout = match var("STORE_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::InvalidTimeout(raw))?,
            None => Duration::from_secs(10),
        };

        Ok(Self {
            environment,
            gcloud_project_id: file.gcloud_project_id,
            firestore_database_name: file.firestore_database_name,
            allowed_origin,
            api_username,
            api_password,
            token_secret,
            build_service_endpoint,
            build_identity_token: var("BUILD_SERVICE_ID_TOKEN"),
            backup_bucket_name,
            bind_addr,
            log_level: var("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            store_timeout,
            access_token: var("GOOGLE_OAUTH_ACCESS_TOKEN"),
            firestore_emulator_host: var("FIRESTORE_EMULATOR_HOST"),
        })
    }

    /// Fixed configuration for tests.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            environment: "test".to_string(),
            gcloud_project_id: "test".to_string(),
            firestore_database_name: "(default)".to_string(),
            allowed_origin: HeaderValue::from_static("https://example.com"),
            api_username: "admin".to_string(),
            api_password: "hunter2".to_string(),
            token_secret: "test-token-secret".to_string(),
            build_service_endpoint: String::new(),
            build_identity_token: Some("test-identity-token".to_string()),
            backup_bucket_name: "web-api-test-backups".to_string(),
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            log_level: "warn".to_string(),
            store_timeout: Duration::from_secs(5),
            access_token: Some("test-access-token".to_string()),
            firestore_emulator_host: None,
        }
    }
}
