//! HTTP client for the herald backend.
//!
//! Every JSON endpoint answers with an envelope carrying a `success` flag.
//! [`HeraldClient::send`] checks the HTTP status and the flag before the
//! payload is decoded, so callers only ever see the payload or an
//! [`Error::Rejected`] holding the backend's own message.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};

use herald_core::config::ServerConfig;
use herald_core::{defaults, Error, HeraldConfig, Result};

/// HTTP client for the notification, backup and audit log endpoints.
#[derive(Debug, Clone)]
pub struct HeraldClient {
    client: Client,
    config: ServerConfig,
}

impl HeraldClient {
    /// Create a new client for the given server.
    pub fn new(config: ServerConfig) -> Result<Self> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        if let Some(ref cookie) = config.session_cookie {
            let value = HeaderValue::from_str(cookie)
                .map_err(|e| Error::Config(format!("Invalid session cookie: {}", e)))?;
            headers.insert(COOKIE, value);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            base_url = %config.base_url,
            authenticated = config.session_cookie.is_some(),
            "Initializing herald client"
        );

        Ok(Self { client, config })
    }

    /// Create from a loaded herald configuration.
    pub fn from_config(config: &HeraldConfig) -> Result<Self> {
        Self::new(config.server.clone())
    }

    /// Create from `HERALD_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_config(&HeraldConfig::from_env())
    }

    /// Get the current configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Absolute URL for an endpoint path.
    pub(crate) fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), endpoint)
    }

    /// Build a GET request.
    pub(crate) fn build_get_request(&self, endpoint: &str) -> RequestBuilder {
        self.client.get(self.url(endpoint))
    }

    /// Build a mutating request carrying the CSRF token.
    pub(crate) fn build_request(&self, method: Method, endpoint: &str) -> RequestBuilder {
        let mut req = self.client.request(method, self.url(endpoint));

        if let Some(ref token) = self.config.csrf_token {
            req = req.header(defaults::CSRF_HEADER, token);
        }

        req.header("Content-Type", "application/json")
    }

    /// Send a request and decode the payload of a successful envelope.
    pub(crate) async fn send<T: DeserializeOwned>(&self, req: RequestBuilder, op: &str) -> Result<T> {
        let response = req.send().await.map_err(|e| {
            warn!(op = op, error = %e, "Request failed");
            Error::Request(format!("{} failed: {}", op, e))
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Request(format!("{} failed reading body: {}", op, e)))?;

        let value = match serde_json::from_str::<JsonValue>(&body) {
            Ok(value) => value,
            Err(e) if status.is_success() => {
                return Err(Error::Serialization(format!(
                    "{} returned invalid JSON: {}",
                    op, e
                )))
            }
            Err(_) => return Err(rejection(status, None)),
        };

        let flagged_ok = value
            .get("success")
            .and_then(JsonValue::as_bool)
            .unwrap_or(status.is_success());

        if !status.is_success() || !flagged_ok {
            let err = rejection(status, Some(&value));
            warn!(
                op = op,
                status = status.as_u16(),
                error = %err,
                "Request rejected"
            );
            return Err(err);
        }

        debug!(op = op, status = status.as_u16(), "Request succeeded");
        serde_json::from_value(value)
            .map_err(|e| Error::Serialization(format!("{} returned unexpected body: {}", op, e)))
    }
}

/// Map a refused response to an error carrying the backend's message.
fn rejection(status: StatusCode, body: Option<&JsonValue>) -> Error {
    let message = body
        .and_then(|v| v.get("error").or_else(|| v.get("message")))
        .and_then(JsonValue::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status));

    if status == StatusCode::NOT_FOUND {
        Error::NotFound(message)
    } else {
        Error::Rejected(message)
    }
}
