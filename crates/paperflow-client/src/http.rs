//! HTTP client for the managed backend
//!
//! Wraps `reqwest` with the headers every backend call carries (`apikey` and a bearer
//! token) and the error mapping shared by the REST and auth endpoints. Requests are
//! issued once: there is no retry and no failover.

use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error};

use crate::error::HttpError;

/// Configuration for the backend HTTP client
#[derive(Clone, Debug)]
pub struct SupabaseConfig {
    /// Project base URL (e.g. "https://xyz.supabase.co")
    pub url: String,
    /// Public anon key, sent as `apikey` and as the bearer token when signed out
    pub anon_key: String,
    /// Connection timeout in milliseconds
    pub connect_timeout_ms: u64,
    /// Read timeout in milliseconds
    pub read_timeout_ms: u64,
    /// REST endpoint prefix (default: "/rest/v1")
    pub rest_path: String,
    /// Auth endpoint prefix (default: "/auth/v1")
    pub auth_path: String,
}

impl Default for SupabaseConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:54321".to_string(),
            anon_key: String::new(),
            connect_timeout_ms: 5000,
            read_timeout_ms: 30000,
            rest_path: "/rest/v1".to_string(),
            auth_path: "/auth/v1".to_string(),
        }
    }
}

impl SupabaseConfig {
    /// Create a new config for a project URL and anon key
    pub fn new(url: &str, anon_key: &str) -> Self {
        Self {
            url: url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            ..Default::default()
        }
    }

    /// Set timeouts
    pub fn with_timeouts(mut self, connect_ms: u64, read_ms: u64) -> Self {
        self.connect_timeout_ms = connect_ms;
        self.read_timeout_ms = read_ms;
        self
    }

    /// Set the REST endpoint prefix
    pub fn with_rest_path(mut self, path: &str) -> Self {
        self.rest_path = path.to_string();
        self
    }

    /// Set the auth endpoint prefix
    pub fn with_auth_path(mut self, path: &str) -> Self {
        self.auth_path = path.to_string();
        self
    }
}

/// HTTP client shared by the store and auth adapters
#[derive(Clone, Debug)]
pub struct SupabaseHttpClient {
    client: Client,
    config: SupabaseConfig,
}

impl SupabaseHttpClient {
    /// Create a new HTTP client
    pub fn new(config: SupabaseConfig) -> Result<Self, HttpError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .timeout(Duration::from_millis(config.read_timeout_ms))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &SupabaseConfig {
        &self.config
    }

    /// URL of a table under the REST prefix
    pub fn rest_url(&self, table: &str) -> String {
        self.build_url(&self.config.rest_path, &format!("/{}", table))
    }

    /// URL of an endpoint under the auth prefix
    pub fn auth_url(&self, endpoint: &str) -> String {
        self.build_url(&self.config.auth_path, endpoint)
    }

    /// Build full URL from prefix and path
    fn build_url(&self, prefix: &str, path: &str) -> String {
        let prefix = prefix.trim_end_matches('/');
        if prefix.is_empty() {
            format!("{}{}", self.config.url, path)
        } else {
            format!(
                "{}/{}{}",
                self.config.url,
                prefix.trim_start_matches('/'),
                path
            )
        }
    }

    /// Start a request carrying `apikey` and a bearer token.
    ///
    /// Without a session token the anon key is the bearer.
    pub fn request(&self, method: Method, url: &str, bearer: Option<&str>) -> RequestBuilder {
        let token = bearer.unwrap_or(&self.config.anon_key);
        self.client
            .request(method, url)
            .header("apikey", &self.config.anon_key)
            .bearer_auth(token)
    }

    /// Send the request and parse a JSON body
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, HttpError> {
        let response = self.send(request).await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Send the request and discard any body
    pub async fn send_empty(&self, request: RequestBuilder) -> Result<(), HttpError> {
        self.send(request).await?;
        Ok(())
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, HttpError> {
        let response = request.send().await?;
        let status = response.status();
        debug!("{} {}", status.as_u16(), response.url().path());

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message(&body);
        error!("Request failed with status {}: {}", status, message);
        Err(HttpError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

/// Pull a human readable message out of a backend error body.
///
/// The REST endpoints answer `{"message": ..}`, the auth endpoints use `msg`,
/// `error_description` or `error` depending on the failure.
pub fn error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "msg", "error_description", "error"] {
            if let Some(message) = value.get(key).and_then(|v| v.as_str()) {
                return message.to_string();
            }
        }
    }
    body.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = SupabaseConfig::default();
        assert_eq!(config.url, "http://127.0.0.1:54321");
        assert_eq!(config.connect_timeout_ms, 5000);
        assert_eq!(config.rest_path, "/rest/v1");
    }

    #[test]
    fn test_config_builder() {
        let config = SupabaseConfig::new("https://demo.supabase.co/", "anon")
            .with_timeouts(3000, 15000)
            .with_rest_path("/api")
            .with_auth_path("/gotrue");

        assert_eq!(config.url, "https://demo.supabase.co");
        assert_eq!(config.anon_key, "anon");
        assert_eq!(config.connect_timeout_ms, 3000);
        assert_eq!(config.read_timeout_ms, 15000);
        assert_eq!(config.rest_path, "/api");
        assert_eq!(config.auth_path, "/gotrue");
    }

    #[test]
    fn test_build_urls() {
        let client =
            SupabaseHttpClient::new(SupabaseConfig::new("http://localhost:54321", "k")).unwrap();

        assert_eq!(
            client.rest_url("contract_notes"),
            "http://localhost:54321/rest/v1/contract_notes"
        );
        assert_eq!(
            client.auth_url("/token"),
            "http://localhost:54321/auth/v1/token"
        );
    }

    #[test]
    fn test_build_url_without_prefix() {
        let config = SupabaseConfig::new("http://localhost:3000", "k").with_rest_path("");
        let client = SupabaseHttpClient::new(config).unwrap();
        assert_eq!(client.rest_url("sections"), "http://localhost:3000/sections");
    }

    #[test]
    fn test_error_message() {
        assert_eq!(
            error_message(r#"{"code":"23502","message":"null value in column \"title\""}"#),
            "null value in column \"title\""
        );
        assert_eq!(
            error_message(r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#),
            "Invalid login credentials"
        );
        assert_eq!(error_message(r#"{"msg":"User already registered"}"#), "User already registered");
        assert_eq!(error_message(" gateway timeout \n"), "gateway timeout");
    }
}
