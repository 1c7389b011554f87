//! Auth provider backed by the hosted GoTrue endpoint
//!
//! Handles password sign-in and sign-up, caches the session in a [`SessionHub`] and
//! refreshes the access token shortly before it expires.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use paperflow_api::{validate_email, validate_password};
use reqwest::Method;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use super::hub::SessionHub;
use super::listener::{SessionEventKind, SessionListener};
use super::{AuthProvider, AuthUser, Session, SignUpOutcome, SubscriptionId, TokenSource};
use crate::error::{AuthError, AuthResult, HttpError};
use crate::http::SupabaseHttpClient;

/// Token refresh buffer: refresh 5 minutes before expiry
const TOKEN_REFRESH_BUFFER_SECS: i64 = 300;

/// Lifetime assumed when the backend omits `expires_in`
const DEFAULT_TOKEN_TTL_SECS: i64 = 3600;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    user: AuthUser,
}

impl TokenResponse {
    fn into_session(self) -> Session {
        let ttl = self.expires_in.unwrap_or(DEFAULT_TOKEN_TTL_SECS);
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at: Utc::now() + Duration::seconds(ttl),
            user: self.user,
        }
    }
}

/// `AuthProvider` over the GoTrue HTTP dialect
pub struct SupabaseAuth {
    http: SupabaseHttpClient,
    hub: Arc<SessionHub>,
}

impl SupabaseAuth {
    pub fn new(http: SupabaseHttpClient) -> Self {
        Self {
            http,
            hub: Arc::new(SessionHub::new()),
        }
    }

    /// The session holder, shareable with a data store as its token source
    pub fn hub(&self) -> Arc<SessionHub> {
        self.hub.clone()
    }

    fn check_input(email: &str, password: &str) -> AuthResult<()> {
        validate_email(email).map_err(|e| AuthError::InvalidInput(e.code.to_string()))?;
        validate_password(password).map_err(|e| AuthError::InvalidInput(e.code.to_string()))?;
        Ok(())
    }

    /// Exchange the refresh token for a new session.
    pub async fn refresh(&self) -> AuthResult<Session> {
        let refresh_token = self
            .hub
            .current()
            .and_then(|s| s.refresh_token)
            .ok_or(AuthError::NotSignedIn)?;

        let url = self.http.auth_url("/token");
        let request = self
            .http
            .request(Method::POST, &url, None)
            .query(&[("grant_type", "refresh_token")])
            .json(&json!({ "refresh_token": refresh_token }));

        let response: TokenResponse = self.http.send_json(request).await?;
        let session = response.into_session();
        debug!(
            "Token refreshed, expires at {}",
            session.expires_at.to_rfc3339()
        );
        self.hub
            .transition(SessionEventKind::TokenRefreshed, Some(session.clone()));
        Ok(session)
    }
}

#[async_trait]
impl AuthProvider for SupabaseAuth {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> AuthResult<Session> {
        Self::check_input(email, password)?;

        let url = self.http.auth_url("/token");
        let request = self
            .http
            .request(Method::POST, &url, None)
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": email, "password": password }));

        let response: TokenResponse = match self.http.send_json(request).await {
            Ok(response) => response,
            Err(HttpError::Status {
                status: 400 | 401,
                message,
            }) => return Err(AuthError::InvalidCredentials(message)),
            Err(e) => return Err(e.into()),
        };

        let session = response.into_session();
        info!("Signed in as {}", session.user.email);
        self.hub
            .transition(SessionEventKind::SignedIn, Some(session.clone()));
        Ok(session)
    }

    async fn sign_up(&self, email: &str, password: &str) -> AuthResult<SignUpOutcome> {
        Self::check_input(email, password)?;

        let url = self.http.auth_url("/signup");
        let request = self
            .http
            .request(Method::POST, &url, None)
            .json(&json!({ "email": email, "password": password }));

        let body: Value = match self.http.send_json(request).await {
            Ok(body) => body,
            Err(HttpError::Status { status: 422, message })
                if message.to_lowercase().contains("already") =>
            {
                return Err(AuthError::AlreadyRegistered(email.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        // With auto-confirm on the backend answers with a full session,
        // otherwise with the pending user only.
        if body.get("access_token").is_some() {
            let response: TokenResponse = serde_json::from_value(body)
                .map_err(|e| AuthError::Http(HttpError::Decode(e)))?;
            let session = response.into_session();
            info!("Signed up and signed in as {}", session.user.email);
            self.hub
                .transition(SessionEventKind::SignedIn, Some(session.clone()));
            return Ok(SignUpOutcome::SignedIn(session));
        }

        info!("Sign-up for {} awaits email confirmation", email);
        Ok(SignUpOutcome::ConfirmationRequired {
            email: email.to_string(),
        })
    }

    async fn sign_out(&self) -> AuthResult<()> {
        let Some(session) = self.hub.current() else {
            return Ok(());
        };

        let url = self.http.auth_url("/logout");
        let request = self
            .http
            .request(Method::POST, &url, Some(&session.access_token));

        // The local session ends even when the backend no longer knows the token
        if let Err(e) = self.http.send_empty(request).await {
            warn!("Remote sign-out failed, clearing local session: {}", e);
        }

        info!("Signed out {}", session.user.email);
        self.hub.transition(SessionEventKind::SignedOut, None);
        Ok(())
    }

    fn session(&self) -> Option<Session> {
        self.hub.current()
    }

    fn on_session_change(&self, listener: Arc<dyn SessionListener>) -> SubscriptionId {
        self.hub.subscribe(listener)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.hub.unsubscribe(id)
    }
}

#[async_trait]
impl TokenSource for SupabaseAuth {
    async fn access_token(&self) -> Option<String> {
        let session = self.hub.current()?;
        let window = Duration::seconds(TOKEN_REFRESH_BUFFER_SECS);

        if session.refresh_token.is_some() && session.expires_within(window, Utc::now()) {
            match self.refresh().await {
                Ok(refreshed) => return Some(refreshed.access_token),
                Err(e) => warn!("Token refresh failed, using current token: {}", e),
            }
        }
        Some(session.access_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::SupabaseConfig;

    fn auth() -> SupabaseAuth {
        let http = SupabaseHttpClient::new(SupabaseConfig::new("http://127.0.0.1:9", "anon")).unwrap();
        SupabaseAuth::new(http)
    }

    #[test]
    fn test_token_response_into_session() {
        let response: TokenResponse = serde_json::from_value(json!({
            "access_token": "jwt",
            "token_type": "bearer",
            "expires_in": 60,
            "refresh_token": "r1",
            "user": { "id": "00000000-0000-0000-0000-000000000000", "email": "kari@example.com", "role": "authenticated" }
        }))
        .unwrap();

        let before = Utc::now();
        let session = response.into_session();
        assert_eq!(session.access_token, "jwt");
        assert_eq!(session.refresh_token.as_deref(), Some("r1"));
        assert!(session.expires_at > before);
        assert!(session.expires_at <= Utc::now() + Duration::seconds(60));
    }

    #[tokio::test]
    async fn test_invalid_input_is_rejected_before_request() {
        let auth = auth();
        let err = auth
            .sign_in_with_password("not-an-email", "password123")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidInput(_)));

        let err = auth.sign_up("kari@example.com", "123").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_sign_out_without_session_is_noop() {
        let auth = auth();
        assert!(auth.sign_out().await.is_ok());
        assert!(auth.session().is_none());
    }

    #[tokio::test]
    async fn test_refresh_without_session() {
        let auth = auth();
        assert!(matches!(auth.refresh().await, Err(AuthError::NotSignedIn)));
        assert!(auth.access_token().await.is_none());
    }
}
