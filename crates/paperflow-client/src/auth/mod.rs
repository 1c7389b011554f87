//! Credential-based auth provider abstraction
//!
//! Providers own the current [`Session`] through a [`hub::SessionHub`], which fans
//! session transitions out to registered listeners. A listener registered with
//! `on_session_change` is called once immediately with the current session.

pub mod hub;
pub mod listener;
pub mod memory;
pub mod supabase;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AuthResult;

pub use listener::{FnSessionListener, SessionEvent, SessionEventKind, SessionListener};

/// Handle returned by `on_session_change`, used to unsubscribe
pub type SubscriptionId = u64;

/// The signed-in user
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: String,
}

/// An authenticated session
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub user: AuthUser,
}

impl Session {
    /// True when the access token expires within `window` of `now`
    pub fn expires_within(&self, window: Duration, now: DateTime<Utc>) -> bool {
        self.expires_at <= now + window
    }
}

/// Result of a sign-up
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SignUpOutcome {
    /// The account is active and signed in
    SignedIn(Session),
    /// The backend sent a confirmation email; sign in after confirming
    ConfirmationRequired { email: String },
}

/// Source of the bearer token for data requests
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// The current access token, refreshed if the provider supports it
    async fn access_token(&self) -> Option<String>;
}

/// Credential-based auth provider
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> AuthResult<Session>;

    async fn sign_up(&self, email: &str, password: &str) -> AuthResult<SignUpOutcome>;

    /// End the current session. Signing out without a session is a no-op.
    async fn sign_out(&self) -> AuthResult<()>;

    /// The current session, if any
    fn session(&self) -> Option<Session>;

    /// Register a listener for every session transition, starting with the current one
    fn on_session_change(&self, listener: Arc<dyn SessionListener>) -> SubscriptionId;

    /// Remove a listener. Returns false when the id is unknown.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}
