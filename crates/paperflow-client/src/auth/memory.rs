//! In-process auth provider

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use dashmap::DashMap;
use paperflow_api::{validate_email, validate_password};
use tracing::info;
use uuid::Uuid;

use super::hub::SessionHub;
use super::listener::{SessionEventKind, SessionListener};
use super::{AuthProvider, AuthUser, Session, SignUpOutcome, SubscriptionId, TokenSource};
use crate::error::{AuthError, AuthResult};

struct Account {
    user: AuthUser,
    password: String,
    confirmed: bool,
}

/// Auth provider keeping accounts in memory
pub struct MemoryAuth {
    accounts: DashMap<String, Account>,
    require_confirmation: bool,
    hub: Arc<SessionHub>,
}

impl Default for MemoryAuth {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryAuth {
    /// Accounts are active right after sign-up
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
            require_confirmation: false,
            hub: Arc::new(SessionHub::new()),
        }
    }

    /// Accounts must be confirmed with [`MemoryAuth::confirm`] before signing in
    pub fn with_confirmation() -> Self {
        Self {
            require_confirmation: true,
            ..Self::new()
        }
    }

    /// Register a confirmed account directly
    pub fn register(&self, email: &str, password: &str) -> AuthUser {
        let user = AuthUser {
            id: Uuid::new_v4(),
            email: email.to_string(),
        };
        self.accounts.insert(
            email.to_string(),
            Account {
                user: user.clone(),
                password: password.to_string(),
                confirmed: true,
            },
        );
        user
    }

    /// Mark an account as confirmed. Returns false for unknown emails.
    pub fn confirm(&self, email: &str) -> bool {
        match self.accounts.get_mut(email) {
            Some(mut account) => {
                account.confirmed = true;
                true
            }
            None => false,
        }
    }

    pub fn hub(&self) -> Arc<SessionHub> {
        self.hub.clone()
    }

    fn issue(user: AuthUser) -> Session {
        Session {
            access_token: Uuid::new_v4().to_string(),
            refresh_token: Some(Uuid::new_v4().to_string()),
            expires_at: Utc::now() + Duration::hours(1),
            user,
        }
    }

    fn check_input(email: &str, password: &str) -> AuthResult<()> {
        validate_email(email).map_err(|e| AuthError::InvalidInput(e.code.to_string()))?;
        validate_password(password).map_err(|e| AuthError::InvalidInput(e.code.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl AuthProvider for MemoryAuth {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> AuthResult<Session> {
        Self::check_input(email, password)?;

        let user = {
            let account = self
                .accounts
                .get(email)
                .filter(|a| a.password == password)
                .ok_or_else(|| AuthError::InvalidCredentials("Invalid login credentials".to_string()))?;
            if !account.confirmed {
                return Err(AuthError::InvalidCredentials(
                    "Email not confirmed".to_string(),
                ));
            }
            account.user.clone()
        };

        let session = Self::issue(user);
        info!("Signed in as {}", session.user.email);
        self.hub
            .transition(SessionEventKind::SignedIn, Some(session.clone()));
        Ok(session)
    }

    async fn sign_up(&self, email: &str, password: &str) -> AuthResult<SignUpOutcome> {
        Self::check_input(email, password)?;

        if self.accounts.contains_key(email) {
            return Err(AuthError::AlreadyRegistered(email.to_string()));
        }

        let user = AuthUser {
            id: Uuid::new_v4(),
            email: email.to_string(),
        };
        self.accounts.insert(
            email.to_string(),
            Account {
                user: user.clone(),
                password: password.to_string(),
                confirmed: !self.require_confirmation,
            },
        );

        if self.require_confirmation {
            return Ok(SignUpOutcome::ConfirmationRequired {
                email: email.to_string(),
            });
        }

        let session = Self::issue(user);
        self.hub
            .transition(SessionEventKind::SignedIn, Some(session.clone()));
        Ok(SignUpOutcome::SignedIn(session))
    }

    async fn sign_out(&self) -> AuthResult<()> {
        if self.hub.current().is_some() {
            self.hub.transition(SessionEventKind::SignedOut, None);
        }
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
impl TokenSource for MemoryAuth {
    async fn access_token(&self) -> Option<String> {
        self.hub.current().map(|s| s.access_token)
    }
}
