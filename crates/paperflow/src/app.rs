//! Session-driven application shell
//!
//! A [`PaperflowApp`] follows the auth provider's session: when a user signs in it
//! opens a [`Workspace`] acting as that user and starts reading the tables, and when
//! the session ends the workspace is dropped together with its cached tables.

use std::sync::Arc;

use paperflow_client::{
    AuthError, AuthProvider, AuthResult, DataStore, Session, SessionEvent, SessionEventKind,
    SessionListener, SignUpOutcome, SubscriptionId,
};
use paperflow_core::Workspace;
use parking_lot::{Mutex, RwLock};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Holds the workspace of the signed-in user, if any
struct WorkspaceSlot {
    store: Arc<dyn DataStore>,
    default_author: String,
    runtime: Option<Handle>,
    current: RwLock<Option<Arc<Workspace>>>,
    /// Bulk load started when the current workspace was opened
    loading: Mutex<Option<JoinHandle<()>>>,
}

impl WorkspaceSlot {
    fn get(&self) -> Option<Arc<Workspace>> {
        self.current.read().clone()
    }

    fn open(&self, session: &Session) {
        let acting_user = session.user.email.as_str();
        let mut current = self.current.write();
        if current
            .as_ref()
            .is_some_and(|w| w.acting_user() == acting_user)
        {
            return;
        }

        info!("Opening workspace for {}", acting_user);
        let workspace = Arc::new(
            Workspace::new(self.store.clone(), acting_user)
                .with_default_author(&self.default_author),
        );
        *current = Some(workspace.clone());

        let task = self.runtime.as_ref().map(|runtime| {
            runtime.spawn(async move {
                workspace.load_all().await;
            })
        });
        if let Some(previous) = std::mem::replace(&mut *self.loading.lock(), task) {
            previous.abort();
        }
    }

    fn close(&self) {
        if let Some(task) = self.loading.lock().take() {
            task.abort();
        }
        if self.current.write().take().is_some() {
            info!("Workspace closed");
        }
    }

    /// Wait for the current workspace's bulk load, running it here if none was started.
    async fn ready(&self) -> Option<Arc<Workspace>> {
        let task = self.loading.lock().take();
        if let Some(task) = task
            && let Err(e) = task.await
            && !e.is_cancelled()
        {
            warn!("Workspace load task failed: {}", e);
        }

        let workspace = self.get()?;
        if workspace.with_state(|s| s.is_loading()) {
            workspace.load_all().await;
        }
        Some(workspace)
    }
}

impl SessionListener for WorkspaceSlot {
    fn on_session_change(&self, event: SessionEvent) {
        match (event.kind, event.session) {
            (SessionEventKind::SignedOut, _) | (_, None) => self.close(),
            (_, Some(session)) => self.open(&session),
        }
    }
}

pub struct PaperflowApp {
    auth: Arc<dyn AuthProvider>,
    slot: Arc<WorkspaceSlot>,
    subscription: SubscriptionId,
}

impl PaperflowApp {
    /// Follow `auth`'s session; a session that already exists opens a workspace right away.
    ///
    /// Called inside a tokio runtime, every opened workspace starts loading in the
    /// background; [`PaperflowApp::ready`] waits for it either way.
    pub fn new(auth: Arc<dyn AuthProvider>, store: Arc<dyn DataStore>, default_author: &str) -> Self {
        let slot = Arc::new(WorkspaceSlot {
            store,
            default_author: default_author.to_string(),
            runtime: Handle::try_current().ok(),
            current: RwLock::new(None),
            loading: Mutex::new(None),
        });
        let subscription = auth.on_session_change(slot.clone());
        Self {
            auth,
            slot,
            subscription,
        }
    }

    pub fn session(&self) -> Option<Session> {
        self.auth.session()
    }

    /// Workspace of the signed-in user; `None` while signed out
    pub fn workspace(&self) -> Option<Arc<Workspace>> {
        self.slot.get()
    }

    /// Workspace of the signed-in user once its tables are loaded
    pub async fn ready(&self) -> Option<Arc<Workspace>> {
        self.slot.ready().await
    }

    /// Load the tables into the current workspace, if there is one.
    pub async fn refresh(&self) {
        if let Some(workspace) = self.workspace() {
            workspace.load_all().await;
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> AuthResult<Arc<Workspace>> {
        self.auth.sign_in_with_password(email, password).await?;
        self.loaded_workspace().await
    }

    /// Sign up; with confirmation off the new account is signed in and its workspace loaded.
    pub async fn sign_up(&self, email: &str, password: &str) -> AuthResult<SignUpOutcome> {
        let outcome = self.auth.sign_up(email, password).await?;
        if matches!(outcome, SignUpOutcome::SignedIn(_)) {
            self.loaded_workspace().await?;
        }
        Ok(outcome)
    }

    pub async fn sign_out(&self) -> AuthResult<()> {
        self.auth.sign_out().await
    }

    async fn loaded_workspace(&self) -> AuthResult<Arc<Workspace>> {
        self.ready().await.ok_or(AuthError::NotSignedIn)
    }
}

impl Drop for PaperflowApp {
    fn drop(&mut self) {
        self.auth.unsubscribe(self.subscription);
    }
}
