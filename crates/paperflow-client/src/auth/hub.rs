//! Current session holder and listener registry

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::debug;

use super::listener::{SessionEvent, SessionEventKind, SessionListener};
use super::{Session, SubscriptionId, TokenSource};

/// Holds the current session and notifies listeners of every transition.
#[derive(Default)]
pub struct SessionHub {
    current: RwLock<Option<Session>>,
    listeners: DashMap<SubscriptionId, Arc<dyn SessionListener>>,
    next_id: AtomicU64,
}

impl SessionHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Session> {
        self.current.read().clone()
    }

    /// Register a listener and deliver the current session to it right away.
    pub fn subscribe(&self, listener: Arc<dyn SessionListener>) -> SubscriptionId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.listeners.insert(id, listener.clone());

        listener.on_session_change(SessionEvent {
            kind: SessionEventKind::InitialSession,
            session: self.current(),
        });
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.listeners.remove(&id).is_some()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Replace the current session and notify every listener.
    pub fn transition(&self, kind: SessionEventKind, session: Option<Session>) {
        *self.current.write() = session.clone();

        // Snapshot first so a listener may (un)subscribe from its callback
        let listeners: Vec<Arc<dyn SessionListener>> = self
            .listeners
            .iter()
            .map(|entry| entry.value().clone())
            .collect();

        debug!("Session {:?}, notifying {} listener(s)", kind, listeners.len());
        for listener in listeners {
            listener.on_session_change(SessionEvent {
                kind,
                session: session.clone(),
            });
        }
    }
}

#[async_trait]
impl TokenSource for SessionHub {
    async fn access_token(&self) -> Option<String> {
        self.current().map(|s| s.access_token)
    }
}
