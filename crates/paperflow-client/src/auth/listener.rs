//! Session change listener trait and notification types

use super::Session;

/// What happened to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEventKind {
    /// Delivered once to each new listener with the session at that moment
    InitialSession,
    SignedIn,
    SignedOut,
    TokenRefreshed,
}

/// Session transition delivered to listeners
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionEvent {
    pub kind: SessionEventKind,
    pub session: Option<Session>,
}

/// Trait for receiving session transitions.
pub trait SessionListener: Send + Sync + 'static {
    fn on_session_change(&self, event: SessionEvent);
}

/// A simple listener that invokes a closure.
pub struct FnSessionListener<F>
where
    F: Fn(SessionEvent) + Send + Sync + 'static,
{
    f: F,
}

impl<F> FnSessionListener<F>
where
    F: Fn(SessionEvent) + Send + Sync + 'static,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> SessionListener for FnSessionListener<F>
where
    F: Fn(SessionEvent) + Send + Sync + 'static,
{
    fn on_session_change(&self, event: SessionEvent) {
        (self.f)(event);
    }
}
