//! PaperFlow Client - collaborators for the managed backend
//!
//! This crate provides:
//! - `DataStore`: select/insert/update against the four PaperFlow tables
//! - `AuthProvider`: password sign-in, sign-up, sign-out and session-change notification
//! - Supabase adapters speaking the PostgREST and GoTrue HTTP dialects
//! - In-memory adapters with failure injection, for tests and embedding

pub mod auth;
pub mod error;
pub mod http;
pub mod store;

// HTTP re-exports
pub use http::{SupabaseConfig, SupabaseHttpClient};

// Store re-exports
pub use store::memory::{MemoryStore, StoreOp};
pub use store::supabase::SupabaseStore;
pub use store::{DataStore, Order, SelectQuery, TableKind, TableNames};

// Auth re-exports
pub use auth::hub::SessionHub;
pub use auth::listener::{FnSessionListener, SessionEvent, SessionEventKind, SessionListener};
pub use auth::memory::MemoryAuth;
pub use auth::supabase::SupabaseAuth;
pub use auth::{AuthProvider, AuthUser, Session, SignUpOutcome, SubscriptionId, TokenSource};

pub use error::{AuthError, AuthResult, HttpError, StoreError, StoreResult};
