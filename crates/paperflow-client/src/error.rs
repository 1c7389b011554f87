//! Client error types for the PaperFlow backend

use crate::store::TableKind;

/// Failure talking to the managed backend over HTTP
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("request failed with status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl HttpError {
    /// HTTP status code, when the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            HttpError::Status { status, .. } => Some(*status),
            HttpError::Transport(e) => e.status().map(|s| s.as_u16()),
            HttpError::Decode(_) => None,
        }
    }
}

/// Error type for data store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0}")]
    Http(#[from] HttpError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{table} unavailable: {message}")]
    Unavailable { table: TableKind, message: String },

    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Error type for auth provider operations
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("user already registered: {0}")]
    AlreadyRegistered(String),

    #[error("not signed in")]
    NotSignedIn,

    #[error("{0}")]
    Http(#[from] HttpError),
}

pub type AuthResult<T> = std::result::Result<T, AuthError>;
