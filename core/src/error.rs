//! Error types for the sync core.
//!
//! # Design
//! Errors are layered the way calls are: the store reports invariant
//! violations, the transport reports a missing response, the client folds
//! transport failures and non-2xx statuses into `RemoteError`, and the
//! controller folds everything into `IntentError` before turning it into a
//! user-facing outcome.

use crate::types::TodoId;

/// Invariant violations of the local store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("todo {0} is already present")]
    DuplicateId(TodoId),

    #[error("todo {0} is not present")]
    NotFound(TodoId),
}

/// No response was received from the server.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("http client could not be built: {0}")]
    Setup(String),

    #[error("{0}")]
    Other(String),
}

/// Failure of a single remote call.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("no response from server: {0}")]
    Transport(#[from] TransportError),

    /// The server answered with a non-2xx status.
    #[error("server rejected request with status {status}")]
    Rejected { status: u16, body: String },

    /// A 2xx response whose body is not the expected shape.
    #[error("response body could not be decoded: {0}")]
    InvalidBody(String),

    #[error("request body could not be encoded: {0}")]
    Encode(String),
}

/// Local validation failures, detected before any remote call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please enter a title")]
    EmptyTitle,
}

/// Everything that can stop an intent, caught at the controller boundary.
#[derive(Debug, thiserror::Error)]
pub enum IntentError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("todo {0} is not in the local store")]
    UnknownTodo(TodoId),

    #[error(transparent)]
    Remote(#[from] RemoteError),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] config::ConfigError),

    #[error("invalid API_URL `{url}`: {reason}")]
    InvalidApiUrl { url: String, reason: String },
}
