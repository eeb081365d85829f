//! Error types for the fetch client.
//!
//! # Design
//! Nothing in this module ever escapes `HttpClient` as an `Err`. Transport
//! and build failures are folded into `HttpResult::Failure` as a
//! `WrappedError`, which keeps only the human-readable message. Application
//! errors (non-2xx responses) never become one of these types; they surface
//! as the decoded response payload.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure reported by a `Fetch` implementation when the network call itself
/// did not produce a response, or when a response body could not be read.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The connection could not be established (DNS, refused, reset).
    #[error("{0}")]
    Connect(String),

    /// Low-level I/O failure while talking to the peer.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A body reader (`json` / `text`) failed.
    #[error("{0}")]
    Body(String),

    #[error("{0}")]
    Other(String),
}

/// Failure detected while building a request, before anything is dispatched.
#[derive(Debug, Error)]
pub enum BuildError {
    /// GET and HEAD carry their payload in the URL; this payload has no
    /// query-string form.
    #[error("{method} request cannot carry a {shape} payload")]
    UnsupportedQuery {
        method: &'static str,
        shape: &'static str,
    },

    #[error("failed to serialize request payload: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Minimal error carrier for failures that happened before a response existed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{message}")]
pub struct WrappedError {
    pub message: String,
}

impl WrappedError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Capture only the message of `error`.
    pub fn from_error(error: &dyn std::error::Error) -> Self {
        Self::new(error.to_string())
    }
}

impl From<TransportError> for WrappedError {
    fn from(error: TransportError) -> Self {
        Self::from_error(&error)
    }
}

impl From<BuildError> for WrappedError {
    fn from(error: BuildError) -> Self {
        Self::from_error(&error)
    }
}
