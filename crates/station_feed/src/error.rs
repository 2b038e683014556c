//! Error types for the station feed.
//!
//! Each stage of the pipeline has its own error enum so callers can decide
//! what is fatal: a retrieval or extraction failure at startup aborts the
//! process, while stream and per-message errors are isolated and logged.

use std::io::Error as IoError;
use thiserror::Error;

/// Failures of the external document fetch collaborator.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("request to {locator} failed: {reason}")]
    Request { locator: String, reason: String },

    #[error("HTTP {status} from {locator}")]
    Status { locator: String, status: u16 },

    #[error("failed to read response body from {locator}: {reason}")]
    Body { locator: String, reason: String },

    #[error("failed to read {locator}: {source}")]
    Io {
        locator: String,
        #[source]
        source: IoError,
    },
}

/// Failures while recovering the marker table from document text.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("malformed input at byte {offset}: {reason}")]
    MalformedInput { offset: usize, reason: String },

    #[error("failed to parse normalized object literal at byte {offset}: {message}\nAround: {context}")]
    Normalization {
        message: String,
        offset: usize,
        context: String,
    },

    #[error("declaration `{0}` not found in document")]
    DeclarationNotFound(String),
}

/// A reference table could not be produced for this run.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("document retrieval failed: {0}")]
    Retrieval(#[from] RetrievalError),

    #[error("marker extraction failed: {0}")]
    Extract(#[from] ExtractError),
}

/// Why a single connection attempt ended.
///
/// A receiver always ends with one of these; none of them are retried by the
/// receiver itself.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("invalid stream target {target}: {reason}")]
    InvalidTarget { target: String, reason: String },

    #[error("handshake with {target} failed: {reason}")]
    Handshake { target: String, reason: String },

    #[error("could not connect to {target}: {reason}")]
    Connect { target: String, reason: String },

    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    #[error("message queue closed")]
    QueueClosed,
}

impl StreamError {
    /// True for failures that happened before any frame could be received.
    pub fn is_connect_failure(&self) -> bool {
        matches!(
            self,
            StreamError::InvalidTarget { .. }
                | StreamError::Handshake { .. }
                | StreamError::Connect { .. }
        )
    }
}

/// Per-message problems. These never stop the consumer.
#[derive(Debug, Error)]
pub enum MessageError {
    #[error("message is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{username}: invalid position {position}")]
    Position { username: String, position: String },
}
