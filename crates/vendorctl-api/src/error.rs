//! Error types for the vendor API gateway.
//!
//! This module defines all error types that can occur while talking to the
//! vendor REST API.

use std::fmt;

/// Errors that can occur during vendor API calls.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The requested object does not exist on the remote side.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// The kind of object that was not found (`cluster`, `customer`).
        kind: String,
        /// The id that was looked up.
        id: String,
    },

    /// The remote side rejected the request payload.
    #[error("Validation failed: {message}")]
    Validation {
        /// Message reported by the remote side.
        message: String,
    },

    /// Any other non-success HTTP status.
    #[error("HTTP error: status {status}: {body}")]
    Http {
        /// The response status code.
        status: u16,
        /// The raw response body.
        body: String,
    },

    /// The request never produced a response.
    #[error("Transport error: {message}")]
    Transport {
        /// Description of the transport failure.
        message: String,
    },

    /// The response body could not be decoded.
    #[error("Failed to decode response: {message}")]
    Decode {
        /// Description of the decoding failure.
        message: String,
    },
}

impl ApiError {
    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: kind.into(),
            id: id.into(),
        }
    }

    /// Creates a new `Validation` error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates a new `Http` error.
    #[must_use]
    pub fn http(status: u16, body: impl Into<String>) -> Self {
        Self::Http {
            status,
            body: body.into(),
        }
    }

    /// Creates a new `Transport` error.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates a new `Decode` error.
    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Returns `true` if the remote object does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::Validation { .. } => ErrorCategory::Validation,
            Self::Http { status, .. } if *status == 401 || *status == 403 => ErrorCategory::Auth,
            Self::Http { .. } => ErrorCategory::Remote,
            Self::Transport { .. } => ErrorCategory::Transport,
            Self::Decode { .. } => ErrorCategory::Decode,
        }
    }
}

/// Categories of API errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Remote object is absent.
    NotFound,
    /// Payload rejected.
    Validation,
    /// Credentials rejected.
    Auth,
    /// Other remote failure.
    Remote,
    /// Connection or timeout failure.
    Transport,
    /// Unexpected response shape.
    Decode,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::Validation => write!(f, "validation"),
            Self::Auth => write!(f, "auth"),
            Self::Remote => write!(f, "remote"),
            Self::Transport => write!(f, "transport"),
            Self::Decode => write!(f, "decode"),
        }
    }
}
