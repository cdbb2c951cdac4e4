//! Error taxonomy for reconciliation operations.

use std::fmt;

use vendorctl_api::{ApiError, ClusterStatus};
use vendorctl_core::CoreError;

/// Errors returned to the reconciliation driver.
///
/// Not-found on Read is not an error; it is reported as
/// [`ReadOutcome::Gone`](crate::resource::ReadOutcome::Gone).
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// Declared input was malformed or rejected by the vendor.
    #[error("Validation failed: {message}{}", orphan_hint(.created_id))]
    Validation {
        message: String,
        /// Id of a cluster the vendor created despite the feedback.
        created_id: Option<String>,
    },

    /// The remote object is absent where it was expected to exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: String, id: String },

    /// Any other vendor API failure.
    #[error("Remote server error: {0}")]
    RemoteServer(#[source] ApiError),

    /// The vendor answered with something the reconciler cannot use.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Persisted id is corrupt.
    #[error("Malformed identity '{id}': {reason}")]
    MalformedIdentity { id: String, reason: String },

    /// The cluster reached a terminal error status while waiting.
    #[error("cluster {cluster_id} failed to provision: status {status}")]
    ProvisionFailure {
        cluster_id: String,
        status: ClusterStatus,
    },
}

fn orphan_hint(created_id: &Option<String>) -> String {
    match created_id {
        Some(id) => format!(" (cluster {id} was created and must be removed)"),
        None => String::new(),
    }
}

impl ReconcileError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            created_id: None,
        }
    }

    pub fn malformed_response(message: impl Into<String>) -> Self {
        Self::MalformedResponse(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation { .. } => ErrorCategory::Validation,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::RemoteServer(_) | Self::MalformedResponse(_) => ErrorCategory::RemoteServer,
            Self::MalformedIdentity { .. } => ErrorCategory::MalformedIdentity,
            Self::ProvisionFailure { .. } => ErrorCategory::ProvisionFailure,
        }
    }
}

impl From<ApiError> for ReconcileError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::NotFound { kind, id } => Self::NotFound { kind, id },
            ApiError::Validation { message } => Self::validation(message),
            other => Self::RemoteServer(other),
        }
    }
}

impl From<CoreError> for ReconcileError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::MalformedIdentity { id, reason } => Self::MalformedIdentity { id, reason },
            input @ (CoreError::InvalidDuration { .. } | CoreError::InvalidTimestamp { .. }) => {
                Self::validation(input.to_string())
            }
        }
    }
}

/// Error categories for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    NotFound,
    RemoteServer,
    MalformedIdentity,
    ProvisionFailure,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::NotFound => write!(f, "not_found"),
            Self::RemoteServer => write!(f, "remote_server"),
            Self::MalformedIdentity => write!(f, "malformed_identity"),
            Self::ProvisionFailure => write!(f, "provision_failure"),
        }
    }
}

pub type Result<T> = std::result::Result<T, ReconcileError>;
