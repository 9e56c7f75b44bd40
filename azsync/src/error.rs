//! Error types for resource clients and reconciliation.

use std::fmt;

use thiserror::Error;

/// Errors returned by resource client adapters.
///
/// These are raw transport outcomes. Interpretation (not found, cancelled,
/// retryable) is done by [`classify`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// The API answered with a non-success status code.
    #[error("{operation}: {message}: StatusCode={status}")]
    Api {
        operation: String,
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// The request never produced a response.
    #[error("{operation}: request failed: {source}")]
    Transport {
        operation: String,
        #[source]
        source: reqwest::Error,
    },

    /// The response body could not be decoded.
    #[error("{operation}: failed to decode response: {source}")]
    Decode {
        operation: String,
        #[source]
        source: serde_json::Error,
    },

    /// A long-running operation reached a terminal failure state.
    #[error("{operation}: long-running operation {status}: {message}")]
    OperationFailed {
        operation: String,
        status: String,
        code: Option<String>,
        message: String,
    },

    /// The response was well-formed but not what the protocol allows.
    #[error("{operation}: invalid response: {message}")]
    InvalidResponse { operation: String, message: String },

    /// The caller cancelled while the request was in flight.
    #[error("operation cancelled")]
    Cancelled,

    /// The caller's deadline passed while the request was in flight.
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

impl ClientError {
    /// Build an API error from a status code and message.
    pub fn api(operation: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        ClientError::Api {
            operation: operation.into(),
            status,
            code: None,
            message: message.into(),
        }
    }

    /// HTTP status code carried by the error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Transport { source, .. } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Semantic class of a client error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    NotFound,
    Cancelled,
    Transient,
    Permanent,
}

/// Classify a client error.
///
/// Only `NotFound` and `Cancelled` change what the reconciliation service
/// does; the transient/permanent split is exposed for callers that schedule
/// retries.
pub fn classify(err: &ClientError) -> ErrorClass {
    match err {
        ClientError::Cancelled | ClientError::DeadlineExceeded => ErrorClass::Cancelled,
        ClientError::Transport { source, .. } if source.is_connect() || source.is_timeout() => {
            ErrorClass::Transient
        }
        _ => match err.status_code() {
            Some(404) => ErrorClass::NotFound,
            Some(408) | Some(429) => ErrorClass::Transient,
            Some(status) if status >= 500 => ErrorClass::Transient,
            _ => ErrorClass::Permanent,
        },
    }
}

/// Returns true if the error means the resource does not exist.
pub fn is_not_found(err: &ClientError) -> bool {
    classify(err) == ErrorClass::NotFound
}

/// Operation the reconciliation service was performing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Get,
    Create,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Get => write!(f, "get"),
            Operation::Create => write!(f, "create"),
            Operation::Delete => write!(f, "delete"),
        }
    }
}

/// Errors returned by the reconciliation service.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The specification belongs to a different resource kind.
    #[error("invalid {kind} Specification")]
    InvalidSpecification { kind: &'static str },

    #[error("{kind} {name} not found: {source}")]
    NotFound {
        kind: &'static str,
        name: String,
        #[source]
        source: ClientError,
    },

    #[error("failed to create {kind} {name} in resource group {resource_group}: {source}")]
    CreateFailed {
        kind: &'static str,
        name: String,
        resource_group: String,
        #[source]
        source: ClientError,
    },

    #[error("failed to delete {kind} {name} in resource group {resource_group}: {source}")]
    DeleteFailed {
        kind: &'static str,
        name: String,
        resource_group: String,
        #[source]
        source: ClientError,
    },

    /// The caller gave up waiting on the provider.
    #[error(
        "cancelled while waiting to {operation} {kind} {name} in resource group {resource_group}: {source}"
    )]
    Cancelled {
        operation: Operation,
        kind: &'static str,
        name: String,
        resource_group: String,
        #[source]
        source: ClientError,
    },

    #[error(transparent)]
    Client(#[from] ClientError),
}

impl ReconcileError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ReconcileError::Cancelled { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ReconcileError::NotFound { .. })
    }
}
