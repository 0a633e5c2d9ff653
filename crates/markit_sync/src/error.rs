//! Error types for the sync layer.

use markit_core::CoreError;
use thiserror::Error;

/// Result type for controller operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Result type for remote gateway calls.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors reported by a remote gateway.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// Network or transport error.
    #[error("transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
        /// Whether the operation can be retried.
        retryable: bool,
    },

    /// Credentials were missing, expired or not allowed to see the rows.
    #[error("not authorized: {0}")]
    Unauthorized(String),

    /// The service answered with a non-success status.
    #[error("service rejected request ({status}): {message}")]
    Rejected {
        /// HTTP-like status code.
        status: u16,
        /// Message from the service.
        message: String,
    },

    /// A response body could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// The gateway is not reachable.
    #[error("service unavailable")]
    Offline,
}

impl ServiceError {
    /// Creates a retryable transport error.
    pub fn transport_retryable(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a non-retryable transport error.
    pub fn transport_fatal(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: false,
        }
    }

    /// Returns true if this error can be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            ServiceError::Transport { retryable, .. } => *retryable,
            ServiceError::Offline => true,
            ServiceError::Rejected { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Coarse classification of controller errors for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Initial load failed; offer a retry.
    FetchFailed,
    /// A create or delete failed; show a dismissible notice.
    MutationFailed,
    /// The change stream disconnected; the list may be stale.
    SubscriptionLost,
    /// Operation not valid in the current state.
    InvalidState,
    /// User input was rejected before reaching the service.
    Invalid,
}

/// Errors surfaced at the sync controller boundary.
///
/// Every gateway failure is wrapped into one of these kinds; raw transport
/// errors never reach the store or the view.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// Initial fetch failed.
    #[error("failed to load bookmarks: {0}")]
    FetchFailed(#[source] ServiceError),

    /// Create or delete failed.
    #[error("failed to save change: {0}")]
    MutationFailed(#[source] ServiceError),

    /// The change subscription could not be kept open.
    #[error("live updates lost: {0}")]
    SubscriptionLost(String),

    /// Operation called in the wrong state.
    #[error("cannot {operation} while {state}")]
    InvalidState {
        /// Current state name.
        state: String,
        /// Attempted operation.
        operation: String,
    },

    /// Input validation failed.
    #[error(transparent)]
    Invalid(#[from] CoreError),
}

impl SyncError {
    /// Creates an invalid-state error.
    pub fn invalid_state(state: impl std::fmt::Display, operation: &str) -> Self {
        Self::InvalidState {
            state: state.to_string(),
            operation: operation.to_string(),
        }
    }

    /// Returns the error kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SyncError::FetchFailed(_) => ErrorKind::FetchFailed,
            SyncError::MutationFailed(_) => ErrorKind::MutationFailed,
            SyncError::SubscriptionLost(_) => ErrorKind::SubscriptionLost,
            SyncError::InvalidState { .. } => ErrorKind::InvalidState,
            SyncError::Invalid(_) => ErrorKind::Invalid,
        }
    }

    /// Returns true if repeating the operation may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::FetchFailed(e) | SyncError::MutationFailed(e) => e.is_retryable(),
            SyncError::SubscriptionLost(_) => true,
            _ => false,
        }
    }
}

/// Errors in service configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No service URL was supplied.
    #[error("missing service url (set MARKIT_SERVICE_URL)")]
    MissingUrl,

    /// The service URL is not an http(s) URL.
    #[error("invalid service url {0:?}: must start with http")]
    InvalidUrl(String),

    /// No service key was supplied.
    #[error("missing service key (set MARKIT_SERVICE_KEY)")]
    MissingKey,
}
