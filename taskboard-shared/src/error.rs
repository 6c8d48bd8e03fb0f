//! Service error taxonomy
//!
//! Every component operation returns [`ServiceResult`]. Lower layers (stores,
//! token handling, password hashing, the event transport) keep their own
//! error enums and convert into [`ServiceError`] at the service boundary.
//!
//! | Variant | Raised for |
//! |---|---|
//! | `Unauthenticated` | missing/invalid/expired token, bad credentials |
//! | `InvalidArgument` | missing or malformed fields, invalid enum values |
//! | `PermissionDenied` | insufficient role or not a member |
//! | `NotFound` | missing board, task, invitation or membership |
//! | `AlreadyExists` | duplicate email |
//! | `FailedPrecondition` | reprocessed invitation, last-Admin removal |
//! | `Internal` | storage or transport failure |

use crate::auth::jwt::JwtError;
use crate::auth::password::PasswordError;
use crate::events::PublishError;
use crate::store::StoreError;

/// Result alias used by every service operation
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors surfaced to callers of the board, task and identity services
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("failed precondition: {0}")]
    FailedPrecondition(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn unauthenticated(msg: impl Into<String>) -> Self {
        Self::Unauthenticated(msg.into())
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn permission_denied(msg: impl Into<String>) -> Self {
        Self::PermissionDenied(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn already_exists(msg: impl Into<String>) -> Self {
        Self::AlreadyExists(msg.into())
    }

    pub fn failed_precondition(msg: impl Into<String>) -> Self {
        Self::FailedPrecondition(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Message without the variant prefix, suitable for a response body
    pub fn message(&self) -> &str {
        match self {
            Self::Unauthenticated(m)
            | Self::InvalidArgument(m)
            | Self::PermissionDenied(m)
            | Self::NotFound(m)
            | Self::AlreadyExists(m)
            | Self::FailedPrecondition(m)
            | Self::Internal(m) => m,
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(what) => ServiceError::AlreadyExists(what),
            StoreError::Backend(msg) => {
                tracing::error!(error = %msg, "Store operation failed");
                ServiceError::Internal(msg)
            }
        }
    }
}

impl From<JwtError> for ServiceError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::CreateError(msg) => ServiceError::Internal(msg),
            other => ServiceError::Unauthenticated(other.to_string()),
        }
    }
}

impl From<PasswordError> for ServiceError {
    fn from(err: PasswordError) -> Self {
        ServiceError::Internal(err.to_string())
    }
}

impl From<PublishError> for ServiceError {
    fn from(err: PublishError) -> Self {
        ServiceError::Internal(err.to_string())
    }
}
