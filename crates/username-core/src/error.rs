//! Error types for the username registry
//!
//! Every registry operation reports its outcome through [`Error`]. The
//! variants form a closed taxonomy that the transport shell maps to
//! client or server failures; nothing in this crate panics on bad input.

use thiserror::Error;

use crate::account::AccountId;

/// Result type alias for registry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the username registry
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The candidate username failed one or more syntax or availability rules
    #[error("Username validation failed: {}", .violations.join("; "))]
    ValidationFailed {
        /// Violation messages in check order
        violations: Vec<String>,
    },

    /// A binding already exists for the account
    #[error("Account ID already exists: {0}")]
    DuplicateAccount(AccountId),

    /// The username is bound to another account
    #[error("Username is already taken: {0}")]
    UsernameTaken(String),

    /// No binding exists for the account
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// The caller passed the empty account identifier
    #[error("Account ID cannot be empty")]
    InvalidAccountId,

    /// The backing store could not complete the operation
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Failure kinds, without payload
///
/// This is what the transport shell switches on when it shapes a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    ValidationFailed,
    DuplicateAccount,
    UsernameTaken,
    AccountNotFound,
    InvalidAccountId,
    StorageUnavailable,
    Config,
}

impl FailureKind {
    /// Whether the failure is fixable by the caller changing its input
    pub fn is_client_error(self) -> bool {
        matches!(
            self,
            FailureKind::ValidationFailed
                | FailureKind::DuplicateAccount
                | FailureKind::UsernameTaken
                | FailureKind::AccountNotFound
                | FailureKind::InvalidAccountId
        )
    }
}

impl Error {
    /// Create a validation error from a list of violations
    pub fn validation(violations: Vec<String>) -> Self {
        Self::ValidationFailed { violations }
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::StorageUnavailable(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// The failure kind of this error
    pub fn kind(&self) -> FailureKind {
        match self {
            Error::ValidationFailed { .. } => FailureKind::ValidationFailed,
            Error::DuplicateAccount(_) => FailureKind::DuplicateAccount,
            Error::UsernameTaken(_) => FailureKind::UsernameTaken,
            Error::AccountNotFound(_) => FailureKind::AccountNotFound,
            Error::InvalidAccountId => FailureKind::InvalidAccountId,
            Error::StorageUnavailable(_) => FailureKind::StorageUnavailable,
            Error::Config(_) => FailureKind::Config,
        }
    }

    /// Whether retrying the same request may succeed
    ///
    /// Only infrastructure faults qualify. State conflicts need different input.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::StorageUnavailable(_))
    }

    /// Violation messages carried by a validation failure
    pub fn violations(&self) -> &[String] {
        match self {
            Error::ValidationFailed { violations } => violations,
            _ => &[],
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::StorageUnavailable(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::StorageUnavailable(format!("JSON error: {}", err))
    }
}
