//! Response shapes handed to the transport shell
//!
//! These mirror the external interface of the service: every operation
//! answers with a serializable value, never with an error the shell has to
//! interpret itself. Field names are camelCase on the wire.

use serde::{Deserialize, Serialize};

use crate::account::{AccountId, Binding};
use crate::error::{Error, FailureKind};
use crate::validation::{TAKEN_MESSAGE, ValidationResult};

const VALID_MESSAGE: &str = "Username is valid";
const VALIDATION_FAILED_MESSAGE: &str = "Username validation failed";

/// Which side of the interface a failed response blames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureClass {
    /// The caller can fix the request
    Client,
    /// Infrastructure fault, safe to retry
    Server,
}

impl From<FailureKind> for FailureClass {
    fn from(kind: FailureKind) -> Self {
        if kind.is_client_error() {
            FailureClass::Client
        } else {
            FailureClass::Server
        }
    }
}

/// Answer to a validation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsernameValidationResponse {
    pub is_valid: bool,
    pub message: String,
    pub errors: Vec<String>,
}

impl From<ValidationResult> for UsernameValidationResponse {
    fn from(result: ValidationResult) -> Self {
        let is_valid = result.is_valid();
        Self {
            is_valid,
            message: if is_valid {
                VALID_MESSAGE
            } else {
                VALIDATION_FAILED_MESSAGE
            }
            .to_string(),
            errors: result.into_violations(),
        }
    }
}

impl UsernameValidationResponse {
    /// A failed validation with a custom message
    pub fn rejected(message: impl Into<String>, errors: Vec<String>) -> Self {
        Self {
            is_valid: false,
            message: message.into(),
            errors,
        }
    }
}

/// The mutation an [`AccountResponse`] reports on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountOperation {
    Register,
    Update,
}

impl AccountOperation {
    fn success_message(self) -> &'static str {
        match self {
            AccountOperation::Register => "User account created successfully",
            AccountOperation::Update => "Username updated successfully",
        }
    }

    fn storage_message(self) -> &'static str {
        match self {
            AccountOperation::Register => "Error creating user account",
            AccountOperation::Update => "Error updating username",
        }
    }
}

/// Answer to a register or update request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<AccountId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub errors: Vec<String>,
    /// Set on failure only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureClass>,
}

impl AccountResponse {
    /// Shape the outcome of a registry mutation
    pub fn from_result(op: AccountOperation, result: Result<Binding, Error>) -> Self {
        match result {
            Ok(binding) => Self {
                success: true,
                message: op.success_message().to_string(),
                account_id: Some(binding.account_id),
                username: Some(binding.username),
                errors: Vec::new(),
                failure: None,
            },
            Err(err) => Self::failed(op, &err),
        }
    }

    fn failed(op: AccountOperation, err: &Error) -> Self {
        let (message, errors): (&str, Vec<String>) = match err {
            Error::ValidationFailed { violations } => {
                (VALIDATION_FAILED_MESSAGE, violations.clone())
            }
            Error::UsernameTaken(_) => {
                (VALIDATION_FAILED_MESSAGE, vec![TAKEN_MESSAGE.to_string()])
            }
            Error::DuplicateAccount(_) => (
                "Account ID already exists",
                vec!["Account ID is already registered".to_string()],
            ),
            Error::AccountNotFound(_) => (
                "Account not found",
                vec!["Account ID does not exist".to_string()],
            ),
            Error::InvalidAccountId => (
                "Invalid Account ID",
                vec!["Account ID cannot be empty".to_string()],
            ),
            Error::StorageUnavailable(_) | Error::Config(_) => (op.storage_message(), Vec::new()),
        };

        Self {
            success: false,
            message: message.to_string(),
            account_id: None,
            username: None,
            errors,
            failure: Some(err.kind().into()),
        }
    }
}

/// Answer to an availability check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResponse {
    pub available: bool,
    pub username: String,
}

/// Answer to an account existence check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountExistsResponse {
    pub exists: bool,
    pub account_id: AccountId,
}
