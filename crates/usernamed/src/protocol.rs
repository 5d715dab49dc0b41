//! Line protocol between usernamed and its clients
//!
//! Requests are tagged by `type`. Responses are the core response shapes,
//! serialized as-is. Input checks here are the ones a transport owns
//! (missing parameters), everything else is decided by the registry.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use username_core::response::{
    AccountExistsResponse, AccountOperation, AccountResponse, AvailabilityResponse,
    UsernameValidationResponse,
};
use username_core::validation::EMPTY_MESSAGE;
use username_core::{AccountId, UsernameRegistry};

/// A request read from one input line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum Request {
    /// Check a candidate against syntax and availability
    ValidateUsername { username: String },
    /// Bind a username to a new account
    RegisterAccount { account_id: AccountId, username: String },
    /// Change an account's username
    UpdateUsername { account_id: AccountId, username: String },
    /// Check whether a username is free
    CheckAvailability { username: String },
    /// Check whether an account is registered
    CheckAccount { account_id: AccountId },
}

/// A response written as one output line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Validation(UsernameValidationResponse),
    Account(AccountResponse),
    Availability(AvailabilityResponse),
    AccountExists(AccountExistsResponse),
    Rejected(Rejected),
}

/// A request the shell refused before it reached the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename = "error")]
pub struct Rejected {
    pub message: String,
}

impl Rejected {
    fn new(message: impl Into<String>) -> Response {
        Response::Rejected(Self {
            message: message.into(),
        })
    }
}

/// Parse and serve one line
pub async fn handle_line(registry: &UsernameRegistry, line: &str) -> Response {
    match serde_json::from_str::<Request>(line) {
        Ok(request) => handle(registry, request).await,
        Err(e) => {
            debug!("Malformed request: {}", e);
            Rejected::new(format!("Invalid request: {}", e))
        }
    }
}

/// Serve one request
pub async fn handle(registry: &UsernameRegistry, request: Request) -> Response {
    match request {
        Request::ValidateUsername { username } => {
            if username.trim().is_empty() {
                return Response::Validation(UsernameValidationResponse::rejected(
                    "Username parameter is required",
                    vec![EMPTY_MESSAGE.to_string()],
                ));
            }
            match registry.validate_username(&username).await {
                Ok(result) => Response::Validation(result.into()),
                Err(e) => {
                    warn!("Validation failed on storage: {}", e);
                    Response::Validation(UsernameValidationResponse::rejected(
                        "Error validating username",
                        Vec::new(),
                    ))
                }
            }
        }

        Request::RegisterAccount {
            account_id,
            username,
        } => {
            let result = registry.register_account(account_id, &username).await;
            Response::Account(AccountResponse::from_result(
                AccountOperation::Register,
                result,
            ))
        }

        Request::UpdateUsername {
            account_id,
            username,
        } => {
            let result = registry.update_username(account_id, &username).await;
            Response::Account(AccountResponse::from_result(
                AccountOperation::Update,
                result,
            ))
        }

        Request::CheckAvailability { username } => {
            if username.trim().is_empty() {
                return Rejected::new("Username parameter is required");
            }
            match registry.is_username_available(&username).await {
                Ok(available) => Response::Availability(AvailabilityResponse {
                    available,
                    username,
                }),
                Err(e) => {
                    warn!("Availability check failed: {}", e);
                    Rejected::new("Error checking username availability")
                }
            }
        }

        Request::CheckAccount { account_id } => {
            if account_id.is_nil() {
                return Rejected::new("Valid Account ID is required");
            }
            match registry.is_account_registered(&account_id).await {
                Ok(exists) => {
                    Response::AccountExists(AccountExistsResponse { exists, account_id })
                }
                Err(e) => {
                    warn!("Account check failed: {}", e);
                    Rejected::new("Error checking account")
                }
            }
        }
    }
}
