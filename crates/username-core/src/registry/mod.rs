//! Username registry
//!
//! The registry is the only entry point callers use to read or change
//! account bindings. It layers availability on top of the pure syntax
//! rules in [`crate::validation`] and delegates the atomic
//! check-and-write to the injected [`AccountStore`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use username_core::{AccountId, MemoryAccountStore, UsernameRegistry};
//! use std::sync::Arc;
//!
//! let registry = UsernameRegistry::new(Arc::new(MemoryAccountStore::new()));
//!
//! let binding = registry.register_account(AccountId::new_v4(), "alice123").await?;
//! assert!(!registry.is_username_available("ALICE123").await?);
//! ```
//!
//! ## Ordering of checks
//!
//! `register_account`:
//! 1. `InvalidAccountId` for the nil sentinel
//! 2. `ValidationFailed` when the syntax rules fail (availability is added
//!    to the violation list so callers get every reason at once)
//! 3. `UsernameTaken` when another account already holds the name
//! 4. `DuplicateAccount`, then `UsernameTaken` again, decided atomically by
//!    the store; step 3 is only a read and can be overtaken by a racing write
//!
//! `update_username` follows the same shape with `AccountNotFound` in place
//! of `DuplicateAccount`. An account is never in collision with itself.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::account::{AccountId, Binding};
use crate::error::{Error, Result};
use crate::traits::AccountStore;
use crate::validation::{self, TAKEN_MESSAGE, ValidationResult};

/// Registry of account → username bindings
///
/// ## Thread Safety
///
/// The registry holds no state of its own beyond the store handle. Cloning
/// it is cheap and every clone talks to the same store, so one instance can
/// be constructed at startup and shared by every caller.
#[derive(Clone)]
pub struct UsernameRegistry {
    store: Arc<dyn AccountStore>,
}

impl UsernameRegistry {
    /// Create a registry over an account store
    pub fn new(store: Arc<dyn AccountStore>) -> Self {
        Self { store }
    }

    /// Open the store named by `config` and wrap it in a registry
    pub async fn from_config(config: &crate::config::RegistryConfig) -> Result<Self> {
        config.validate()?;
        let store = config.store.open().await?;
        info!("Opened {} account store", config.store.type_name());
        Ok(Self::new(store))
    }

    /// The underlying store
    pub fn store(&self) -> &Arc<dyn AccountStore> {
        &self.store
    }

    /// Whether no existing binding's username matches `candidate`, ignoring case
    pub async fn is_username_available(&self, candidate: &str) -> Result<bool> {
        Ok(self.store.find_by_username(candidate).await?.is_none())
    }

    /// Whether a binding exists for `account_id`
    ///
    /// The nil sentinel is never registered.
    pub async fn is_account_registered(&self, account_id: &AccountId) -> Result<bool> {
        if account_id.is_nil() {
            return Ok(false);
        }
        Ok(self.store.get(account_id).await?.is_some())
    }

    /// The binding for `account_id`, if any
    pub async fn get_account(&self, account_id: &AccountId) -> Result<Option<Binding>> {
        if account_id.is_nil() {
            return Err(Error::InvalidAccountId);
        }
        self.store.get(account_id).await
    }

    /// All bindings
    pub async fn accounts(&self) -> Result<Vec<Binding>> {
        self.store.list().await
    }

    /// Syntax rules plus availability, without changing any state
    ///
    /// Every violation is reported; "taken" is appended after the syntax
    /// violations when another binding already holds the name.
    pub async fn validate_username(&self, candidate: &str) -> Result<ValidationResult> {
        self.validate_for(candidate, None).await
    }

    /// Bind `candidate` to a new account
    pub async fn register_account(
        &self,
        account_id: AccountId,
        candidate: &str,
    ) -> Result<Binding> {
        if account_id.is_nil() {
            debug!("Rejected registration with empty account ID");
            return Err(Error::InvalidAccountId);
        }

        self.check_syntax(candidate, None).await?;
        self.check_available(&account_id, candidate, None).await?;

        match self.store.insert(Binding::new(account_id, candidate)).await {
            Ok(binding) => {
                info!(account_id = %account_id, username = %binding.username, "Registered account");
                Ok(binding)
            }
            Err(e) => Err(self.log_rejection("register", &account_id, candidate, e)),
        }
    }

    /// Change the username of an existing account
    pub async fn update_username(
        &self,
        account_id: AccountId,
        new_candidate: &str,
    ) -> Result<Binding> {
        if account_id.is_nil() {
            debug!("Rejected username update with empty account ID");
            return Err(Error::InvalidAccountId);
        }

        self.check_syntax(new_candidate, Some(&account_id)).await?;
        self.check_available(&account_id, new_candidate, Some(&account_id)).await?;

        match self
            .store
            .rename(&account_id, new_candidate, Utc::now())
            .await
        {
            Ok(binding) => {
                info!(account_id = %account_id, username = %binding.username, "Updated username");
                Ok(binding)
            }
            Err(e) => Err(self.log_rejection("update", &account_id, new_candidate, e)),
        }
    }

    /// Persist anything the store has buffered
    pub async fn flush(&self) -> Result<()> {
        self.store.flush().await
    }

    /// Validate `candidate`, treating a binding owned by `owner` as available
    async fn validate_for(
        &self,
        candidate: &str,
        owner: Option<&AccountId>,
    ) -> Result<ValidationResult> {
        let mut result = validation::validate(candidate);
        if self.is_taken_by_other(candidate, owner).await? {
            result.push(TAKEN_MESSAGE);
        }
        Ok(result)
    }

    /// Fail with `ValidationFailed` when the syntax rules reject `candidate`
    ///
    /// A syntactically valid name that is merely taken is left for the
    /// store to reject, so the conflict surfaces as `UsernameTaken`.
    async fn check_syntax(&self, candidate: &str, owner: Option<&AccountId>) -> Result<()> {
        if validation::validate(candidate).is_valid() {
            return Ok(());
        }

        let result = self.validate_for(candidate, owner).await?;
        debug!(
            username = %candidate,
            violations = ?result.violations(),
            "Username failed validation"
        );
        Err(Error::validation(result.into_violations()))
    }

    /// Fail with `UsernameTaken` when an account other than `owner` holds
    /// `candidate`
    async fn check_available(
        &self,
        account_id: &AccountId,
        candidate: &str,
        owner: Option<&AccountId>,
    ) -> Result<()> {
        match self.is_taken_by_other(candidate, owner).await {
            Ok(false) => Ok(()),
            Ok(true) => {
                let err = Error::UsernameTaken(candidate.to_string());
                Err(self.log_rejection("availability", account_id, candidate, err))
            }
            Err(e) => Err(self.log_rejection("availability", account_id, candidate, e)),
        }
    }

    async fn is_taken_by_other(
        &self,
        candidate: &str,
        owner: Option<&AccountId>,
    ) -> Result<bool> {
        if candidate.trim().is_empty() {
            return Ok(false);
        }
        let existing = self.store.find_by_username(candidate).await?;
        Ok(match (existing, owner) {
            (Some(binding), Some(owner)) => binding.account_id != *owner,
            (Some(_), None) => true,
            (None, _) => false,
        })
    }

    fn log_rejection(
        &self,
        op: &str,
        account_id: &AccountId,
        candidate: &str,
        err: Error,
    ) -> Error {
        if err.is_retryable() {
            warn!(account_id = %account_id, op, "Storage fault: {}", err);
        } else {
            debug!(account_id = %account_id, username = %candidate, op, "Rejected: {}", err);
        }
        err
    }
}
