// # Account Store Trait
//
// Defines the interface for the storage of account bindings.
//
// ## Purpose
//
// The account store is the single owner of every binding. It is where the
// two uniqueness invariants are enforced:
// - no two bindings share an account identifier
// - no two bindings share a lowercased username
//
// Both are enforced inside `insert` and `rename`, which must check and
// apply as one atomic unit. A caller that checked availability earlier
// still has to handle `UsernameTaken` from these methods, because another
// request may have claimed the name in between.
//
// ## Implementations
//
// - Memory: `HashMap` tables behind a `RwLock`
// - File: the same tables, persisted to JSON with atomic rename
//
// ## Usage
//
// ```rust,ignore
// use username_core::{AccountId, AccountStore, MemoryAccountStore};
//
// let store = MemoryAccountStore::new();
// let binding = store.find_by_username("ALICE123").await?;
// ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::account::{AccountId, Binding};

/// Trait for account store implementations
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// # Atomicity
///
/// `insert` and `rename` are each all-or-nothing. Readers never observe a
/// partially written binding. If the future is dropped before it completes,
/// the operation either committed fully or had no effect.
///
/// # Errors
///
/// Persistence faults are reported as `Error::StorageUnavailable`. State
/// conflicts are reported with their own variants so the registry can pass
/// them through unchanged.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Get the binding for an account
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Binding))`: The binding
    /// - `Ok(None)`: The account is not registered
    /// - `Err(Error)`: Storage error
    async fn get(&self, account_id: &AccountId) -> crate::Result<Option<Binding>>;

    /// Find the binding whose username matches `username`, ignoring case
    async fn find_by_username(&self, username: &str) -> crate::Result<Option<Binding>>;

    /// Insert a new binding
    ///
    /// Checked in this order, under a single exclusive section:
    ///
    /// 1. `Error::DuplicateAccount` if the account already has a binding
    /// 2. `Error::UsernameTaken` if the lowercased username is bound
    ///
    /// # Returns
    ///
    /// The stored binding.
    async fn insert(&self, binding: Binding) -> crate::Result<Binding>;

    /// Change the username of an existing binding
    ///
    /// Checked in this order, under a single exclusive section:
    ///
    /// 1. `Error::AccountNotFound` if the account has no binding
    /// 2. `Error::UsernameTaken` if the lowercased username is bound to a
    ///    *different* account
    ///
    /// Renaming an account to its own current username (in any casing)
    /// succeeds. On success `updated_at` is set to `at`.
    async fn rename(
        &self,
        account_id: &AccountId,
        username: &str,
        at: DateTime<Utc>,
    ) -> crate::Result<Binding>;

    /// All bindings, in no particular order
    async fn list(&self) -> crate::Result<Vec<Binding>>;

    /// Number of bindings
    async fn len(&self) -> crate::Result<usize>;

    /// Persist any pending changes
    ///
    /// Implementations that write through on every mutation treat this as
    /// a no-op.
    async fn flush(&self) -> crate::Result<()>;
}
