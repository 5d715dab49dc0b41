// # Account Store Implementations
//
// This module provides implementations of the AccountStore trait for
// different persistence strategies, plus the indexed table they share.

pub mod file;
pub mod memory;

pub use file::FileAccountStore;
pub use memory::MemoryAccountStore;

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::account::{AccountId, Binding, username_key};
use crate::error::{Error, Result};

/// Bindings keyed by account, with a unique secondary index on the
/// lowercased username
///
/// Every mutating method checks before it touches either map, so a failed
/// call leaves the table unchanged.
#[derive(Debug, Clone, Default)]
pub(crate) struct BindingTable {
    accounts: HashMap<AccountId, Binding>,
    usernames: HashMap<String, AccountId>,
}

impl BindingTable {
    /// Build a table from stored bindings, rejecting any that break an
    /// invariant
    pub(crate) fn from_bindings(bindings: impl IntoIterator<Item = Binding>) -> Result<Self> {
        let mut table = Self::default();
        for binding in bindings {
            if binding.account_id.is_nil() {
                return Err(Error::storage("stored binding has an empty account ID"));
            }
            let account_id = binding.account_id;
            table
                .insert(binding)
                .map_err(|e| Error::storage(format!("stored binding {account_id} rejected: {e}")))?;
        }
        Ok(table)
    }

    pub(crate) fn get(&self, account_id: &AccountId) -> Option<&Binding> {
        self.accounts.get(account_id)
    }

    pub(crate) fn find_by_username(&self, username: &str) -> Option<&Binding> {
        self.usernames
            .get(&username_key(username))
            .and_then(|id| self.accounts.get(id))
    }

    pub(crate) fn insert(&mut self, binding: Binding) -> Result<Binding> {
        if self.accounts.contains_key(&binding.account_id) {
            return Err(Error::DuplicateAccount(binding.account_id));
        }
        let key = binding.username_key();
        if self.usernames.contains_key(&key) {
            return Err(Error::UsernameTaken(binding.username));
        }

        self.usernames.insert(key, binding.account_id);
        self.accounts.insert(binding.account_id, binding.clone());
        Ok(binding)
    }

    pub(crate) fn rename(
        &mut self,
        account_id: &AccountId,
        username: &str,
        at: DateTime<Utc>,
    ) -> Result<Binding> {
        let old_key = match self.accounts.get(account_id) {
            Some(binding) => binding.username_key(),
            None => return Err(Error::AccountNotFound(*account_id)),
        };
        let new_key = username_key(username);
        if let Some(owner) = self.usernames.get(&new_key)
            && owner != account_id
        {
            return Err(Error::UsernameTaken(username.to_string()));
        }

        let Some(binding) = self.accounts.get_mut(account_id) else {
            return Err(Error::AccountNotFound(*account_id));
        };
        binding.username = username.to_string();
        binding.updated_at = Some(at);
        let updated = binding.clone();

        if old_key != new_key {
            self.usernames.remove(&old_key);
            self.usernames.insert(new_key, *account_id);
        }
        Ok(updated)
    }

    pub(crate) fn bindings(&self) -> Vec<Binding> {
        self.accounts.values().cloned().collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.accounts.len()
    }
}
