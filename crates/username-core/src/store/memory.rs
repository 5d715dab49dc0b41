// # Memory Account Store
//
// In-memory implementation of AccountStore.
//
// ## Purpose
//
// Provides a simple, fast store that doesn't persist across restarts.
// Useful for testing and for deployments where bindings are rebuilt from
// another source of truth on startup.
//
// ## Concurrency
//
// A single `RwLock` guards both the account map and the username index.
// Mutations take the write lock for the whole check-and-apply, so two
// registrations for the same name are serialized and only one commits.
// Reads share the lock and always see a complete table.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::account::{AccountId, Binding};
use crate::store::BindingTable;
use crate::traits::account_store::AccountStore;

/// In-memory account store implementation
///
/// Cloning the store yields another handle to the same table.
///
/// # Example
///
/// ```rust,no_run
/// use username_core::store::MemoryAccountStore;
/// use username_core::traits::AccountStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryAccountStore::new();
///
///     let binding = store.find_by_username("alice123").await?;
///     assert!(binding.is_none());
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryAccountStore {
    inner: Arc<RwLock<BindingTable>>,
}

impl MemoryAccountStore {
    /// Create a new empty memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the store is empty
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.len() == 0
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn get(&self, account_id: &AccountId) -> Result<Option<Binding>, Error> {
        let guard = self.inner.read().await;
        Ok(guard.get(account_id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Binding>, Error> {
        let guard = self.inner.read().await;
        Ok(guard.find_by_username(username).cloned())
    }

    async fn insert(&self, binding: Binding) -> Result<Binding, Error> {
        let mut guard = self.inner.write().await;
        guard.insert(binding)
    }

    async fn rename(
        &self,
        account_id: &AccountId,
        username: &str,
        at: DateTime<Utc>,
    ) -> Result<Binding, Error> {
        let mut guard = self.inner.write().await;
        guard.rename(account_id, username, at)
    }

    async fn list(&self) -> Result<Vec<Binding>, Error> {
        let guard = self.inner.read().await;
        Ok(guard.bindings())
    }

    async fn len(&self) -> Result<usize, Error> {
        Ok(self.inner.read().await.len())
    }

    async fn flush(&self) -> Result<(), Error> {
        // Nothing buffered
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_basic() {
        let store = MemoryAccountStore::new();
        assert!(store.is_empty().await);

        let id = AccountId::new_v4();
        store.insert(Binding::new(id, "Alice123")).await.unwrap();

        assert_eq!(store.len().await.unwrap(), 1);
        let found = store.find_by_username("alice123").await.unwrap().unwrap();
        assert_eq!(found.account_id, id);
        assert_eq!(found.username, "Alice123");
        assert_eq!(store.get(&id).await.unwrap(), Some(found));
    }

    #[tokio::test]
    async fn test_memory_store_clones_share_state() {
        let store = MemoryAccountStore::new();
        let handle = store.clone();

        store
            .insert(Binding::new(AccountId::new_v4(), "shared01"))
            .await
            .unwrap();

        assert!(!handle.is_empty().await);
        assert!(handle.find_by_username("SHARED01").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_memory_store_list() {
        let store = MemoryAccountStore::new();
        store
            .insert(Binding::new(AccountId::new_v4(), "alice123"))
            .await
            .unwrap();
        store
            .insert(Binding::new(AccountId::new_v4(), "bob456"))
            .await
            .unwrap();

        let mut names: Vec<String> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.username)
            .collect();
        names.sort();
        assert_eq!(names, vec!["alice123".to_string(), "bob456".to_string()]);
    }
}
