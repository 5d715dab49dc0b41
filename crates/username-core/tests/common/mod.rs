//! Test doubles and common utilities for registry contract tests

#![allow(dead_code)]

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use username_core::error::{Error, Result};
use username_core::{AccountId, AccountStore, Binding, MemoryAccountStore, UsernameRegistry};

/// An AccountStore that can be switched into a failing mode
///
/// While failing, every call returns `StorageUnavailable` without touching
/// the wrapped store. With only writes failing, reads still go through.
/// Mutating calls are counted either way.
pub struct FlakyStore {
    inner: MemoryAccountStore,
    failing: Arc<AtomicBool>,
    failing_writes: Arc<AtomicBool>,
    insert_call_count: Arc<AtomicUsize>,
    rename_call_count: Arc<AtomicUsize>,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryAccountStore::new(),
            failing: Arc::new(AtomicBool::new(false)),
            failing_writes: Arc::new(AtomicBool::new(false)),
            insert_call_count: Arc::new(AtomicUsize::new(0)),
            rename_call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Make subsequent calls fail (or succeed again)
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Make subsequent inserts and renames fail while reads succeed
    pub fn set_failing_writes(&self, failing: bool) {
        self.failing_writes.store(failing, Ordering::SeqCst);
    }

    /// Get the number of times insert() was called
    pub fn insert_call_count(&self) -> usize {
        self.insert_call_count.load(Ordering::SeqCst)
    }

    /// Get the number of times rename() was called
    pub fn rename_call_count(&self) -> usize {
        self.rename_call_count.load(Ordering::SeqCst)
    }

    /// Create a new FlakyStore that shares state and switches with an existing one
    pub fn sharing_state_with(other: &Self) -> Self {
        Self {
            inner: other.inner.clone(),
            failing: Arc::clone(&other.failing),
            failing_writes: Arc::clone(&other.failing_writes),
            insert_call_count: Arc::clone(&other.insert_call_count),
            rename_call_count: Arc::clone(&other.rename_call_count),
        }
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(Error::storage("simulated storage outage"))
        } else {
            Ok(())
        }
    }

    fn check_write(&self) -> Result<()> {
        if self.failing_writes.load(Ordering::SeqCst) {
            return Err(Error::storage("simulated write failure"));
        }
        self.check()
    }
}

#[async_trait::async_trait]
impl AccountStore for FlakyStore {
    async fn get(&self, account_id: &AccountId) -> Result<Option<Binding>> {
        self.check()?;
        self.inner.get(account_id).await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Binding>> {
        self.check()?;
        self.inner.find_by_username(username).await
    }

    async fn insert(&self, binding: Binding) -> Result<Binding> {
        self.insert_call_count.fetch_add(1, Ordering::SeqCst);
        self.check_write()?;
        self.inner.insert(binding).await
    }

    async fn rename(
        &self,
        account_id: &AccountId,
        username: &str,
        at: DateTime<Utc>,
    ) -> Result<Binding> {
        self.rename_call_count.fetch_add(1, Ordering::SeqCst);
        self.check_write()?;
        self.inner.rename(account_id, username, at).await
    }

    async fn list(&self) -> Result<Vec<Binding>> {
        self.check()?;
        self.inner.list().await
    }

    async fn len(&self) -> Result<usize> {
        self.check()?;
        self.inner.len().await
    }

    async fn flush(&self) -> Result<()> {
        self.check()
    }
}

/// A registry over a fresh in-memory store
pub fn memory_registry() -> UsernameRegistry {
    UsernameRegistry::new(Arc::new(MemoryAccountStore::new()))
}

/// Assert that no two bindings share a lowercased username or an account
pub async fn assert_unique(registry: &UsernameRegistry) {
    let bindings = registry.accounts().await.expect("listing succeeds");

    let mut keys: Vec<String> = bindings.iter().map(|b| b.username.to_lowercase()).collect();
    keys.sort();
    let before = keys.len();
    keys.dedup();
    assert_eq!(before, keys.len(), "duplicate usernames in {:?}", bindings);

    let mut ids: Vec<AccountId> = bindings.iter().map(|b| b.account_id).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(before, ids.len(), "duplicate account ids in {:?}", bindings);
}
