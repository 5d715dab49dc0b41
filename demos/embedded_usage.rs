//! Minimal embedding example for username-core
//!
//! This example demonstrates using username-core as a library in a custom
//! application, with a host-provided AccountStore that wraps the built-in
//! memory store and records every committed mutation.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use username_core::{
    AccountId, AccountStore, Binding, FailureKind, MemoryAccountStore, Result, UsernameRegistry,
};

/// Account store that keeps an audit trail of committed changes
struct AuditedStore {
    inner: MemoryAccountStore,
    trail: Arc<Mutex<Vec<String>>>,
}

impl AuditedStore {
    fn new() -> (Self, Arc<Mutex<Vec<String>>>) {
        let trail = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                inner: MemoryAccountStore::new(),
                trail: Arc::clone(&trail),
            },
            trail,
        )
    }

    fn record(&self, entry: String) {
        if let Ok(mut trail) = self.trail.lock() {
            trail.push(entry);
        }
    }
}

#[async_trait::async_trait]
impl AccountStore for AuditedStore {
    async fn get(&self, account_id: &AccountId) -> Result<Option<Binding>> {
        self.inner.get(account_id).await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Binding>> {
        self.inner.find_by_username(username).await
    }

    async fn insert(&self, binding: Binding) -> Result<Binding> {
        let binding = self.inner.insert(binding).await?;
        self.record(format!("created {} as {}", binding.account_id, binding.username));
        Ok(binding)
    }

    async fn rename(
        &self,
        account_id: &AccountId,
        username: &str,
        at: DateTime<Utc>,
    ) -> Result<Binding> {
        let binding = self.inner.rename(account_id, username, at).await?;
        self.record(format!("renamed {} to {}", binding.account_id, binding.username));
        Ok(binding)
    }

    async fn list(&self) -> Result<Vec<Binding>> {
        self.inner.list().await
    }

    async fn len(&self) -> Result<usize> {
        self.inner.len().await
    }

    async fn flush(&self) -> Result<()> {
        self.inner.flush().await
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let (store, trail) = AuditedStore::new();
    let registry = UsernameRegistry::new(Arc::new(store));

    let alice = AccountId::new_v4();
    let bob = AccountId::new_v4();

    registry.register_account(alice, "Alice123").await?;

    match registry.register_account(bob, "alice123").await {
        Err(e) if e.kind() == FailureKind::UsernameTaken => {
            println!("bob cannot take alice123: {}", e);
        }
        other => println!("unexpected outcome: {:?}", other),
    }

    registry.register_account(bob, "Bobby456").await?;
    registry.update_username(alice, "AliceNew1").await?;

    println!(
        "alice123 available again: {}",
        registry.is_username_available("alice123").await?
    );

    let feedback = registry.validate_username("no spaces!").await?;
    println!("feedback for 'no spaces!': {:?}", feedback.violations());

    if let Ok(trail) = trail.lock() {
        for entry in trail.iter() {
            println!("audit: {}", entry);
        }
    }

    Ok(())
}
