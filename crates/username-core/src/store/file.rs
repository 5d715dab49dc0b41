// # File Account Store
//
// File-based implementation of AccountStore with crash recovery.
//
// ## Purpose
//
// Keeps bindings across restarts. The whole table lives in memory and is
// written through to disk on every successful mutation.
//
// ## Crash Recovery
//
// - Atomic writes: Uses write-then-rename for atomicity
// - Corruption detection: Validates JSON and both uniqueness invariants on load
// - Automatic backup: Keeps .backup of last known good state
// - Recovery: Falls back to backup if corruption detected
// - Refusal: With no usable backup the store does not open. The file is the
//   only record of who owns which name, so it is never replaced by an empty
//   table.
//
// ## Commit Point
//
// A mutation is applied to a copy of the table, the copy is written, and
// only after the rename succeeds does the copy replace the live table. A
// failed write leaves memory and disk as they were.
//
// ## File Format
//
// ```json
// {
//   "version": "1.0",
//   "accounts": [
//     {
//       "accountId": "6f1c1a7e-3b0e-4c55-9d5e-0d7f3c1e2a11",
//       "username": "Alice123",
//       "createdAt": "2025-01-09T12:00:00Z"
//     }
//   ]
// }
// ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use crate::Error;
use crate::account::{AccountId, Binding};
use crate::store::BindingTable;
use crate::traits::account_store::AccountStore;

/// Account file format version
const ACCOUNT_FILE_VERSION: &str = "1.0";

/// File-based account store with crash recovery
///
/// # Example
///
/// ```rust,no_run
/// use username_core::store::FileAccountStore;
/// use username_core::traits::AccountStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileAccountStore::new("/var/lib/usernamed/accounts.json").await?;
///     println!("{} accounts loaded", store.len().await?);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FileAccountStore {
    path: PathBuf,
    table: Arc<RwLock<BindingTable>>,
}

/// Serializable account file format
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct AccountFileFormat {
    version: String,
    accounts: Vec<Binding>,
}

/// Why a file could not be loaded
#[derive(Debug)]
enum LoadFailure {
    /// The file could not be read at all
    Unreadable(Error),
    /// The file was read but its contents are unusable
    Corrupt(String),
}

impl FileAccountStore {
    /// Create or load a file account store
    ///
    /// This will:
    /// 1. Create parent directories if needed
    /// 2. Try to load the existing account file
    /// 3. If it is corrupt, try to load from backup
    /// 4. If there is no usable backup, fail with `StorageUnavailable` and
    ///    leave both files untouched
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::storage(format!(
                    "Failed to create account directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let table = Self::load_with_recovery(&path).await?;

        Ok(Self {
            path,
            table: Arc::new(RwLock::new(table)),
        })
    }

    /// Load the table with automatic recovery
    async fn load_with_recovery(path: &Path) -> Result<BindingTable, Error> {
        match Self::load(path).await {
            Ok(table) => {
                tracing::debug!("Loaded account file: {} accounts", table.len());
                Ok(table)
            }
            Err(LoadFailure::Unreadable(e)) => Err(e),
            Err(LoadFailure::Corrupt(reason)) => {
                tracing::warn!(
                    "Account file appears corrupted: {}. Attempting recovery from backup.",
                    reason
                );

                let backup_path = Self::backup_path(path);
                if !backup_path.exists() {
                    tracing::error!("No backup file found for {}", path.display());
                    return Err(Error::storage(format!(
                        "Account file {} is corrupt and has no backup: {}",
                        path.display(),
                        reason
                    )));
                }

                match Self::load(&backup_path).await {
                    Ok(table) => {
                        tracing::info!(
                            "Recovered account file from backup: {} accounts",
                            table.len()
                        );
                        if let Err(e) = fs::copy(&backup_path, path).await {
                            tracing::error!("Failed to restore account file from backup: {}", e);
                        }
                        Ok(table)
                    }
                    Err(LoadFailure::Unreadable(e)) => Err(e),
                    Err(LoadFailure::Corrupt(backup_reason)) => {
                        tracing::error!("Backup also corrupted: {}", backup_reason);
                        Err(Error::storage(format!(
                            "Account file {} and its backup are corrupt: {}",
                            path.display(),
                            reason
                        )))
                    }
                }
            }
        }
    }

    /// Load the table from a single file
    async fn load(path: &Path) -> Result<BindingTable, LoadFailure> {
        if !path.exists() {
            tracing::debug!("Account file does not exist: {}", path.display());
            return Ok(BindingTable::default());
        }

        let content = fs::read_to_string(path).await.map_err(|e| {
            LoadFailure::Unreadable(Error::storage(format!(
                "Failed to read account file {}: {}",
                path.display(),
                e
            )))
        })?;

        let file: AccountFileFormat = serde_json::from_str(&content)
            .map_err(|e| LoadFailure::Corrupt(format!("{}: {}", path.display(), e)))?;

        if file.version != ACCOUNT_FILE_VERSION {
            tracing::warn!(
                "Account file version mismatch: expected {}, got {}. Attempting to load anyway.",
                ACCOUNT_FILE_VERSION,
                file.version
            );
        }

        BindingTable::from_bindings(file.accounts)
            .map_err(|e| LoadFailure::Corrupt(format!("{}: {}", path.display(), e)))
    }

    /// Write a table to disk atomically
    async fn persist(&self, table: &BindingTable) -> Result<(), Error> {
        let mut accounts = table.bindings();
        accounts.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then(a.account_id.cmp(&b.account_id))
        });

        let file = AccountFileFormat {
            version: ACCOUNT_FILE_VERSION.to_string(),
            accounts,
        };
        let json = serde_json::to_string_pretty(&file)?;

        let temp_path = self.temp_path();
        {
            let mut out = fs::File::create(&temp_path).await.map_err(|e| {
                Error::storage(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
            out.write_all(json.as_bytes()).await.map_err(|e| {
                Error::storage(format!(
                    "Failed to write to temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
            out.sync_all().await.map_err(|e| {
                Error::storage(format!(
                    "Failed to sync temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        if self.path.exists() {
            let backup_path = Self::backup_path(&self.path);
            if let Err(e) = fs::copy(&self.path, &backup_path).await {
                tracing::warn!("Failed to create backup: {}", e);
            }
        }

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::storage(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::trace!("Account file written: {}", self.path.display());
        Ok(())
    }

    /// Get path to temporary file for atomic writes
    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        temp
    }

    /// Get path to backup file
    fn backup_path(path: &Path) -> PathBuf {
        let mut backup = path.to_path_buf();
        backup.set_extension("backup");
        backup
    }

    /// Path of the account file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Force immediate write to disk
    pub async fn sync(&self) -> Result<(), Error> {
        let guard = self.table.write().await;
        self.persist(&guard).await
    }
}

#[async_trait]
impl AccountStore for FileAccountStore {
    async fn get(&self, account_id: &AccountId) -> Result<Option<Binding>, Error> {
        let guard = self.table.read().await;
        Ok(guard.get(account_id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Binding>, Error> {
        let guard = self.table.read().await;
        Ok(guard.find_by_username(username).cloned())
    }

    async fn insert(&self, binding: Binding) -> Result<Binding, Error> {
        let mut guard = self.table.write().await;
        let mut next = guard.clone();
        let inserted = next.insert(binding)?;

        self.persist(&next).await?;
        *guard = next;
        Ok(inserted)
    }

    async fn rename(
        &self,
        account_id: &AccountId,
        username: &str,
        at: DateTime<Utc>,
    ) -> Result<Binding, Error> {
        let mut guard = self.table.write().await;
        let mut next = guard.clone();
        let renamed = next.rename(account_id, username, at)?;

        self.persist(&next).await?;
        *guard = next;
        Ok(renamed)
    }

    async fn list(&self) -> Result<Vec<Binding>, Error> {
        let guard = self.table.read().await;
        Ok(guard.bindings())
    }

    async fn len(&self) -> Result<usize, Error> {
        Ok(self.table.read().await.len())
    }

    async fn flush(&self) -> Result<(), Error> {
        // Every mutation is already on disk
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_file_store_basic() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("accounts.json");

        let store = FileAccountStore::new(&path).await.unwrap();
        assert_eq!(store.len().await.unwrap(), 0);

        let id = AccountId::new_v4();
        store.insert(Binding::new(id, "Alice123")).await.unwrap();
        assert!(path.exists());

        // Load new instance and verify persistence
        let store2 = FileAccountStore::new(&path).await.unwrap();
        let binding = store2.get(&id).await.unwrap().unwrap();
        assert_eq!(binding.username, "Alice123");
        assert!(store2.find_by_username("alice123").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_file_store_rename_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("accounts.json");

        let store = FileAccountStore::new(&path).await.unwrap();
        let id = AccountId::new_v4();
        store.insert(Binding::new(id, "alice123")).await.unwrap();
        store.rename(&id, "bob456", Utc::now()).await.unwrap();

        let store2 = FileAccountStore::new(&path).await.unwrap();
        assert!(store2.find_by_username("alice123").await.unwrap().is_none());
        let binding = store2.find_by_username("bob456").await.unwrap().unwrap();
        assert_eq!(binding.account_id, id);
        assert!(binding.updated_at.is_some());
    }

    #[tokio::test]
    async fn test_file_store_rejected_insert_does_not_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("accounts.json");

        let store = FileAccountStore::new(&path).await.unwrap();
        store
            .insert(Binding::new(AccountId::new_v4(), "alice123"))
            .await
            .unwrap();
        let before = fs::read_to_string(&path).await.unwrap();

        let err = store
            .insert(Binding::new(AccountId::new_v4(), "ALICE123"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UsernameTaken(_)));
        assert_eq!(fs::read_to_string(&path).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_file_store_corruption_recovery() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("accounts.json");

        let store = FileAccountStore::new(&path).await.unwrap();
        let first = AccountId::new_v4();
        store.insert(Binding::new(first, "alice123")).await.unwrap();

        // Second write creates the backup
        store
            .insert(Binding::new(AccountId::new_v4(), "bob456"))
            .await
            .unwrap();
        let backup_path = FileAccountStore::backup_path(&path);
        assert!(backup_path.exists(), "Backup file should exist after write");

        fs::write(&path, b"corrupted json data").await.unwrap();

        let store2 = FileAccountStore::new(&path).await.unwrap();
        // Backup holds the state before the last write
        assert_eq!(store2.len().await.unwrap(), 1);
        assert!(store2.get(&first).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_file_with_duplicate_usernames_is_refused() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("accounts.json");

        let file = AccountFileFormat {
            version: ACCOUNT_FILE_VERSION.to_string(),
            accounts: vec![
                Binding::new(AccountId::new_v4(), "alice123"),
                Binding::new(AccountId::new_v4(), "ALICE123"),
            ],
        };
        let content = serde_json::to_string(&file).unwrap();
        fs::write(&path, &content).await.unwrap();

        let err = FileAccountStore::new(&path).await.unwrap_err();
        assert!(matches!(err, Error::StorageUnavailable(_)));
        assert_eq!(fs::read_to_string(&path).await.unwrap(), content);
    }

    #[tokio::test]
    async fn test_truncated_file_without_backup_is_refused() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("accounts.json");

        let store = FileAccountStore::new(&path).await.unwrap();
        store
            .insert(Binding::new(AccountId::new_v4(), "alice123"))
            .await
            .unwrap();
        drop(store);

        let content = fs::read(&path).await.unwrap();
        let truncated = &content[..content.len() - 3];
        fs::write(&path, truncated).await.unwrap();

        let err = FileAccountStore::new(&path).await.unwrap_err();
        assert!(matches!(err, Error::StorageUnavailable(_)));
        assert_eq!(fs::read(&path).await.unwrap(), truncated);
        assert!(!FileAccountStore::backup_path(&path).exists());
    }

    #[tokio::test]
    async fn test_corrupt_file_and_backup_are_refused() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("accounts.json");
        let backup_path = FileAccountStore::backup_path(&path);

        fs::write(&path, b"{not json").await.unwrap();
        fs::write(&backup_path, b"also not json").await.unwrap();

        let err = FileAccountStore::new(&path).await.unwrap_err();
        assert!(matches!(err, Error::StorageUnavailable(_)));
        assert_eq!(fs::read(&path).await.unwrap(), b"{not json");
        assert_eq!(fs::read(&backup_path).await.unwrap(), b"also not json");
    }

    #[tokio::test]
    async fn test_failed_write_leaves_memory_and_disk_unchanged() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("accounts.json");

        let store = FileAccountStore::new(&path).await.unwrap();
        let id = AccountId::new_v4();
        store.insert(Binding::new(id, "alice123")).await.unwrap();
        let before = fs::read_to_string(&path).await.unwrap();

        // A directory where the temp file goes makes every write fail
        fs::create_dir(store.temp_path()).await.unwrap();

        let other = AccountId::new_v4();
        let err = store
            .insert(Binding::new(other, "bob45678"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::StorageUnavailable(_)));

        let err = store
            .rename(&id, "carol789", Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::StorageUnavailable(_)));

        assert!(store.get(&other).await.unwrap().is_none());
        assert!(store.find_by_username("bob45678").await.unwrap().is_none());
        assert!(store.find_by_username("carol789").await.unwrap().is_none());
        let binding = store.find_by_username("alice123").await.unwrap().unwrap();
        assert_eq!(binding.account_id, id);
        assert!(binding.updated_at.is_none());
        assert_eq!(store.len().await.unwrap(), 1);
        assert_eq!(fs::read_to_string(&path).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_unusable_parent_directory_is_a_storage_fault() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"").await.unwrap();

        let err = FileAccountStore::new(blocker.join("sub").join("accounts.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::StorageUnavailable(_)));
    }

    #[tokio::test]
    async fn test_file_store_creates_parent_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("accounts.json");

        let store = FileAccountStore::new(&path).await.unwrap();
        store
            .insert(Binding::new(AccountId::new_v4(), "alice123"))
            .await
            .unwrap();
        assert!(path.exists());
        assert_eq!(store.path(), path.as_path());
    }
}
