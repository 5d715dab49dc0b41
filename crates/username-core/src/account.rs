//! Account identifiers and username bindings
//!
//! A [`Binding`] is the only persisted entity: one account, one username.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Opaque account identifier
///
/// The nil UUID is the empty sentinel and is never a valid key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(Uuid);

impl AccountId {
    /// Wrap an existing UUID
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Generate a random identifier
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }

    /// The empty sentinel
    pub const fn nil() -> Self {
        Self(Uuid::nil())
    }

    /// Whether this is the empty sentinel
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }

    /// The underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for AccountId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl From<Uuid> for AccountId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Comparison key for usernames
///
/// Usernames are stored with their original casing but compared lowercased.
pub fn username_key(username: &str) -> String {
    username.to_lowercase()
}

/// The association between one account and one username
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Binding {
    /// Primary key, immutable once created
    pub account_id: AccountId,
    /// Display name with original casing
    pub username: String,
    /// Set once at registration
    pub created_at: DateTime<Utc>,
    /// Set whenever the username changes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Binding {
    /// Create a fresh binding stamped with the current time
    ///
    /// # Visibility
    ///
    /// This is `pub(crate)` so bindings are only minted by the registry,
    /// after the username has passed validation.
    pub(crate) fn new(account_id: AccountId, username: impl Into<String>) -> Self {
        Self {
            account_id,
            username: username.into(),
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    /// Lowercased username, the key of the uniqueness index
    pub fn username_key(&self) -> String {
        username_key(&self.username)
    }
}
