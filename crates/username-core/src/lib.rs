// # username-core
//
// Core library for the username registry.
//
// ## Architecture Overview
//
// This library maps opaque account identifiers to display names:
// - **validation**: Pure syntax rules for candidate usernames
// - **AccountStore**: Trait for the storage that owns every binding
// - **UsernameRegistry**: Availability, registration and rename, on top of a store
// - **response**: Serializable answers for the transport shell
//
// ## Invariants
//
// 1. Account identifiers are unique across bindings
// 2. Lowercased usernames are unique across bindings
// 3. Every stored username passed validation when it was written
// 4. Bindings are created once and renamed any number of times; never deleted
//
// Invariants 1 and 2 are enforced by the store inside a single exclusive
// section, so concurrent registrations for the same name cannot both win.

pub mod account;
pub mod config;
pub mod error;
pub mod registry;
pub mod response;
pub mod store;
pub mod traits;
pub mod validation;

// Re-export core types for convenience
pub use account::{AccountId, Binding};
pub use config::{RegistryConfig, StoreConfig};
pub use error::{Error, FailureKind, Result};
pub use registry::UsernameRegistry;
pub use store::{FileAccountStore, MemoryAccountStore};
pub use traits::AccountStore;
pub use validation::{ValidationResult, validate};
