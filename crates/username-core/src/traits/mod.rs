//! Core traits for the username registry
//!
//! This module defines the abstract interfaces that implementations must follow.
//!
//! - [`AccountStore`]: Ownership and atomic mutation of account bindings

pub mod account_store;

pub use account_store::AccountStore;
