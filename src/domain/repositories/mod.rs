//! Repository trait definitions for the domain layer.
//!
//! - Traits define the contract for data operations
//! - Implementations live in `crate::infrastructure::persistence`
//! - Mock implementations are auto-generated via `mockall` for testing

pub mod redirect_store;

pub use redirect_store::{RedirectStore, StoreError};

#[cfg(test)]
pub use redirect_store::MockRedirectStore;
