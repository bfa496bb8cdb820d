//! Key-value persistence of token records, keyed by normalized address.

mod file;
mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;

use crate::token::Token;
use crate::types::StoreError;

/// Storage backend for token records.
///
/// Keys are lowercase addresses; callers normalize before calling in.
/// A missing key is `Ok(None)`, not an error.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn get(&self, address: &str) -> Result<Option<Token>, StoreError>;

    /// Insert a new record. Fails with `AlreadyExists` if the key is taken.
    async fn create(&self, token: Token) -> Result<(), StoreError>;

    /// Update a record in place (inserting it if absent). Identity fields
    /// of an existing record must not change.
    async fn save(&self, token: &Token) -> Result<(), StoreError>;

    async fn list(&self) -> Result<Vec<Token>, StoreError>;
}

pub(crate) fn check_identity(existing: &Token, incoming: &Token) -> Result<(), StoreError> {
    if existing.same_identity(incoming) {
        Ok(())
    } else {
        Err(StoreError::IdentityMismatch(incoming.address.clone()))
    }
}
