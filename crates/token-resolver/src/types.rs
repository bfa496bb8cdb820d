//! Common error types shared across the resolver layers.

use thiserror::Error;

/// Failure of a read-only call against the chain.
#[derive(Debug, Error)]
pub enum ChainError {
    /// Contract-level logic failure (the call reverted).
    #[error("execution reverted: {0}")]
    Reverted(String),
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("rpc transport error: {0}")]
    Transport(String),
    #[error("unable to decode call result: {0}")]
    Decode(String),
}

impl ChainError {
    pub fn is_revert(&self) -> bool {
        matches!(self, ChainError::Reverted(_))
    }
}

/// Failure of an HTTP upstream (screener, oracle, aggregator, token list feed).
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },
    #[error("decode error: {0}")]
    Decode(String),
}

/// Failure of the token store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("token {0} already exists")]
    AlreadyExists(String),
    #[error("identity fields of token {0} cannot change")]
    IdentityMismatch(String),
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Top-level error type for the token resolver.
#[derive(Debug, Error)]
pub enum ResolverError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),
    #[error("chain read failed: {0}")]
    Chain(#[from] ChainError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("source error: {0}")]
    Source(#[from] SourceError),
    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ResolverError>;
