use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use super::{check_identity, TokenStore};
use crate::token::Token;
use crate::types::StoreError;

/// Store backed by a directory holding one `<address>.json` file per token.
///
/// Nothing is kept in memory: every read goes to disk, so a write that
/// fails leaves no trace. Writes go to a sibling temp file and are renamed
/// into place.
pub struct JsonFileStore {
    dir: PathBuf,
    // Serializes writers so the existence check in `create` holds.
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Opens the store, creating the directory if needed.
    pub async fn open<P: AsRef<Path>>(dir: P) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir).await?;
        debug!("opened token store {}", dir.display());
        Ok(Self { dir, write_lock: Mutex::new(()) })
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// File for a normalized address; anything else is not a valid key.
    fn token_path(&self, address: &str) -> Option<PathBuf> {
        let hex = address.strip_prefix("0x")?;
        let valid = hex.len() == 40 && hex.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
        valid.then(|| self.dir.join(format!("{address}.json")))
    }

    async fn read_token(path: &Path) -> Result<Option<Token>, StoreError> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_token(path: &Path, token: &Token) -> Result<(), StoreError> {
        let body = serde_json::to_vec_pretty(token)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body).await?;
        if let Err(e) = tokio::fs::rename(&tmp, path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }

    fn key_path(&self, address: &str) -> Result<PathBuf, StoreError> {
        self.token_path(address).ok_or_else(|| {
            StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("not a normalized address: {address}"),
            ))
        })
    }
}

#[async_trait]
impl TokenStore for JsonFileStore {
    async fn get(&self, address: &str) -> Result<Option<Token>, StoreError> {
        match self.token_path(address) {
            Some(path) => Self::read_token(&path).await,
            None => Ok(None),
        }
    }

    async fn create(&self, token: Token) -> Result<(), StoreError> {
        let path = self.key_path(&token.address)?;
        let _guard = self.write_lock.lock().await;
        if tokio::fs::try_exists(&path).await? {
            return Err(StoreError::AlreadyExists(token.address));
        }
        Self::write_token(&path, &token).await
    }

    async fn save(&self, token: &Token) -> Result<(), StoreError> {
        let path = self.key_path(&token.address)?;
        let _guard = self.write_lock.lock().await;
        if let Some(existing) = Self::read_token(&path).await? {
            check_identity(&existing, token)?;
        }
        Self::write_token(&path, token).await
    }

    async fn list(&self) -> Result<Vec<Token>, StoreError> {
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        let mut tokens = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(token) = Self::read_token(&path).await? {
                tokens.push(token);
            }
        }
        tokens.sort_by(|a, b| a.address.cmp(&b.address));
        Ok(tokens)
    }
}
