use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use super::{check_identity, TokenStore};
use crate::token::Token;
use crate::types::StoreError;

/// Process-local store.
#[derive(Default)]
pub struct MemoryStore {
    tokens: RwLock<HashMap<String, Token>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tokens.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl TokenStore for MemoryStore {
    async fn get(&self, address: &str) -> Result<Option<Token>, StoreError> {
        Ok(self.tokens.read().unwrap().get(address).cloned())
    }

    async fn create(&self, token: Token) -> Result<(), StoreError> {
        let mut tokens = self.tokens.write().unwrap();
        if tokens.contains_key(&token.address) {
            return Err(StoreError::AlreadyExists(token.address));
        }
        tokens.insert(token.address.clone(), token);
        Ok(())
    }

    async fn save(&self, token: &Token) -> Result<(), StoreError> {
        let mut tokens = self.tokens.write().unwrap();
        if let Some(existing) = tokens.get(&token.address) {
            check_identity(existing, token)?;
        }
        tokens.insert(token.address.clone(), token.clone());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Token>, StoreError> {
        let mut all: Vec<Token> = self.tokens.read().unwrap().values().cloned().collect();
        all.sort_by(|a, b| a.address.cmp(&b.address));
        Ok(all)
    }
}
