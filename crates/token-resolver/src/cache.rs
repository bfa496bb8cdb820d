//! Read-through LRU cache in front of a token store.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lru::LruCache;

use crate::store::TokenStore;
use crate::token::Token;
use crate::types::StoreError;

/// Snapshot of cache hit/miss counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheMetrics {
    pub hits: usize,
    pub misses: usize,
}

/// LRU of token records with a max age per entry.
pub struct TokenCache {
    pub tokens: LruCache<String, (Token, Instant)>,
    pub max_age: Duration,
    pub hits: AtomicUsize,
    pub misses: AtomicUsize,
}

impl TokenCache {
    pub fn new(capacity: usize, max_age: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            tokens: LruCache::new(capacity),
            max_age,
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    /// Get a cached token if present and not expired.
    pub fn get(&mut self, address: &str) -> Option<&Token> {
        // Peek first so the expired entry can be popped without a live borrow.
        let is_expired = match self.tokens.peek(address) {
            Some((_, ts)) => ts.elapsed() >= self.max_age,
            None => false,
        };

        if is_expired {
            self.tokens.pop(address);
            self.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        }

        if let Some((token, _)) = self.tokens.get(address) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            Some(token)
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            None
        }
    }

    /// Insert or update a cached token.
    pub fn insert(&mut self, token: Token) {
        self.tokens.put(token.address.clone(), (token, Instant::now()));
    }

    pub fn invalidate(&mut self, address: &str) {
        self.tokens.pop(address);
    }

    /// Remove expired entries
    pub fn purge_expired(&mut self) {
        let max_age = self.max_age;
        let keys_to_remove: Vec<_> = self
            .tokens
            .iter()
            .filter(|(_, v)| v.1.elapsed() >= max_age)
            .map(|(k, _)| k.clone())
            .collect();
        for k in keys_to_remove {
            self.tokens.pop(&k);
        }
    }

    /// Retrieve current cache metrics snapshot.
    pub fn metrics(&self) -> CacheMetrics {
        CacheMetrics {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

/// A [`TokenStore`] that serves reads from a [`TokenCache`] and writes through
/// to the inner store.
pub struct CachedStore<S> {
    inner: S,
    cache: Mutex<TokenCache>,
}

impl<S: TokenStore> CachedStore<S> {
    pub fn new(inner: S, capacity: usize, max_age: Duration) -> Self {
        Self { inner, cache: Mutex::new(TokenCache::new(capacity, max_age)) }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn metrics(&self) -> CacheMetrics {
        self.cache.lock().unwrap().metrics()
    }
}

#[async_trait]
impl<S: TokenStore> TokenStore for CachedStore<S> {
    async fn get(&self, address: &str) -> Result<Option<Token>, StoreError> {
        if let Some(token) = self.cache.lock().unwrap().get(address).cloned() {
            return Ok(Some(token));
        }
        let found = self.inner.get(address).await?;
        if let Some(token) = &found {
            self.cache.lock().unwrap().insert(token.clone());
        }
        Ok(found)
    }

    async fn create(&self, token: Token) -> Result<(), StoreError> {
        self.inner.create(token.clone()).await?;
        self.cache.lock().unwrap().insert(token);
        Ok(())
    }

    async fn save(&self, token: &Token) -> Result<(), StoreError> {
        match self.inner.save(token).await {
            Ok(()) => {
                self.cache.lock().unwrap().insert(token.clone());
                Ok(())
            }
            Err(e) => {
                self.cache.lock().unwrap().invalidate(&token.address);
                Err(e)
            }
        }
    }

    async fn list(&self) -> Result<Vec<Token>, StoreError> {
        self.inner.list().await
    }
}
