//! In-memory cache storage.
//!
//! Uses a tokio RwLock over plain maps. Stores are handles into the shared
//! storage, so a store opened before [`CacheStorage::delete`] sees its
//! entries disappear.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{CacheStorage, CacheStore, ensure_cacheable};
use crate::Error;
use crate::http::{Request, Response};

#[derive(Debug, Clone)]
struct Entry {
    url: String,
    response: Response,
}

#[derive(Debug, Default)]
struct Caches {
    /// Names in creation order.
    order: Vec<String>,
    entries: HashMap<String, HashMap<String, Entry>>,
}

impl Caches {
    fn ensure(&mut self, name: &str) -> &mut HashMap<String, Entry> {
        if !self.entries.contains_key(name) {
            self.order.push(name.to_string());
        }
        self.entries.entry(name.to_string()).or_default()
    }
}

/// Cache storage held entirely in process memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    caches: Arc<RwLock<Caches>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

/// A named cache inside a [`MemoryStorage`].
#[derive(Debug, Clone)]
pub struct MemoryStore {
    caches: Arc<RwLock<Caches>>,
    name: String,
}

#[async_trait]
impl CacheStore for MemoryStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn match_request(&self, request: &Request) -> Result<Option<Response>, Error> {
        let caches = self.caches.read().await;
        let hit = caches
            .entries
            .get(&self.name)
            .and_then(|entries| entries.get(&request.cache_key()))
            .map(|entry| entry.response.clone());
        Ok(hit)
    }

    async fn put(&self, request: &Request, response: Response) -> Result<(), Error> {
        ensure_cacheable(request, &response)?;
        let mut caches = self.caches.write().await;
        caches
            .ensure(&self.name)
            .insert(request.cache_key(), Entry { url: request.cache_url(), response });
        Ok(())
    }

    async fn delete(&self, request: &Request) -> Result<bool, Error> {
        let mut caches = self.caches.write().await;
        let removed = caches
            .entries
            .get_mut(&self.name)
            .and_then(|entries| entries.remove(&request.cache_key()));
        Ok(removed.is_some())
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        let caches = self.caches.read().await;
        let mut urls: Vec<String> = caches
            .entries
            .get(&self.name)
            .map(|entries| entries.values().map(|e| e.url.clone()).collect())
            .unwrap_or_default();
        urls.sort();
        Ok(urls)
    }
}

#[async_trait]
impl CacheStorage for MemoryStorage {
    type Store = MemoryStore;

    async fn open(&self, name: &str) -> Result<MemoryStore, Error> {
        self.caches.write().await.ensure(name);
        Ok(MemoryStore { caches: Arc::clone(&self.caches), name: name.to_string() })
    }

    async fn has(&self, name: &str) -> Result<bool, Error> {
        Ok(self.caches.read().await.entries.contains_key(name))
    }

    async fn delete(&self, name: &str) -> Result<bool, Error> {
        let mut caches = self.caches.write().await;
        caches.order.retain(|n| n != name);
        Ok(caches.entries.remove(name).is_some())
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        Ok(self.caches.read().await.order.clone())
    }

    async fn match_any(&self, request: &Request) -> Result<Option<Response>, Error> {
        let caches = self.caches.read().await;
        let key = request.cache_key();
        let hit = caches
            .order
            .iter()
            .filter_map(|name| caches.entries.get(name))
            .find_map(|entries| entries.get(&key))
            .map(|entry| entry.response.clone());
        Ok(hit)
    }
}
