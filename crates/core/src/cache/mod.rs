//! Named response caches.
//!
//! A [`CacheStorage`] holds independently named [`CacheStore`]s, each a
//! mapping from request identity to a stored response. Stores are versioned
//! by name (generation tags such as `foodmap-v1`); superseded generations are
//! removed wholesale with [`CacheStorage::delete`].
//!
//! Two backends are provided:
//!
//! - [`CacheDb`]: SQLite via tokio-rusqlite, with migrations and WAL mode
//! - [`MemoryStorage`]: in-process maps, used by tests
//!
//! Only plain 200 responses are ever stored (see [`ensure_cacheable`]).
//! Writes to the same key are last-write-wins.

pub mod connection;
pub mod hash;
pub mod memory;
pub mod migrations;
pub mod store;

use async_trait::async_trait;

use crate::Error;
use crate::http::{Request, Response};

pub use connection::CacheDb;
pub use memory::{MemoryStorage, MemoryStore};
pub use store::SqliteStore;

/// One named cache.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Name (generation tag) of this store.
    fn name(&self) -> &str;

    /// Stored response for the request's identity, if any.
    async fn match_request(&self, request: &Request) -> Result<Option<Response>, Error>;

    /// Store `response` under the request's identity, replacing any previous entry.
    ///
    /// Takes the response by value; callers that still need to return it
    /// must clone first.
    async fn put(&self, request: &Request, response: Response) -> Result<(), Error>;

    /// Remove the entry for the request's identity. Returns whether one existed.
    async fn delete(&self, request: &Request) -> Result<bool, Error>;

    /// URLs of all stored entries, sorted.
    async fn keys(&self) -> Result<Vec<String>, Error>;
}

/// The set of named caches visible to the worker.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    type Store: CacheStore;

    /// Open the named store, creating it when missing.
    async fn open(&self, name: &str) -> Result<Self::Store, Error>;

    async fn has(&self, name: &str) -> Result<bool, Error>;

    /// Delete the named store and all its entries. Returns whether it existed.
    async fn delete(&self, name: &str) -> Result<bool, Error>;

    /// Store names in creation order.
    async fn keys(&self) -> Result<Vec<String>, Error>;

    /// First match for the request across all stores, in creation order.
    async fn match_any(&self, request: &Request) -> Result<Option<Response>, Error>;
}

/// Reject responses that must never be stored.
pub fn ensure_cacheable(request: &Request, response: &Response) -> Result<(), Error> {
    if response.is_cacheable() {
        Ok(())
    } else {
        Err(Error::NotCacheable(format!(
            "{} returned status {} ({})",
            request.cache_url(),
            response.status,
            response.kind.as_str()
        )))
    }
}
