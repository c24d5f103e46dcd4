//! Scripted network and worker fixtures for tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use foodmap_core::{AppConfig, CacheStorage, Error, MemoryStorage, Request, Response};
use url::Url;

use super::{ServiceWorker, WorkerConfig};
use crate::fetch::Network;

const ORIGIN: &str = "http://localhost:5173";

/// Answers from a fixed route table and counts every call.
///
/// Paths starting with `/` are routed on the test origin. Unrouted requests
/// get a 404; while offline every call fails with a network error.
pub(crate) struct FakeNetwork {
    routes: Mutex<HashMap<String, Response>>,
    online: AtomicBool,
    calls: AtomicUsize,
}

impl FakeNetwork {
    pub(crate) fn new() -> Self {
        Self { routes: Mutex::new(HashMap::new()), online: AtomicBool::new(true), calls: AtomicUsize::new(0) }
    }

    /// Routes for the precache manifest.
    pub(crate) fn with_shell() -> Self {
        Self::new()
            .route(
                "/",
                Response::new(200, "<!doctype html><title>FoodMap</title>").with_header("content-type", "text/html"),
            )
            .route("/manifest.json", Response::new(200, r#"{"name":"FoodMap"}"#))
            .route("/icon.svg", Response::new(200, "<svg/>").with_header("content-type", "image/svg+xml"))
    }

    pub(crate) fn route(self, target: &str, response: Response) -> Self {
        let url = if target.starts_with('/') { format!("{ORIGIN}{target}") } else { target.to_string() };
        let key = Url::parse(&url).unwrap().to_string();
        self.routes.lock().unwrap().insert(key, response);
        self
    }

    pub(crate) fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Network for FakeNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.online.load(Ordering::SeqCst) {
            return Err(Error::Network(format!("{}: offline", request.url)));
        }
        let routed = self.routes.lock().unwrap().get(&request.cache_url()).cloned();
        Ok(routed.unwrap_or_else(|| Response::new(404, "Not Found")))
    }
}

pub(crate) fn config() -> WorkerConfig {
    WorkerConfig::from_app(&AppConfig::default()).unwrap()
}

pub(crate) fn worker(network: FakeNetwork) -> ServiceWorker<MemoryStorage, FakeNetwork> {
    ServiceWorker::new(config(), MemoryStorage::new(), network)
}

/// Memory storage whose `open` fails for one cache name.
pub(crate) struct LockedStorage {
    inner: MemoryStorage,
    locked: String,
}

impl LockedStorage {
    pub(crate) fn new(locked: &str) -> Self {
        Self { inner: MemoryStorage::new(), locked: locked.to_string() }
    }
}

#[async_trait]
impl CacheStorage for LockedStorage {
    type Store = <MemoryStorage as CacheStorage>::Store;

    async fn open(&self, name: &str) -> Result<Self::Store, Error> {
        if name == self.locked {
            return Err(Error::InvalidState(format!("{name} is locked")));
        }
        self.inner.open(name).await
    }

    async fn has(&self, name: &str) -> Result<bool, Error> {
        self.inner.has(name).await
    }

    async fn delete(&self, name: &str) -> Result<bool, Error> {
        self.inner.delete(name).await
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        self.inner.keys().await
    }

    async fn match_any(&self, request: &Request) -> Result<Option<Response>, Error> {
        self.inner.match_any(request).await
    }
}
