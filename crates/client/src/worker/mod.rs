//! The offline caching worker.
//!
//! [`ServiceWorker`] owns the lifecycle state and intercepts requests on
//! behalf of the app. Storage and network are injected, so the same worker
//! runs against SQLite and the live network from the CLI and against
//! in-memory fakes in tests.
//!
//! Two cache generations are kept:
//!
//! - static (`foodmap-v1`): the precached app shell plus same-origin files
//! - runtime (`foodmap-runtime`): map tiles and build assets under `/_app/`
//!
//! Any other generation found at activation is deleted.

pub mod lifecycle;
pub mod message;
pub mod policy;
pub mod precache;

#[cfg(test)]
pub(crate) mod testing;

use foodmap_core::{AppConfig, CacheStorage, Error, Request};
use tokio::sync::RwLock;
use tracing::info;
use url::Url;

use crate::fetch::{Network, resolve};

pub use lifecycle::{Lifecycle, WorkerState};
pub use message::ClientMessage;
pub use policy::{Strategy, classify, is_provider_host};
pub use precache::add_all;

/// Worker settings, derived from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub origin: Url,
    pub static_cache: String,
    pub runtime_cache: String,
    /// Paths precached at install, relative to `origin`.
    pub precache: Vec<String>,
    /// Same-origin paths under this prefix go to the runtime generation.
    pub runtime_prefix: String,
    pub provider_patterns: Vec<String>,
}

impl WorkerConfig {
    pub fn from_app(config: &AppConfig) -> Result<Self, Error> {
        let origin = Url::parse(&config.origin).map_err(|e| Error::InvalidUrl(format!("{}: {e}", config.origin)))?;
        Ok(Self {
            origin,
            static_cache: config.static_cache.clone(),
            runtime_cache: config.runtime_cache.clone(),
            precache: config.precache.clone(),
            runtime_prefix: config.runtime_prefix.clone(),
            provider_patterns: config.provider_patterns.clone(),
        })
    }

    /// The app shell document, `/` on the origin.
    pub fn root_url(&self) -> Url {
        let mut root = self.origin.clone();
        root.set_path("/");
        root.set_query(None);
        root.set_fragment(None);
        root
    }

    pub fn precache_requests(&self) -> Result<Vec<Request>, Error> {
        self.precache
            .iter()
            .map(|path| {
                resolve(&self.origin, path)
                    .map(Request::get)
                    .map_err(|e| Error::InvalidUrl(format!("{path}: {e}")))
            })
            .collect()
    }

    /// Whether `name` is one of the generations this worker uses.
    pub fn is_current(&self, name: &str) -> bool {
        name == self.static_cache || name == self.runtime_cache
    }

    /// Generation a same-origin response is written to.
    pub fn generation_for(&self, request: &Request) -> &str {
        if request.url.path().starts_with(&self.runtime_prefix) {
            &self.runtime_cache
        } else {
            &self.static_cache
        }
    }
}

/// Request interceptor with an install/activate lifecycle.
///
/// Shared by reference; every method takes `&self`.
pub struct ServiceWorker<S, N> {
    config: WorkerConfig,
    storage: S,
    network: N,
    lifecycle: RwLock<Lifecycle>,
}

impl<S: CacheStorage, N: Network> ServiceWorker<S, N> {
    pub fn new(config: WorkerConfig, storage: S, network: N) -> Self {
        Self { config, storage, network, lifecycle: RwLock::new(Lifecycle::default()) }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn network(&self) -> &N {
        &self.network
    }

    pub async fn state(&self) -> WorkerState {
        self.lifecycle.read().await.state()
    }

    pub async fn clients_claimed(&self) -> bool {
        self.lifecycle.read().await.clients_claimed()
    }

    /// Handle a message posted by a page.
    ///
    /// `SKIP_WAITING` promotes an installed, waiting worker straight to
    /// activation. Returns the caches deleted if activation ran.
    pub async fn handle_message(&self, message: ClientMessage) -> Result<Option<Vec<String>>, Error> {
        match message {
            ClientMessage::SkipWaiting => {
                let waiting = {
                    let mut lifecycle = self.lifecycle.write().await;
                    lifecycle.request_skip_waiting();
                    lifecycle.state() == WorkerState::Installed
                };
                info!(waiting, "skip waiting requested");

                if waiting { self.activate().await.map(Some) } else { Ok(None) }
            }
        }
    }
}
