//! Fetch interception policy.
//!
//! Every request is classified into one of three strategies:
//!
//! | Request                        | Strategy                          |
//! |--------------------------------|-----------------------------------|
//! | cross-origin map tile provider | cache-first, runtime generation   |
//! | other cross-origin             | network-first, any generation     |
//! | same-origin                    | cache-first, static or runtime    |
//!
//! Network failures are absorbed here: the caller gets a cached response,
//! the cached app shell, or a synthetic `503 Offline`. The one exception is
//! a network-first request with nothing cached, which returns the network
//! error.

use foodmap_core::{CacheStorage, CacheStore, Error, Request, Response};
use tracing::{debug, warn};
use url::Url;

use super::ServiceWorker;
use crate::fetch::{Network, same_origin};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Map tiles: serve from the runtime cache, fill it on miss.
    ProviderCacheFirst,
    /// Other cross-origin resources: prefer fresh, fall back to cache.
    NetworkFirst,
    /// The app itself: serve from cache, fill the matching generation on miss.
    SameOriginCacheFirst,
}

/// Whether `host` belongs to a map tile provider.
///
/// Matches when the host contains any of `patterns` (case-insensitive).
pub fn is_provider_host(host: &str, patterns: &[String]) -> bool {
    let host = host.to_ascii_lowercase();
    patterns
        .iter()
        .filter(|p| !p.is_empty())
        .any(|p| host.contains(&p.to_ascii_lowercase()))
}

pub fn classify(request: &Request, origin: &Url, provider_patterns: &[String]) -> Strategy {
    if same_origin(&request.url, origin) {
        return Strategy::SameOriginCacheFirst;
    }
    match request.url.host_str() {
        Some(host) if is_provider_host(host, provider_patterns) => Strategy::ProviderCacheFirst,
        _ => Strategy::NetworkFirst,
    }
}

impl<S: CacheStorage, N: Network> ServiceWorker<S, N> {
    /// Answer an intercepted request.
    ///
    /// Runs in any lifecycle state and never waits on install or activate.
    pub async fn handle_fetch(&self, request: &Request) -> Result<Response, Error> {
        let strategy = classify(request, &self.config.origin, &self.config.provider_patterns);
        debug!(url = %request.url, ?strategy, "intercepted");

        match strategy {
            Strategy::ProviderCacheFirst => self.provider_cache_first(request).await,
            Strategy::NetworkFirst => self.network_first(request).await,
            Strategy::SameOriginCacheFirst => self.same_origin_cache_first(request).await,
        }
    }

    async fn provider_cache_first(&self, request: &Request) -> Result<Response, Error> {
        let store = self.storage.open(&self.config.runtime_cache).await?;
        if let Some(hit) = store.match_request(request).await? {
            debug!(url = %request.url, "tile cache hit");
            return Ok(hit);
        }

        match self.network.fetch(request).await {
            Ok(response) => {
                if response.ok() && response.is_cacheable() {
                    self.write_through(&self.config.runtime_cache, request, &response).await;
                }
                Ok(response)
            }
            Err(e) => {
                debug!(url = %request.url, "tile unavailable offline: {e}");
                Ok(Response::offline())
            }
        }
    }

    async fn network_first(&self, request: &Request) -> Result<Response, Error> {
        match self.network.fetch(request).await {
            Ok(response) => Ok(response),
            Err(e) => match self.storage.match_any(request).await? {
                Some(hit) => {
                    debug!(url = %request.url, "network failed, serving cached copy");
                    Ok(hit)
                }
                None => Err(e),
            },
        }
    }

    async fn same_origin_cache_first(&self, request: &Request) -> Result<Response, Error> {
        if let Some(hit) = self.storage.match_any(request).await? {
            debug!(url = %request.url, "cache hit");
            return Ok(hit);
        }
        debug!(url = %request.url, "cache miss");

        match self.network.fetch(request).await {
            Ok(response) => {
                if response.is_cacheable() {
                    self.write_through(self.config.generation_for(request), request, &response).await;
                }
                Ok(response)
            }
            Err(e) => {
                debug!(url = %request.url, "offline: {e}");
                if request.is_navigation() {
                    let root = Request::navigate(self.config.root_url());
                    if let Some(shell) = self.storage.match_any(&root).await? {
                        return Ok(shell);
                    }
                }
                Ok(Response::offline())
            }
        }
    }

    /// Store a copy of a response being returned. Failures are logged only.
    async fn write_through(&self, cache: &str, request: &Request, response: &Response) {
        let stored = match self.storage.open(cache).await {
            Ok(store) => store.put(request, response.clone()).await,
            Err(e) => Err(e),
        };
        if let Err(e) = stored {
            warn!(cache, url = %request.url, "failed to cache response: {e}");
        }
    }
}
