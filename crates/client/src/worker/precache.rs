//! Atomic batch precaching.

use foodmap_core::{CacheStore, Error, Request};
use futures_util::future::join_all;
use tracing::debug;

use crate::fetch::Network;

/// Fetch every request concurrently and store the responses.
///
/// Nothing is written unless every fetch succeeded with a cacheable
/// response. Returns the number of entries stored.
pub async fn add_all<C, N>(store: &C, network: &N, requests: &[Request]) -> Result<usize, Error>
where
    C: CacheStore + ?Sized,
    N: Network + ?Sized,
{
    let responses = join_all(requests.iter().map(|request| network.fetch(request))).await;

    let mut ready = Vec::with_capacity(requests.len());
    for (request, result) in requests.iter().zip(responses) {
        let response =
            result.map_err(|e| Error::InstallFailed(format!("{}: {e}", request.cache_url())))?;
        if !response.is_cacheable() {
            return Err(Error::InstallFailed(format!(
                "{} returned status {}",
                request.cache_url(),
                response.status
            )));
        }
        ready.push((request, response));
    }

    for (request, response) in ready {
        debug!(cache = store.name(), url = %request.url, "precached");
        store.put(request, response).await?;
    }

    Ok(requests.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::testing::FakeNetwork;
    use foodmap_core::{CacheStorage, MemoryStorage, Response};
    use url::Url;

    fn requests(paths: &[&str]) -> Vec<Request> {
        paths
            .iter()
            .map(|p| Request::get(Url::parse(&format!("http://localhost:5173{p}")).unwrap()))
            .collect()
    }

    #[tokio::test]
    async fn test_add_all_stores_everything() {
        let storage = MemoryStorage::new();
        let store = storage.open("foodmap-v1").await.unwrap();
        let network = FakeNetwork::with_shell();

        let count = add_all(&store, &network, &requests(&["/", "/manifest.json"])).await.unwrap();

        assert_eq!(count, 2);
        assert_eq!(store.keys().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_add_all_fails_on_missing_resource() {
        let storage = MemoryStorage::new();
        let store = storage.open("foodmap-v1").await.unwrap();
        let network = FakeNetwork::with_shell();

        let err = add_all(&store, &network, &requests(&["/", "/not-deployed.png"])).await.unwrap_err();

        assert!(matches!(err, Error::InstallFailed(_)));
        assert!(err.to_string().contains("404"));
        assert!(store.keys().await.unwrap().is_empty());
        // every fetch was still attempted
        assert_eq!(network.calls(), 2);
    }

    #[tokio::test]
    async fn test_add_all_fails_when_offline() {
        let storage = MemoryStorage::new();
        let store = storage.open("foodmap-v1").await.unwrap();
        let network = FakeNetwork::with_shell();
        network.set_online(false);

        let err = add_all(&store, &network, &requests(&["/"])).await.unwrap_err();
        assert!(matches!(err, Error::InstallFailed(_)));
        assert!(store.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_all_rejects_non_200() {
        let storage = MemoryStorage::new();
        let store = storage.open("foodmap-v1").await.unwrap();
        let network = FakeNetwork::with_shell().route("/", Response::new(204, ""));

        assert!(add_all(&store, &network, &requests(&["/"])).await.is_err());
    }
}
