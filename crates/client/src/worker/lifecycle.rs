//! Install/activate lifecycle.
//!
//! ```text
//! Parsed -> Installing -> Installed -> Activating -> Activated
//!               |                          |
//!               v                          v
//!           Redundant                  Installed (activation failed)
//! ```
//!
//! A failed install leaves the worker `Redundant`; install may be retried
//! from there. The state cell is only locked for the transition itself,
//! never while precaching or deleting caches.

use std::fmt;

use foodmap_core::{CacheStorage, Error};
use futures_util::future::try_join_all;
use tracing::{info, warn};

use super::ServiceWorker;
use super::precache::add_all;
use crate::fetch::Network;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Parsed,
    Installing,
    /// Installed and waiting for activation.
    Installed,
    Activating,
    Activated,
    Redundant,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WorkerState::Parsed => "parsed",
            WorkerState::Installing => "installing",
            WorkerState::Installed => "installed",
            WorkerState::Activating => "activating",
            WorkerState::Activated => "activated",
            WorkerState::Redundant => "redundant",
        };
        f.write_str(s)
    }
}

/// Lifecycle state plus the flags the lifecycle events set.
#[derive(Debug, Clone)]
pub struct Lifecycle {
    state: WorkerState,
    skip_waiting: bool,
    clients_claimed: bool,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self { state: WorkerState::Parsed, skip_waiting: false, clients_claimed: false }
    }
}

impl Lifecycle {
    pub fn state(&self) -> WorkerState {
        self.state
    }

    pub fn skip_waiting(&self) -> bool {
        self.skip_waiting
    }

    pub fn clients_claimed(&self) -> bool {
        self.clients_claimed
    }

    fn invalid(&self, event: &str) -> Error {
        Error::InvalidState(format!("cannot {event} while {}", self.state))
    }

    pub fn begin_install(&mut self) -> Result<(), Error> {
        match self.state {
            WorkerState::Parsed | WorkerState::Redundant => {
                self.state = WorkerState::Installing;
                Ok(())
            }
            _ => Err(self.invalid("install")),
        }
    }

    /// Install succeeded. Skip-waiting is always requested.
    pub fn finish_install(&mut self) {
        self.state = WorkerState::Installed;
        self.skip_waiting = true;
    }

    pub fn fail_install(&mut self) {
        self.state = WorkerState::Redundant;
    }

    pub fn begin_activate(&mut self) -> Result<(), Error> {
        match self.state {
            WorkerState::Installed => {
                self.state = WorkerState::Activating;
                Ok(())
            }
            _ => Err(self.invalid("activate")),
        }
    }

    /// Activation done; the worker takes control of open clients.
    pub fn finish_activate(&mut self) {
        self.state = WorkerState::Activated;
        self.clients_claimed = true;
    }

    pub fn abort_activate(&mut self) {
        self.state = WorkerState::Installed;
    }

    pub fn request_skip_waiting(&mut self) {
        self.skip_waiting = true;
    }
}

impl<S: CacheStorage, N: Network> ServiceWorker<S, N> {
    /// Precache the static manifest into the static generation.
    ///
    /// All-or-nothing: on any failure nothing is stored, the worker becomes
    /// `Redundant` and the error is returned. Returns the number of entries
    /// stored.
    pub async fn install(&self) -> Result<usize, Error> {
        self.lifecycle.write().await.begin_install()?;
        info!(cache = %self.config.static_cache, "installing");

        let result = self.precache().await;

        let mut lifecycle = self.lifecycle.write().await;
        match result {
            Ok(count) => {
                lifecycle.finish_install();
                info!(cache = %self.config.static_cache, entries = count, "installed");
                Ok(count)
            }
            Err(e) => {
                lifecycle.fail_install();
                warn!("install failed: {e}");
                Err(match e {
                    Error::InstallFailed(_) => e,
                    other => Error::InstallFailed(other.to_string()),
                })
            }
        }
    }

    async fn precache(&self) -> Result<usize, Error> {
        let requests = self.config.precache_requests()?;
        let store = self.storage.open(&self.config.static_cache).await?;
        add_all(&store, &self.network, &requests).await
    }

    /// Delete every cache generation other than the static and runtime ones,
    /// then take control of clients. Returns the deleted names.
    pub async fn activate(&self) -> Result<Vec<String>, Error> {
        self.lifecycle.write().await.begin_activate()?;
        info!("activating");

        match self.purge_stale_generations().await {
            Ok(deleted) => {
                self.lifecycle.write().await.finish_activate();
                info!(deleted = deleted.len(), "activated");
                Ok(deleted)
            }
            Err(e) => {
                self.lifecycle.write().await.abort_activate();
                warn!("activation failed: {e}");
                Err(e)
            }
        }
    }

    async fn purge_stale_generations(&self) -> Result<Vec<String>, Error> {
        let stale: Vec<String> = self
            .storage
            .keys()
            .await?
            .into_iter()
            .filter(|name| !self.config.is_current(name))
            .collect();

        try_join_all(stale.iter().map(|name| {
            info!(cache = %name, "deleting stale cache");
            self.storage.delete(name)
        }))
        .await?;

        Ok(stale)
    }

    /// Install, then activate unless the worker is left waiting.
    ///
    /// This is what registering the worker amounts to.
    pub async fn start(&self) -> Result<Vec<String>, Error> {
        self.install().await?;
        if self.lifecycle.read().await.skip_waiting() { self.activate().await } else { Ok(Vec::new()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::testing::{FakeNetwork, config, worker};
    use foodmap_core::{CacheStore, MemoryStorage, Request, Response};

    #[test]
    fn test_transitions() {
        let mut lc = Lifecycle::default();
        assert_eq!(lc.state(), WorkerState::Parsed);
        assert!(matches!(lc.begin_activate(), Err(Error::InvalidState(_))));

        lc.begin_install().unwrap();
        assert!(matches!(lc.begin_install(), Err(Error::InvalidState(_))));
        lc.finish_install();
        assert_eq!(lc.state(), WorkerState::Installed);
        assert!(lc.skip_waiting());

        lc.begin_activate().unwrap();
        lc.finish_activate();
        assert_eq!(lc.state(), WorkerState::Activated);
        assert!(lc.clients_claimed());
        assert!(lc.begin_install().is_err());
    }

    #[test]
    fn test_failed_install_is_retryable() {
        let mut lc = Lifecycle::default();
        lc.begin_install().unwrap();
        lc.fail_install();
        assert_eq!(lc.state(), WorkerState::Redundant);
        assert!(!lc.skip_waiting());
        lc.begin_install().unwrap();
        assert_eq!(lc.state(), WorkerState::Installing);
    }

    #[test]
    fn test_invalid_state_message() {
        let lc = Lifecycle::default();
        assert_eq!(lc.invalid("activate").to_string(), "INVALID_STATE: cannot activate while parsed");
    }

    #[tokio::test]
    async fn test_install_precaches_manifest() {
        let sw = worker(FakeNetwork::with_shell());

        assert_eq!(sw.install().await.unwrap(), 3);
        assert_eq!(sw.state().await, WorkerState::Installed);

        let store = sw.storage().open("foodmap-v1").await.unwrap();
        assert_eq!(
            store.keys().await.unwrap(),
            vec![
                "http://localhost:5173/",
                "http://localhost:5173/icon.svg",
                "http://localhost:5173/manifest.json"
            ]
        );
        assert_eq!(sw.network().calls(), 3);
    }

    #[tokio::test]
    async fn test_install_is_all_or_nothing() {
        let network = FakeNetwork::with_shell().route("/icon.svg", Response::new(404, "missing"));
        let sw = worker(network);

        let err = sw.install().await.unwrap_err();
        assert!(matches!(err, Error::InstallFailed(_)));
        assert_eq!(sw.state().await, WorkerState::Redundant);

        let store = sw.storage().open("foodmap-v1").await.unwrap();
        assert!(store.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_install_retry_after_network_failure() {
        let sw = worker(FakeNetwork::with_shell());
        sw.network().set_online(false);
        assert!(sw.install().await.is_err());
        assert_eq!(sw.state().await, WorkerState::Redundant);

        sw.network().set_online(true);
        assert_eq!(sw.install().await.unwrap(), 3);
        assert_eq!(sw.state().await, WorkerState::Installed);
    }

    #[tokio::test]
    async fn test_activate_deletes_only_stale_generations() {
        let storage = MemoryStorage::new();
        for name in ["foodmap-v1", "foodmap-runtime", "foodmap-old"] {
            storage.open(name).await.unwrap();
        }
        let sw = ServiceWorker::new(config(), storage, FakeNetwork::with_shell());

        sw.install().await.unwrap();
        let deleted = sw.activate().await.unwrap();

        assert_eq!(deleted, vec!["foodmap-old"]);
        assert_eq!(sw.storage().keys().await.unwrap(), vec!["foodmap-v1", "foodmap-runtime"]);
        assert_eq!(sw.state().await, WorkerState::Activated);
        assert!(sw.clients_claimed().await);
    }

    #[tokio::test]
    async fn test_activate_requires_install() {
        let sw = worker(FakeNetwork::with_shell());
        assert!(matches!(sw.activate().await, Err(Error::InvalidState(_))));
        assert_eq!(sw.state().await, WorkerState::Parsed);
    }

    #[tokio::test]
    async fn test_start_installs_and_activates() {
        let sw = worker(FakeNetwork::with_shell());
        sw.storage().open("foodmap-v0").await.unwrap();

        let deleted = sw.start().await.unwrap();

        assert_eq!(deleted, vec!["foodmap-v0"]);
        assert_eq!(sw.state().await, WorkerState::Activated);
        let root = Request::navigate(sw.config().root_url());
        assert!(sw.storage().match_any(&root).await.unwrap().is_some());
    }
}
