//! `foodmap worker ...`: drive the caching worker from the command line.
//!
//! Every invocation starts a fresh worker over the persistent SQLite cache
//! at `db_path`, so `install` behaves like registering a new version of the
//! app and `fetch` like a page load under that worker.

use anyhow::{Result, anyhow};
use clap::Subcommand;
use foodmap_client::fetch::{FetchClient, FetchConfig, Network, resolve};
use foodmap_client::worker::{ClientMessage, ServiceWorker, WorkerConfig, classify};
use foodmap_core::{AppConfig, CacheDb, CacheStorage, CacheStore, Request};
use serde::Serialize;

use crate::print_json;

#[derive(Debug, Clone, Subcommand)]
pub enum WorkerCommand {
    /// Precache the app shell, then activate and drop stale generations.
    Install,

    /// Fetch a URL (absolute, or a path on the origin) through the worker.
    Fetch {
        url: String,

        /// Treat the request as a top-level navigation.
        #[arg(long)]
        document: bool,
    },

    /// List cache generations and their entries.
    Caches,

    /// Delete one cache generation.
    Purge { name: String },

    /// Install, then post a client message such as `{"type":"SKIP_WAITING"}`.
    Message { json: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct InstallOutput {
    pub state: String,
    pub deleted: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FetchOutput {
    pub url: String,
    pub strategy: String,
    pub status: u16,
    pub response_type: String,
    pub content_type: Option<String>,
    pub bytes: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheListing {
    pub name: String,
    pub entries: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PurgeOutput {
    pub name: String,
    pub deleted: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageOutput {
    pub handled: bool,
    pub state: String,
    pub deleted: Vec<String>,
}

pub async fn run(config: &AppConfig, command: WorkerCommand) -> Result<()> {
    let db = CacheDb::open(&config.db_path).await?;

    match command {
        WorkerCommand::Install => print_json(&install_impl(&live_worker(config, db)?).await?),
        WorkerCommand::Fetch { url, document } => {
            print_json(&fetch_impl(&live_worker(config, db)?, &url, document).await?)
        }
        WorkerCommand::Caches => print_json(&caches_impl(&db).await?),
        WorkerCommand::Purge { name } => print_json(&purge_impl(&db, &name).await?),
        WorkerCommand::Message { json } => print_json(&message_impl(&live_worker(config, db)?, &json).await?),
    }
}

fn live_worker(config: &AppConfig, db: CacheDb) -> Result<ServiceWorker<CacheDb, FetchClient>> {
    let network = FetchClient::new(FetchConfig::from_app(config)?)?;
    Ok(ServiceWorker::new(WorkerConfig::from_app(config)?, db, network))
}

pub async fn install_impl<N>(worker: &ServiceWorker<CacheDb, N>) -> Result<InstallOutput>
where
    N: Network,
{
    let deleted = worker.start().await?;
    Ok(InstallOutput { state: worker.state().await.to_string(), deleted })
}

pub async fn fetch_impl<N>(worker: &ServiceWorker<CacheDb, N>, target: &str, document: bool) -> Result<FetchOutput>
where
    N: Network,
{
    let config = worker.config();
    let url = resolve(&config.origin, target).map_err(|e| anyhow!("INVALID_URL: {e}"))?;
    let request = if document { Request::navigate(url) } else { Request::get(url) };
    let strategy = classify(&request, &config.origin, &config.provider_patterns);

    let response = worker.handle_fetch(&request).await?;

    Ok(FetchOutput {
        url: request.cache_url(),
        strategy: format!("{strategy:?}"),
        status: response.status,
        response_type: response.kind.as_str().to_string(),
        content_type: response.header("content-type").map(str::to_string),
        bytes: response.body.len(),
    })
}

pub async fn message_impl<N>(worker: &ServiceWorker<CacheDb, N>, raw: &str) -> Result<MessageOutput>
where
    N: Network,
{
    let Some(message) = ClientMessage::parse(raw) else {
        return Ok(MessageOutput { handled: false, state: worker.state().await.to_string(), deleted: Vec::new() });
    };

    worker.install().await?;
    let deleted = worker.handle_message(message).await?.unwrap_or_default();
    Ok(MessageOutput { handled: true, state: worker.state().await.to_string(), deleted })
}

pub async fn caches_impl(db: &CacheDb) -> Result<Vec<CacheListing>> {
    let mut listings = Vec::new();
    for name in db.keys().await? {
        let entries = db.open(&name).await?.keys().await?;
        listings.push(CacheListing { name, entries });
    }
    Ok(listings)
}

pub async fn purge_impl(db: &CacheDb, name: &str) -> Result<PurgeOutput> {
    let deleted = db.delete(name).await?;
    if deleted {
        tracing::info!(cache = name, "purged cache");
    }
    Ok(PurgeOutput { name: name.to_string(), deleted })
}
