//! Client side of foodmap.
//!
//! This crate provides the network seam (with a reqwest implementation) and
//! the offline caching worker that sits between the app and the network.

pub mod fetch;
pub mod worker;

pub use fetch::{FetchClient, FetchConfig, Network, UrlError, canonicalize};
pub use worker::{ClientMessage, ServiceWorker, Strategy, WorkerConfig, WorkerState};
