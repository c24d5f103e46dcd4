//! Core types and shared functionality for foodmap.
//!
//! This crate provides:
//! - The restaurant dataset pipeline (parse, validate, materialize)
//! - Request/response snapshots and named cache stores (SQLite and in-memory)
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod dataset;
pub mod error;
pub mod http;

pub use cache::{CacheDb, CacheStorage, CacheStore, MemoryStorage};
pub use config::AppConfig;
pub use dataset::{Coordinates, Restaurant};
pub use error::Error;
pub use http::{Destination, Request, Response, ResponseType};
