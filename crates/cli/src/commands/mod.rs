//! Subcommand implementations.
//!
//! Each command takes its clap arguments plus the loaded config and returns
//! a serializable output; `main` does the printing.

pub mod export;
pub mod ingest;
pub mod validate;
pub mod worker;
