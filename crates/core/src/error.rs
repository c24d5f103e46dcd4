//! Unified error types for foodmap.
//!
//! Every variant renders with a stable code prefix so CLI diagnostics and
//! logs can be grepped by failure class.

use tokio_rusqlite::rusqlite;

/// Unified error types for the ingestion pipeline and the caching layer.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., strict ingestion with skipped entries).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// A structured source document could not be deserialized.
    #[error("PARSE_FAILED: {0}")]
    ParseFailed(String),

    /// Reading a source document or writing the dataset artifact failed.
    #[error("IO_ERROR: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization of the dataset artifact failed.
    #[error("SERIALIZE_FAILED: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// Attempted to store a response that is not a plain 200.
    #[error("NOT_CACHEABLE: {0}")]
    NotCacheable(String),

    /// Invalid URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// The network could not be reached or the transport failed.
    #[error("NETWORK_ERROR: {0}")]
    Network(String),

    /// Precaching failed; nothing was stored.
    #[error("INSTALL_FAILED: {0}")]
    InstallFailed(String),

    /// A lifecycle event arrived in a state that cannot accept it.
    #[error("INVALID_STATE: {0}")]
    InvalidState(String),
}

impl Error {
    /// Stable code for the error class, matching the display prefix.
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidInput(_) => "INVALID_INPUT",
            Error::ParseFailed(_) => "PARSE_FAILED",
            Error::Io(_) => "IO_ERROR",
            Error::Serialize(_) => "SERIALIZE_FAILED",
            Error::Database(_) | Error::MigrationFailed(_) => "CACHE_ERROR",
            Error::NotCacheable(_) => "NOT_CACHEABLE",
            Error::InvalidUrl(_) => "INVALID_URL",
            Error::Network(_) => "NETWORK_ERROR",
            Error::InstallFailed(_) => "INSTALL_FAILED",
            Error::InvalidState(_) => "INVALID_STATE",
        }
    }

    /// Whether this error came from the network rather than local state.
    pub fn is_network(&self) -> bool {
        matches!(self, Error::Network(_))
    }
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}
