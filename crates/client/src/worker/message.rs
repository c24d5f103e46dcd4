//! Messages pages post to the worker.

use serde::{Deserialize, Serialize};

/// A message from a controlled page, tagged by `type`.
///
/// ```json
/// {"type": "SKIP_WAITING"}
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientMessage {
    SkipWaiting,
}

impl ClientMessage {
    /// Parse a posted message. Unknown or malformed messages are ignored.
    pub fn parse(raw: &str) -> Option<Self> {
        match serde_json::from_str(raw) {
            Ok(message) => Some(message),
            Err(e) => {
                tracing::debug!("ignoring client message {raw:?}: {e}");
                None
            }
        }
    }
}
