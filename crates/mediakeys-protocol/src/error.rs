use std::result::Result as StdResult;

use thiserror::Error;

/// Convenient result type for protocol operations.
pub type Result<T> = StdResult<T, Error>;

/// Errors produced while framing or decoding protocol messages.
#[derive(Debug, Error)]
pub enum Error {
    /// Payload was not valid JSON for the expected message type.
    #[error("invalid message payload: {0}")]
    Json(#[from] serde_json::Error),
}
