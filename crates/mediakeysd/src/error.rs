use std::{io::Error as IoError, result::Result as StdResult};

use thiserror::Error;

/// Errors surfaced by the daemon and its command line client.
#[derive(Error, Debug)]
pub enum Error {
    /// Settings could not be loaded or saved.
    #[error("{0}")]
    Config(#[from] config::Error),

    /// Engine construction failed.
    #[error("Engine error: {0}")]
    Engine(#[from] mediakeys_engine::Error),

    /// The media key tap could not be installed.
    #[error("Media key tap error: {0}")]
    Tap(#[from] mac_mediakey::Error),

    /// Framing or message decoding failed.
    #[error("Protocol error: {0}")]
    Protocol(#[from] mediakeys_protocol::Error),

    /// Error in control socket communication
    #[error("IPC error: {0}")]
    Ipc(String),

    /// IO-related errors
    #[error("IO error: {0}")]
    Io(#[from] IoError),
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = StdResult<T, Error>;
