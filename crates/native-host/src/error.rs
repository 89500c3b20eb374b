use std::{io::Error as IoError, result::Result as StdResult};

use thiserror::Error;

/// Errors that end the host.
#[derive(Error, Debug)]
pub enum Error {
    /// Reading from the browser or writing back to it failed.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// A message could not be encoded.
    #[error("Protocol error: {0}")]
    Protocol(#[from] mediakeys_protocol::Error),
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = StdResult<T, Error>;
