use std::{io, result::Result as StdResult};

use thiserror::Error;

/// Convenient result type for the engine crate.
pub type Result<T> = StdResult<T, Error>;

/// Unified error type for the mediakeys engine.
///
/// Only construction can fail; the key path always produces a decision.
#[derive(Debug, Error)]
pub enum Error {
    /// The dispatch worker thread could not be spawned.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Settings handed to the engine are not usable.
    #[error("Invalid policy: {0}")]
    Policy(String),
}
