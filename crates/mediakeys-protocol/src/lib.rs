//! Shared types for the mediakeys workspace.
//!
//! - [`Source`], [`MediaKey`] and [`Command`]: the vocabulary every other
//!   crate speaks.
//! - [`Msg`]: messages exchanged over the daemon's control socket.
//! - [`ExtensionMsg`] / [`ExtensionAction`]: messages exchanged with the
//!   browser extension over Chrome native messaging.
//! - [`codec`]: the 4-byte little-endian length prefixed JSON framing used by
//!   both of the above.

pub mod codec;
mod error;
mod source;
mod wire;

pub use error::{Error, Result};
pub use source::{Command, MediaKey, ParseError, Source, SourceFamily};
pub use wire::{ExtensionAction, ExtensionMsg, Msg, Role, SourceStatus, StatusReport, TabStateTag};
