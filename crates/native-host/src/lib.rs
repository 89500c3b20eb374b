//! Chrome native-messaging host for the mediakeys browser extension.
//!
//! The browser starts the host and talks to it over stdin/stdout using
//! length-prefixed JSON. The host holds a connection to the mediakeysd control
//! socket: tab state and command results flow to the daemon, actions flow
//! back to the extension.

mod error;
mod relay;

pub use error::{Error, Result};
pub use relay::{RECONNECT_DELAY, Relay};
