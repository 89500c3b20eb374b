//! mediakeysd: routes macOS media keys to Spotify, Bandcamp or YouTube.
//!
//! The binary wires the [`mediakeys_engine::Engine`] to the OS media key tap,
//! to AppleScript-driven sinks and pollers, and to a Unix control socket used
//! by the CLI and by the browser extension's native-messaging host.

pub mod client;
pub mod daemon;
mod error;
pub mod hosts;
pub mod osascript;
pub mod poller;
pub mod server;
pub mod sinks;
pub mod site;
pub mod tap;
#[cfg(test)]
mod test_support;

pub use error::{Error, Result};
