//! User settings for mediakeys: resolution policy, focus classification and
//! the persisted enable switch.
//!
//! Settings live in a single RON file (`~/.mediakeys/config.ron` by default).
//! Every field is optional; missing fields take the values in [`defaults`].
#![warn(unsafe_op_in_unsafe_fn)]

use std::{
    env,
    path::{Path, PathBuf},
};

pub mod defaults;
mod error;
mod loader;
mod settings;

#[cfg(test)]
mod test_parse;

pub use error::{Error, excerpt_at};
pub use loader::{load_from_path, load_from_str, load_or_default, save_to_path};
pub use settings::{FocusRules, Policy, Settings};

/// Environment variable that overrides the config path.
pub const CONFIG_ENV: &str = "MEDIAKEYS_CONFIG";

/// Per-user state directory (`~/.mediakeys`).
pub fn state_dir() -> PathBuf {
    let mut p = PathBuf::from(env::var_os("HOME").unwrap_or_default());
    p.push(".mediakeys");
    p
}

/// Determine the preferred user config path (`~/.mediakeys/config.ron`).
pub fn default_config_path() -> PathBuf {
    state_dir().join("config.ron")
}

/// Default control socket path (`~/.mediakeys/mediakeyd.sock`).
pub fn default_socket_path() -> PathBuf {
    state_dir().join("mediakeyd.sock")
}

/// Resolve the effective config path.
///
/// Policy:
/// 1) Use `explicit` when provided.
/// 2) Else use `$MEDIAKEYS_CONFIG` when set.
/// 3) Else `~/.mediakeys/config.ron`, whether or not it exists yet; a missing
///    file means "all defaults" and is created on the first save.
pub fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    if let Some(p) = env::var_os(CONFIG_ENV) {
        return PathBuf::from(p);
    }
    default_config_path()
}
