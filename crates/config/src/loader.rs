//! Parse, load and persist user settings.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use ron::{Options, extensions::Extensions, ser::PrettyConfig};
use tracing::debug;

use crate::{Error, Settings};

/// RON options: allow `fallback: spotify` as shorthand for `Some(spotify)`.
fn options() -> Options {
    Options::default().with_default_extension(Extensions::IMPLICIT_SOME)
}

/// Parse and validate settings from RON text. `path` is only used for errors.
pub fn load_from_str(text: &str, path: Option<&Path>) -> Result<Settings, Error> {
    let settings: Settings = options()
        .from_str(text)
        .map_err(|e| Error::from_ron(path, text, &e))?;
    settings.validate().map_err(|message| Error::Validation {
        path: path.map(Path::to_path_buf),
        message,
    })?;
    Ok(settings)
}

/// Load settings from a RON file.
pub fn load_from_path(path: &Path) -> Result<Settings, Error> {
    let text = fs::read_to_string(path).map_err(|e| Error::Read {
        path: Some(path.to_path_buf()),
        message: e.to_string(),
    })?;
    load_from_str(&text, Some(path))
}

/// Load settings, treating a missing file as "all defaults".
pub fn load_or_default(path: &Path) -> Result<Settings, Error> {
    match fs::metadata(path) {
        Ok(_) => load_from_path(path),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "config_missing_using_defaults");
            Ok(Settings::default())
        }
        Err(e) => Err(Error::Read {
            path: Some(path.to_path_buf()),
            message: e.to_string(),
        }),
    }
}

/// Write settings to `path`, creating parent directories as needed.
///
/// The file is written to a sibling temporary path and renamed into place so a
/// concurrent reader never sees a truncated file.
pub fn save_to_path(settings: &Settings, path: &Path) -> Result<(), Error> {
    let write_err = |e: &dyn ToString| Error::Write {
        path: path.to_path_buf(),
        message: e.to_string(),
    };
    let text = ron::ser::to_string_pretty(settings, PrettyConfig::new().struct_names(false))
        .map_err(|e| write_err(&e))?;
    if let Some(dir) = path.parent()
        && !dir.as_os_str().is_empty()
    {
        fs::create_dir_all(dir).map_err(|e| write_err(&e))?;
    }
    let tmp = tmp_path(path);
    fs::write(&tmp, text).map_err(|e| write_err(&e))?;
    fs::rename(&tmp, path).map_err(|e| write_err(&e))?;
    debug!(path = %path.display(), enabled = settings.enabled, "config_saved");
    Ok(())
}

/// Sibling path used for atomic writes.
fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
