//! Key binding configuration for macropad.
//!
//! The configuration is a RON file mapping key identifiers to action
//! descriptors, plus optional settings for the serial port, the
//! time-tracking service, and the admin endpoint.

use std::{
    env,
    path::{Path, PathBuf},
};

mod error;
mod loader;
mod types;

#[cfg(test)]
mod test_parse;

pub use error::Error;
pub use loader::{load_from_path, load_from_str};
pub use types::{
    ActionDescriptor, AdminConfig, Config, DEFAULT_ADMIN_LISTEN, DEFAULT_TRACKING_URL, TOKEN_ENV,
    TrackingConfig,
};

/// Determine the preferred user config path (`~/.macropad.ron`).
pub fn default_config_path() -> PathBuf {
    let mut p = PathBuf::from(env::var_os("HOME").unwrap_or_default());
    p.push(".macropad.ron");
    p
}

/// Resolve the effective config path using the default policy.
///
/// Policy:
/// 1) Use `explicit` when provided.
/// 2) Else use `~/.macropad.ron` when it exists.
/// 3) Else return a "no config found" error naming the expected location.
pub fn resolve_config_path(explicit: Option<&Path>) -> Result<PathBuf, Error> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    let preferred = default_config_path();
    if preferred.exists() {
        return Ok(preferred);
    }

    Err(Error::Read {
        path: Some(preferred),
        message: "No config found. Create ~/.macropad.ron".to_string(),
    })
}
