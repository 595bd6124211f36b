//! Parse and load user configuration.

use std::{fs, path::Path};

use ron::{Options, extensions::Extensions};
use tracing::debug;

use crate::{Config, Error};

/// Parse a configuration from RON source text.
///
/// `Option` fields may be written without `Some(..)`.
pub fn load_from_str(source: &str) -> Result<Config, Error> {
    let options = Options::default().with_default_extension(Extensions::IMPLICIT_SOME);
    let config: Config = options.from_str(source).map_err(|e| Error::Parse {
        path: None,
        message: e.to_string(),
    })?;
    validate(&config)?;
    Ok(config)
}

/// Load a configuration from a RON file at `path`.
pub fn load_from_path(path: &Path) -> Result<Config, Error> {
    let source = fs::read_to_string(path).map_err(|e| Error::Read {
        path: Some(path.to_path_buf()),
        message: e.to_string(),
    })?;
    let config = load_from_str(&source).map_err(|e| e.with_path(path))?;
    debug!(path = %path.display(), keys = config.keys.len(), "config_loaded");
    Ok(config)
}

/// Reject bindings that can never be dispatched or constructed.
fn validate(config: &Config) -> Result<(), Error> {
    for (key, desc) in &config.keys {
        if key.is_empty() || key.contains(['\n', '\r']) {
            return Err(Error::Validation {
                path: None,
                key: key.clone(),
                message: "key identifiers must be non-empty single-line strings".to_string(),
            });
        }
        if desc.kind.eq_ignore_ascii_case("pomodoro") && desc.duration == 0 {
            return Err(Error::Validation {
                path: None,
                key: key.clone(),
                message: "pomodoro duration must be at least one minute".to_string(),
            });
        }
    }
    Ok(())
}
