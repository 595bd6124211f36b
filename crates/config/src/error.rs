//! Error types for configuration loading and validation.

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error, Clone)]
/// Errors produced while loading, parsing, or validating a configuration.
pub enum Error {
    #[error("{message}")]
    /// I/O or filesystem read error.
    Read {
        /// Optional path associated with the read error.
        path: Option<PathBuf>,
        /// Human-readable error message.
        message: String,
    },
    #[error("{message}")]
    /// RON parse error as reported by the parser (includes line and column).
    Parse {
        /// Optional path associated with the parse error.
        path: Option<PathBuf>,
        /// Human-readable error message.
        message: String,
    },
    #[error("{key}: {message}")]
    /// A key binding that parsed but cannot be used.
    Validation {
        /// Optional path associated with the validation error.
        path: Option<PathBuf>,
        /// Key identifier the binding belongs to.
        key: String,
        /// Human-readable error message.
        message: String,
    },
}

impl Error {
    /// Render a human-friendly error message including the path when available.
    pub fn pretty(&self) -> String {
        match self {
            Self::Read { path, message } => match path {
                Some(p) => format!("Read error at {}: {}", p.display(), message),
                None => format!("Read error: {}", message),
            },
            Self::Parse { path, message } => match path {
                Some(p) => format!("Config parse error in {}\n{}", p.display(), message),
                None => format!("Config parse error\n{}", message),
            },
            Self::Validation { path, key, message } => match path {
                Some(p) => format!(
                    "Config validation error in {} (key {})\n{}",
                    p.display(),
                    key,
                    message
                ),
                None => format!("Config validation error (key {})\n{}", key, message),
            },
        }
    }

    /// Access the optional path attached to this error.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Read { path, .. } | Self::Parse { path, .. } | Self::Validation { path, .. } => {
                path.as_deref()
            }
        }
    }

    /// Attach `path` to an error that was produced without one.
    pub(crate) fn with_path(self, p: &Path) -> Self {
        let path = Some(p.to_path_buf());
        match self {
            Self::Read { message, .. } => Self::Read { path, message },
            Self::Parse { message, .. } => Self::Parse { path, message },
            Self::Validation { key, message, .. } => Self::Validation { path, key, message },
        }
    }
}
