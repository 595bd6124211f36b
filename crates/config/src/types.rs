//! Configuration data types.

use std::{collections::BTreeMap, env, path::PathBuf};

use serde::{Deserialize, Serialize};

/// Environment variable consulted when the tracking token is not set in the file.
pub const TOKEN_ENV: &str = "AUXILIUM_TOKEN";

/// Default base URL of the time-tracking service.
pub const DEFAULT_TRACKING_URL: &str = "https://track.epic.net/api";

/// Default listen address for the admin endpoint.
pub const DEFAULT_ADMIN_LISTEN: &str = "127.0.0.1:6276";

/// Top-level configuration: transport, collaborators, and the key table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Serial device path. When absent the binary probes for a keypad.
    pub port: Option<PathBuf>,
    /// Time-tracking service settings; required for `Track` bindings.
    pub tracking: Option<TrackingConfig>,
    /// Admin HTTP endpoint settings; the endpoint is disabled when absent.
    pub admin: Option<AdminConfig>,
    /// Key identifier to action descriptor.
    pub keys: BTreeMap<String, ActionDescriptor>,
}

impl Config {
    /// Look up the descriptor bound to `key`.
    pub fn descriptor(&self, key: &str) -> Option<&ActionDescriptor> {
        self.keys.get(key)
    }
}

/// Connection settings for the remote time-tracking service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrackingConfig {
    /// API base URL.
    pub base_url: String,
    /// API token; falls back to `AUXILIUM_TOKEN`.
    pub token: Option<String>,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_TRACKING_URL.to_string(),
            token: None,
        }
    }
}

impl TrackingConfig {
    /// Resolve the token: the configured value, else the environment, else empty.
    pub fn resolved_token(&self) -> String {
        self.token
            .clone()
            .or_else(|| env::var(TOKEN_ENV).ok())
            .unwrap_or_default()
    }
}

/// Settings for the admin HTTP endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AdminConfig {
    /// Socket address to listen on.
    pub listen: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            listen: DEFAULT_ADMIN_LISTEN.to_string(),
        }
    }
}

/// Describes the action bound to one key.
///
/// `kind` selects the variant (`Type`, `Macro`, `Track`, `Pomodoro`,
/// case-insensitive); the remaining fields are variant parameters and
/// default when absent. The kind is kept as a string so that an unknown kind
/// parses and is skipped at construction time rather than failing the load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ActionDescriptor {
    /// Variant name.
    pub kind: String,
    /// Project id (`Track`).
    pub id: u64,
    /// Human-readable label used in notifications (`Track`).
    pub label: String,
    /// Tracking profile (`Track`).
    pub profile: String,
    /// Show command output as a notification (`Macro`).
    pub display_output: bool,
    /// Command arguments (`Type`, `Macro`). For `Macro` the first entry is the program.
    pub args: Vec<String>,
    /// Timer duration in minutes (`Pomodoro`).
    pub duration: u64,
}
