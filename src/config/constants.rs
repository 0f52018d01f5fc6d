//! Runtime defaults with environment variable overrides
//!
//! Values here sit outside the YAML file because they select or patch the
//! file itself, or are tuned per host.

use std::path::PathBuf;

use super::types::AppConfig;

// =============================================================================
// Config Location
// =============================================================================

/// Path of the YAML config (default: `config.yaml`)
///
/// Environment variable: `CONFIG_PATH`
pub fn config_path() -> PathBuf {
    std::env::var("CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.yaml"))
}

// =============================================================================
// API
// =============================================================================

/// Port override for the monitoring API
///
/// Environment variable: `API_PORT`. Unset or unparsable leaves the
/// configured port in place.
pub fn api_port_override() -> Option<u16> {
    std::env::var("API_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .filter(|port| *port != 0)
}

/// Apply all environment overrides to a loaded config
pub fn apply_env_overrides(config: &mut AppConfig) {
    if let Some(port) = api_port_override() {
        config.api.port = port;
    }
}

// =============================================================================
// Feed Reconnection
// =============================================================================

/// Maximum consecutive failed connects before a feed gives up (default: 10)
///
/// Environment variable: `FEED_MAX_RECONNECTS`
pub fn feed_max_reconnects() -> u32 {
    std::env::var("FEED_MAX_RECONNECTS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(10)
}
