//! Configuration module for simulator settings and YAML loading
//!
//! This module provides:
//! - Configuration types (`AppConfig`, `VenueConfig`, `LedgerConfig`, `SchedulerConfig`, `ApiConfig`)
//! - YAML loading functionality (`load_config`)
//! - Environment overrides (`constants`)
//! - Logging setup (`logging`)

pub mod constants;
mod loader;
pub mod logging;
mod types;

// Re-export types
pub use types::{ApiConfig, AppConfig, LedgerConfig, SchedulerConfig, Venue, VenueConfig};

// Re-export loader functions
pub use loader::{load_config, load_config_from_str};
