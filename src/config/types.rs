//! Configuration types for the arbitrage simulator
//!
//! This module defines all configuration structs that are loaded from YAML.
//! Every section has defaults matching the reference deployment, so a config
//! file only needs to list what it changes.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

use crate::error::AppError;

// ============================================================================
// Enums
// ============================================================================

/// Supported venues
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Venue {
    Binance,
    Okx,
    Kraken,
}

impl Venue {
    pub fn as_str(&self) -> &'static str {
        match self {
            Venue::Binance => "binance",
            Venue::Okx => "okx",
            Venue::Kraken => "kraken",
        }
    }
}

impl std::fmt::Display for Venue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// One quote feed and its cost model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VenueConfig {
    pub id: Venue,
    /// Venue-native symbol (e.g. "dogeusdt", "DOGE-USDT", "DOGE/USD")
    pub symbol: String,
    /// Taker fee as a fraction (0.001 = 0.10%)
    pub fee_rate: f64,
    /// Expected slippage as a fraction
    pub slippage_rate: f64,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Endpoint override (testnet, local relay). Defaults to the venue's public URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ws_url: Option<String>,
}

fn default_enabled() -> bool {
    true
}

impl VenueConfig {
    pub fn new(id: Venue, symbol: &str, fee_rate: f64, slippage_rate: f64) -> Self {
        Self {
            id,
            symbol: symbol.to_string(),
            fee_rate,
            slippage_rate,
            enabled: true,
            ws_url: None,
        }
    }

    /// Validate venue configuration rules
    pub fn validate(&self) -> Result<(), AppError> {
        // Rule: symbol cannot be empty
        if self.symbol.trim().is_empty() {
            return Err(AppError::Config(format!(
                "Venue '{}': symbol cannot be empty",
                self.id
            )));
        }

        // Rule: rates are finite fractions in [0, 1)
        for (name, rate) in [("fee_rate", self.fee_rate), ("slippage_rate", self.slippage_rate)] {
            if !rate.is_finite() || !(0.0..1.0).contains(&rate) {
                return Err(AppError::Config(format!(
                    "Venue '{}': {} must be in [0, 1), got {}",
                    self.id, name, rate
                )));
            }
        }

        // Rule: endpoint override must be a WebSocket URL
        if let Some(url) = &self.ws_url {
            if !(url.starts_with("ws://") || url.starts_with("wss://")) {
                return Err(AppError::Config(format!(
                    "Venue '{}': ws_url must start with ws:// or wss://, got '{}'",
                    self.id, url
                )));
            }
        }

        // Rule: combined cost must leave a positive effective sell price
        if self.fee_rate + self.slippage_rate >= 1.0 {
            return Err(AppError::Config(format!(
                "Venue '{}': fee_rate + slippage_rate must be < 1, got {}",
                self.id,
                self.fee_rate + self.slippage_rate
            )));
        }

        Ok(())
    }
}

/// Paper ledger parameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LedgerConfig {
    /// Starting quote-currency balance
    pub initial_balance: f64,
    /// Notional committed per execution
    pub trade_size: f64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            initial_balance: 1000.0,
            trade_size: 100.0,
        }
    }
}

impl LedgerConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        // Rule: initial_balance > 0
        if !self.initial_balance.is_finite() || self.initial_balance <= 0.0 {
            return Err(AppError::Config(format!(
                "Ledger: initial_balance must be > 0, got {}",
                self.initial_balance
            )));
        }

        // Rule: trade_size > 0
        if !self.trade_size.is_finite() || self.trade_size <= 0.0 {
            return Err(AppError::Config(format!(
                "Ledger: trade_size must be > 0, got {}",
                self.trade_size
            )));
        }

        Ok(())
    }
}

/// Scheduler cadence and queue sizing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SchedulerConfig {
    pub scan_interval_ms: u64,
    pub report_interval_ms: u64,
    /// Inbound quote queue capacity
    pub queue_capacity: usize,
    /// Quotes older than this are ignored by the scanner. `None` keeps every quote current.
    pub max_quote_age_ms: Option<u64>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            scan_interval_ms: 100,
            report_interval_ms: 5000,
            queue_capacity: 1000,
            max_quote_age_ms: None,
        }
    }
}

impl SchedulerConfig {
    pub fn scan_interval(&self) -> Duration {
        Duration::from_millis(self.scan_interval_ms)
    }

    pub fn report_interval(&self) -> Duration {
        Duration::from_millis(self.report_interval_ms)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        // Rule: intervals > 0 (tokio intervals panic on zero period)
        if self.scan_interval_ms == 0 || self.report_interval_ms == 0 {
            return Err(AppError::Config(format!(
                "Scheduler: intervals must be > 0 (scan={}ms, report={}ms)",
                self.scan_interval_ms, self.report_interval_ms
            )));
        }

        // Rule: queue_capacity > 0 (mpsc::channel panics on zero)
        if self.queue_capacity == 0 {
            return Err(AppError::Config(
                "Scheduler: queue_capacity must be > 0".to_string(),
            ));
        }

        if self.max_quote_age_ms == Some(0) {
            return Err(AppError::Config(
                "Scheduler: max_quote_age_ms must be > 0 when set".to_string(),
            ));
        }

        Ok(())
    }
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    pub enabled: bool,
    /// HTTP server port
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 8080,
        }
    }
}

/// Root application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    /// Logical instrument label, used in logs only
    pub instrument: String,
    pub venues: Vec<VenueConfig>,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            instrument: "DOGE/USDT".to_string(),
            venues: vec![
                VenueConfig::new(Venue::Binance, "dogeusdt", 0.0010, 0.0002),
                VenueConfig::new(Venue::Okx, "DOGE-USDT", 0.0010, 0.0002),
                VenueConfig::new(Venue::Kraken, "DOGE/USD", 0.0026, 0.0002),
            ],
            ledger: LedgerConfig::default(),
            scheduler: SchedulerConfig::default(),
            api: ApiConfig::default(),
        }
    }
}

impl AppConfig {
    /// Validate all configuration rules
    pub fn validate(&self) -> Result<(), AppError> {
        // Rule: at least one enabled venue
        if !self.venues.iter().any(|v| v.enabled) {
            return Err(AppError::Config(
                "Configuration must contain at least one enabled venue".to_string(),
            ));
        }

        // Rule: venue ids are unique
        let mut seen = HashSet::new();
        for venue in &self.venues {
            if !seen.insert(venue.id) {
                return Err(AppError::Config(format!(
                    "Duplicate venue: {}",
                    venue.id
                )));
            }
            venue.validate()?;
        }

        self.ledger.validate()?;
        self.scheduler.validate()?;

        // Rule: port 0 would bind an ephemeral port nobody can find
        if self.api.enabled && self.api.port == 0 {
            return Err(AppError::Config("API: port cannot be 0".to_string()));
        }

        Ok(())
    }

    pub fn enabled_venues(&self) -> impl Iterator<Item = &VenueConfig> {
        self.venues.iter().filter(|v| v.enabled)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.venues.len(), 3);
        assert_eq!(config.ledger.initial_balance, 1000.0);
        assert_eq!(config.ledger.trade_size, 100.0);
        assert_eq!(config.scheduler.queue_capacity, 1000);
        assert_eq!(config.api.port, 8080);
    }

    #[test]
    fn test_empty_venues_fails() {
        let mut config = AppConfig::default();
        config.venues.clear();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("at least one enabled venue"));
    }

    #[test]
    fn test_all_venues_disabled_fails() {
        let mut config = AppConfig::default();
        for venue in &mut config.venues {
            venue.enabled = false;
        }
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duplicate_venue_fails() {
        let mut config = AppConfig::default();
        config
            .venues
            .push(VenueConfig::new(Venue::Binance, "dogeusdt", 0.001, 0.0002));
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Duplicate venue: binance"));
    }

    #[test]
    fn test_empty_symbol_fails() {
        let venue = VenueConfig::new(Venue::Okx, "  ", 0.001, 0.0002);
        let result = venue.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("symbol cannot be empty"));
    }

    #[test]
    fn test_negative_fee_fails() {
        let venue = VenueConfig::new(Venue::Okx, "DOGE-USDT", -0.001, 0.0002);
        assert!(venue.validate().unwrap_err().to_string().contains("fee_rate"));
    }

    #[test]
    fn test_nan_slippage_fails() {
        let venue = VenueConfig::new(Venue::Kraken, "DOGE/USD", 0.0026, f64::NAN);
        assert!(venue.validate().unwrap_err().to_string().contains("slippage_rate"));
    }

    #[test]
    fn test_combined_cost_at_one_fails() {
        let venue = VenueConfig::new(Venue::Kraken, "DOGE/USD", 0.6, 0.4);
        assert!(venue.validate().unwrap_err().to_string().contains("must be < 1"));
    }

    #[test]
    fn test_zero_trade_size_fails() {
        let mut config = AppConfig::default();
        config.ledger.trade_size = 0.0;
        assert!(config.validate().unwrap_err().to_string().contains("trade_size"));
    }

    #[test]
    fn test_zero_initial_balance_fails() {
        let mut config = AppConfig::default();
        config.ledger.initial_balance = 0.0;
        assert!(config.validate().unwrap_err().to_string().contains("initial_balance"));
    }

    #[test]
    fn test_zero_scan_interval_fails() {
        let mut config = AppConfig::default();
        config.scheduler.scan_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_queue_capacity_fails() {
        let mut config = AppConfig::default();
        config.scheduler.queue_capacity = 0;
        assert!(config.validate().unwrap_err().to_string().contains("queue_capacity"));
    }

    #[test]
    fn test_zero_max_quote_age_fails() {
        let mut config = AppConfig::default();
        config.scheduler.max_quote_age_ms = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_port_fails_only_when_enabled() {
        let mut config = AppConfig::default();
        config.api.port = 0;
        assert!(config.validate().is_err());
        config.api.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_venue_serde_lowercase() {
        let json = serde_json::to_string(&Venue::Okx).unwrap();
        assert_eq!(json, "\"okx\"");
        let parsed: Venue = serde_yaml::from_str("kraken").unwrap();
        assert_eq!(parsed, Venue::Kraken);
    }

    #[test]
    fn test_ws_url_override() {
        let yaml = r#"
id: okx
symbol: DOGE-USDT
fee_rate: 0.001
slippage_rate: 0.0002
ws_url: wss://wspap.okx.com:8443/ws/v5/public
"#;
        let venue: VenueConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            venue.ws_url.as_deref(),
            Some("wss://wspap.okx.com:8443/ws/v5/public")
        );
        assert!(venue.validate().is_ok());

        let mut bad = venue.clone();
        bad.ws_url = Some("https://ws.okx.com".to_string());
        assert!(bad.validate().unwrap_err().to_string().contains("ws_url"));

        assert_eq!(VenueConfig::new(Venue::Okx, "DOGE-USDT", 0.001, 0.0).ws_url, None);
    }

    #[test]
    fn test_venue_display() {
        assert_eq!(Venue::Binance.to_string(), "binance");
        assert_eq!(Venue::Okx.to_string(), "okx");
        assert_eq!(Venue::Kraken.to_string(), "kraken");
    }

    #[test]
    fn test_sections_default_when_omitted() {
        let yaml = r#"
instrument: DOGE/USDT
venues:
  - id: binance
    symbol: dogeusdt
    fee_rate: 0.001
    slippage_rate: 0.0002
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.venues[0].enabled);
        assert_eq!(config.ledger, LedgerConfig::default());
        assert_eq!(config.scheduler, SchedulerConfig::default());
        assert_eq!(config.api, ApiConfig::default());
    }

    #[test]
    fn test_enabled_venues_skips_disabled() {
        let mut config = AppConfig::default();
        config.venues[1].enabled = false;
        let ids: Vec<Venue> = config.enabled_venues().map(|v| v.id).collect();
        assert_eq!(ids, vec![Venue::Binance, Venue::Kraken]);
    }

    #[test]
    fn test_scheduler_durations() {
        let scheduler = SchedulerConfig::default();
        assert_eq!(scheduler.scan_interval(), Duration::from_millis(100));
        assert_eq!(scheduler.report_interval(), Duration::from_secs(5));
    }
}
