//! Application Configuration
//!
//! User settings and preferences stored in TOML format.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Odometer scan settings
    pub scan: ScanSettings,
    /// Ledger settings
    pub ledger: LedgerSettings,
}

/// Scan-related settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSettings {
    /// Language tag passed to the recognition engine (e.g. "eng")
    pub language: String,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
        }
    }
}

/// Ledger-related settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerSettings {
    /// Known drivers, in display order
    pub drivers: Vec<String>,
    /// Vehicle consumption in kilometers per liter
    pub km_per_liter: f64,
    /// Fuel price per liter used before any purchase is recorded (EUR)
    pub default_fuel_price: f64,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            drivers: Vec::new(),
            km_per_liter: 19.0,
            default_fuel_price: 1.90,
        }
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: AppConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}
