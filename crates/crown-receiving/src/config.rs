//! # Receiving Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     CROWN_DEFAULT_GST_RATE=18                                          │
//! │     CROWN_RECEIPT_PREFIX=GRN                                           │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/crown-pos/receiving.toml (Linux)                         │
//! │     ~/Library/Application Support/com.crown.pos/receiving.toml (macOS) │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     17% GST exclusive, 2 price decimals, 3 save attempts               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # receiving.toml
//! [costing]
//! default_gst_rate = "17"
//! default_tax_convention = "exclusive"
//! price_decimals = 2
//!
//! [receipt]
//! number_prefix = "GRN"
//! withholding_tax_rate = "0"
//! save_attempts = 3
//!
//! [ordering]
//! cover_days = 7
//! ```

use crown_core::validation::{validate_gst_rate, validate_receipt_number, validate_withholding_rate};
use crown_core::{TaxConvention, DEFAULT_GST_RATE};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{ReceivingError, ReceivingResult};

/// Most decimal places a persisted price may carry.
const MAX_PRICE_DECIMALS: u32 = 6;

// =============================================================================
// Costing Settings
// =============================================================================

/// Defaults for lines whose product master carries no tax setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostingSettings {
    /// GST percent used for new lines and for below-trade retail overrides.
    #[serde(default = "default_gst_rate")]
    pub default_gst_rate: Decimal,

    #[serde(default)]
    pub default_tax_convention: TaxConvention,

    /// Decimal places kept on persisted prices.
    #[serde(default = "default_price_decimals")]
    pub price_decimals: u32,
}

fn default_gst_rate() -> Decimal {
    DEFAULT_GST_RATE
}

fn default_price_decimals() -> u32 {
    2
}

impl Default for CostingSettings {
    fn default() -> Self {
        CostingSettings {
            default_gst_rate: default_gst_rate(),
            default_tax_convention: TaxConvention::default(),
            price_decimals: default_price_decimals(),
        }
    }
}

// =============================================================================
// Receipt Settings
// =============================================================================

/// Receipt numbering, withholding and save behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptSettings {
    /// Prefix of generated receipt numbers (`GRN-20250115-3F9A1C`).
    #[serde(default = "default_number_prefix")]
    pub number_prefix: String,

    /// Withholding percent applied to new receipts.
    #[serde(default)]
    pub withholding_tax_rate: Decimal,

    /// Commit attempts before a save is aborted. Only retryable sink
    /// failures use more than one.
    #[serde(default = "default_save_attempts")]
    pub save_attempts: u32,

    /// Symbol used when amounts are written to the log.
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
}

fn default_number_prefix() -> String {
    "GRN".to_string()
}

fn default_save_attempts() -> u32 {
    3
}

fn default_currency_symbol() -> String {
    "Rs.".to_string()
}

impl Default for ReceiptSettings {
    fn default() -> Self {
        ReceiptSettings {
            number_prefix: default_number_prefix(),
            withholding_tax_rate: Decimal::ZERO,
            save_attempts: default_save_attempts(),
            currency_symbol: default_currency_symbol(),
        }
    }
}

// =============================================================================
// Ordering Settings
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderingSettings {
    /// Days of demand an order should cover beyond the supplier lead time.
    #[serde(default = "default_cover_days")]
    pub cover_days: u32,
}

fn default_cover_days() -> u32 {
    7
}

impl Default for OrderingSettings {
    fn default() -> Self {
        OrderingSettings {
            cover_days: default_cover_days(),
        }
    }
}

// =============================================================================
// Main Receiving Configuration
// =============================================================================

/// Complete receiving configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReceivingConfig {
    #[serde(default)]
    pub costing: CostingSettings,

    #[serde(default)]
    pub receipt: ReceiptSettings,

    #[serde(default)]
    pub ordering: OrderingSettings,
}

impl ReceivingConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (receiving.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ReceivingResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading receiving config from file");
                config = Self::from_file(&path)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load receiving config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Parses a config file without applying environment overrides.
    pub fn from_file(path: &Path) -> ReceivingResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> ReceivingResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ReceivingError::InvalidConfig("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Receiving config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ReceivingResult<()> {
        validate_gst_rate(self.costing.default_gst_rate)
            .map_err(|e| ReceivingError::InvalidConfig(format!("costing.default_gst_rate: {}", e)))?;

        if self.costing.price_decimals > MAX_PRICE_DECIMALS {
            return Err(ReceivingError::InvalidConfig(format!(
                "costing.price_decimals must be at most {}, got {}",
                MAX_PRICE_DECIMALS, self.costing.price_decimals
            )));
        }

        validate_withholding_rate(self.receipt.withholding_tax_rate).map_err(|e| {
            ReceivingError::InvalidConfig(format!("receipt.withholding_tax_rate: {}", e))
        })?;

        // The prefix ends up inside every receipt number
        validate_receipt_number(&self.receipt.number_prefix)
            .map_err(|e| ReceivingError::InvalidConfig(format!("receipt.number_prefix: {}", e)))?;

        if self.receipt.save_attempts == 0 {
            return Err(ReceivingError::InvalidConfig(
                "receipt.save_attempts must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies `CROWN_*` environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from any key lookup. Unparseable values are logged
    /// and skipped.
    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(rate) = lookup("CROWN_DEFAULT_GST_RATE") {
            match rate.trim().parse::<Decimal>() {
                Ok(r) => {
                    debug!(gst_rate = %r, "Overriding default GST rate from environment");
                    self.costing.default_gst_rate = r;
                }
                Err(_) => warn!(value = %rate, "Invalid CROWN_DEFAULT_GST_RATE in environment"),
            }
        }

        if let Some(convention) = lookup("CROWN_TAX_CONVENTION") {
            match convention.parse::<TaxConvention>() {
                Ok(c) => {
                    debug!(convention = %c, "Overriding tax convention from environment");
                    self.costing.default_tax_convention = c;
                }
                Err(_) => warn!(value = %convention, "Unknown tax convention in environment"),
            }
        }

        if let Some(rate) = lookup("CROWN_WITHHOLDING_RATE") {
            match rate.trim().parse::<Decimal>() {
                Ok(r) => self.receipt.withholding_tax_rate = r,
                Err(_) => warn!(value = %rate, "Invalid CROWN_WITHHOLDING_RATE in environment"),
            }
        }

        if let Some(prefix) = lookup("CROWN_RECEIPT_PREFIX") {
            debug!(prefix = %prefix, "Overriding receipt prefix from environment");
            self.receipt.number_prefix = prefix;
        }

        if let Some(attempts) = lookup("CROWN_SAVE_ATTEMPTS") {
            match attempts.trim().parse::<u32>() {
                Ok(n) => self.receipt.save_attempts = n,
                Err(_) => warn!(value = %attempts, "Invalid CROWN_SAVE_ATTEMPTS in environment"),
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "crown", "pos")
            .map(|dirs| dirs.config_dir().join("receiving.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ReceivingConfig::default();
        assert_eq!(config.costing.default_gst_rate, dec!(17));
        assert_eq!(config.costing.default_tax_convention, TaxConvention::Exclusive);
        assert_eq!(config.costing.price_decimals, 2);
        assert_eq!(config.receipt.number_prefix, "GRN");
        assert_eq!(config.receipt.save_attempts, 3);
        assert_eq!(config.ordering.cover_days, 7);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_file() {
        let config: ReceivingConfig = toml::from_str(
            r#"
            [costing]
            default_gst_rate = "18"
            default_tax_convention = "inclusive"

            [receipt]
            withholding_tax_rate = "4.5"
            "#,
        )
        .unwrap();

        assert_eq!(config.costing.default_gst_rate, dec!(18));
        assert_eq!(config.costing.default_tax_convention, TaxConvention::Inclusive);
        assert_eq!(config.costing.price_decimals, 2);
        assert_eq!(config.receipt.withholding_tax_rate, dec!(4.5));
        assert_eq!(config.receipt.number_prefix, "GRN");
        assert_eq!(config.receipt.currency_symbol, "Rs.");
        assert_eq!(config.ordering.cover_days, 7);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = ReceivingConfig::default();
        config.apply_overrides(lookup_from(&[
            ("CROWN_DEFAULT_GST_RATE", "5"),
            ("CROWN_TAX_CONVENTION", "in_retail"),
            ("CROWN_WITHHOLDING_RATE", "1.5"),
            ("CROWN_RECEIPT_PREFIX", "RCV"),
            ("CROWN_SAVE_ATTEMPTS", "5"),
        ]));

        assert_eq!(config.costing.default_gst_rate, dec!(5));
        assert_eq!(config.costing.default_tax_convention, TaxConvention::Inclusive);
        assert_eq!(config.receipt.withholding_tax_rate, dec!(1.5));
        assert_eq!(config.receipt.number_prefix, "RCV");
        assert_eq!(config.receipt.save_attempts, 5);
    }

    #[test]
    fn test_invalid_env_values_are_skipped() {
        let mut config = ReceivingConfig::default();
        config.apply_overrides(lookup_from(&[
            ("CROWN_DEFAULT_GST_RATE", "seventeen"),
            ("CROWN_TAX_CONVENTION", "sideways"),
            ("CROWN_SAVE_ATTEMPTS", "-1"),
        ]));

        assert_eq!(config, ReceivingConfig::default());
    }

    #[test]
    fn test_unparseable_save_attempts_keep_file_value() {
        let mut config = ReceivingConfig::default();
        config.receipt.save_attempts = 7;

        for raw in ["three", "", "4294967296", "2.5"] {
            config.apply_overrides(lookup_from(&[("CROWN_SAVE_ATTEMPTS", raw)]));
            assert_eq!(config.receipt.save_attempts, 7, "value {:?}", raw);
        }

        config.apply_overrides(lookup_from(&[("CROWN_SAVE_ATTEMPTS", " 4 ")]));
        assert_eq!(config.receipt.save_attempts, 4);
    }

    #[test]
    fn test_config_validation() {
        let mut config = ReceivingConfig::default();

        config.costing.default_gst_rate = dec!(1000.01);
        assert!(config.validate().is_err());
        config.costing.default_gst_rate = dec!(17);

        config.costing.price_decimals = 7;
        assert!(config.validate().is_err());
        config.costing.price_decimals = 2;

        config.receipt.withholding_tax_rate = dec!(-1);
        assert!(config.validate().is_err());
        config.receipt.withholding_tax_rate = dec!(0);

        config.receipt.number_prefix = "GR N".to_string();
        assert!(config.validate().is_err());
        config.receipt.number_prefix = "GRN".to_string();

        config.receipt.save_attempts = 0;
        assert!(config.validate().is_err());
        config.receipt.save_attempts = 1;

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_save_and_reload() {
        let path = std::env::temp_dir()
            .join(format!("crown-receiving-{}", uuid::Uuid::new_v4()))
            .join("receiving.toml");

        let mut config = ReceivingConfig::default();
        config.costing.default_gst_rate = dec!(16);
        config.receipt.number_prefix = "RCV".to_string();
        config.save(Some(path.clone())).unwrap();

        let loaded = ReceivingConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_toml_serialization() {
        let toml_str = toml::to_string_pretty(&ReceivingConfig::default()).unwrap();
        assert!(toml_str.contains("[costing]"));
        assert!(toml_str.contains("[receipt]"));
        assert!(toml_str.contains("[ordering]"));
        assert!(toml_str.contains("default_tax_convention = \"exclusive\""));
    }
}
