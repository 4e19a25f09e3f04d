//! Configuration for the conversion run.
//!
//! Every setting has a built-in default, so no configuration file is required. When one is given
//! with `--config` (or `KOINLY_CONFIG`), it is a JSON file whose fields override the defaults:
//!
//! ```json
//! {
//!   "app_name": "koinly",
//!   "config_version": 1,
//!   "base_fiat": "CHF",
//!   "success_statuses": ["Completed", "Erfolgreich"]
//! }
//! ```

use crate::{utils, Result};
use anyhow::{bail, ensure, Context};
use serde::{Deserialize, Serialize};
use std::path::Path;

const APP_NAME: &str = "koinly";
const CONFIG_VERSION: u8 = 1;
const BASE_FIAT: &str = "EUR";
const NATIVE_CURRENCY: &str = "XTZ";
const NATIVE_DECIMALS: u32 = 18;
const LENDING_PREFIX: &str = "sl";
const SUCCESS_STATUSES: &[&str] = &[
    "Completed",
    "Success",
    "Successful",
    "Terminé",
    "Réussi",
    "Effectué",
];
const BUY_SIDES: &[&str] = &["BUY", "ACHAT", "ACHETER"];
const SELL_SIDES: &[&str] = &["SELL", "VENTE", "VENDRE"];

/// The direction of an exchange trade, as decoded from a localized side column.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Buy,
    Sell,
}

/// The `Config` object holds the settings that adapters and the consolidation engine need. These
/// are fixed for the duration of a run.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct Config {
    config_file: ConfigFile,
}

impl Config {
    /// Loads the configuration file at `path`, or returns the defaults when `path` is `None`.
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        if !path.is_file() {
            bail!("The config file is missing '{}'", path.display())
        }
        let config_file = ConfigFile::load(path).await?;
        Ok(Self { config_file })
    }

    /// The fiat currency used to label pure fiat-in/fiat-out movements, and the currency of card
    /// statements.
    pub fn base_fiat(&self) -> &str {
        &self.config_file.base_fiat
    }

    /// The ticker of the chain's native asset.
    pub fn native_currency(&self) -> &str {
        &self.config_file.native_currency
    }

    /// The number of decimal places of the chain's native asset.
    pub fn native_decimals(&self) -> u32 {
        self.config_file.native_decimals
    }

    /// The prefix the lending protocol prepends to the tickers of its receipt tokens.
    pub fn lending_prefix(&self) -> &str {
        &self.config_file.lending_prefix
    }

    /// True if `status` is one of the (localized) success statuses. Case-insensitive.
    pub fn is_success(&self, status: &str) -> bool {
        contains_ignore_case(&self.config_file.success_statuses, status)
    }

    /// Decodes a (localized) trade side. Case-insensitive.
    pub fn side(&self, side: &str) -> Option<Side> {
        if contains_ignore_case(&self.config_file.buy_sides, side) {
            Some(Side::Buy)
        } else if contains_ignore_case(&self.config_file.sell_sides, side) {
            Some(Side::Sell)
        } else {
            None
        }
    }
}

fn contains_ignore_case(values: &[String], needle: &str) -> bool {
    let needle = needle.trim().to_lowercase();
    values.iter().any(|v| v.to_lowercase() == needle)
}

/// Represents the serialization and deserialization format of the configuration file. Missing
/// fields take their default values.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
#[serde(default)]
struct ConfigFile {
    /// Application name, should always be "koinly"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// The base fiat currency, e.g. "EUR"
    base_fiat: String,

    /// The native currency of the chain whose exports are consolidated, e.g. "XTZ"
    native_currency: String,

    /// Decimal places of raw native amounts
    native_decimals: u32,

    /// Ticker prefix of lending receipt tokens, e.g. "sl" for "slUSDC"
    lending_prefix: String,

    /// Status strings that mean success in localized exchange exports
    success_statuses: Vec<String>,

    /// Side strings that mean "buy" in localized trade exports
    buy_sides: Vec<String>,

    /// Side strings that mean "sell" in localized trade exports
    sell_sides: Vec<String>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            base_fiat: BASE_FIAT.to_string(),
            native_currency: NATIVE_CURRENCY.to_string(),
            native_decimals: NATIVE_DECIMALS,
            lending_prefix: LENDING_PREFIX.to_string(),
            success_statuses: strings(SUCCESS_STATUSES),
            buy_sides: strings(BUY_SIDES),
            sell_sides: strings(SELL_SIDES),
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed
    async fn load(path: &Path) -> Result<Self> {
        let config: ConfigFile = utils::deserialize(path)
            .await
            .with_context(|| format!("Failed to load config file at {}", path.display()))?;

        ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        ensure!(
            config.config_version == CONFIG_VERSION,
            "Unsupported config_version {}, expected {}",
            config.config_version,
            CONFIG_VERSION
        );

        Ok(config)
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}
