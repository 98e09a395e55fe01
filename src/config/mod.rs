use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::errors::{ExpenseError, Result};
use crate::utils::paths::{self, ensure_dir, write_atomic};

/// Language with an optional region, e.g. `en` or `en-IN`.
static LOCALE_TAG: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[a-z]{2,3}(-[A-Z]{2})?$").ok());

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Display locale handed to presentation layers.
    pub locale: String,
    pub currency: String,
    pub currency_symbol: String,
    /// Budget usage above this share is reported as a warning.
    pub warning_threshold_percent: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locale: "en-IN".into(),
            currency: "INR".into(),
            currency_symbol: "₹".into(),
            warning_threshold_percent: Decimal::from(80),
            data_file: None,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        let locale_ok = LOCALE_TAG
            .as_ref()
            .map_or(true, |pattern| pattern.is_match(&self.locale));
        if !locale_ok {
            return Err(ExpenseError::InvalidInput(format!(
                "locale `{}` must look like `en` or `en-IN`",
                self.locale
            )));
        }
        if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ExpenseError::InvalidInput(format!(
                "currency `{}` must be a three letter code",
                self.currency
            )));
        }
        if self.warning_threshold_percent <= Decimal::ZERO
            || self.warning_threshold_percent > Decimal::ONE_HUNDRED
        {
            return Err(ExpenseError::InvalidInput(
                "warning threshold must be within (0, 100]".into(),
            ));
        }
        Ok(())
    }
}

pub struct ConfigManager {
    base: PathBuf,
    path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self> {
        Self::with_base_dir(paths::app_data_dir())
    }

    pub fn with_base_dir(base: PathBuf) -> Result<Self> {
        ensure_dir(&base)?;
        Ok(Self {
            path: paths::config_file_in(&base),
            base,
        })
    }

    pub fn load(&self) -> Result<Config> {
        if self.path.exists() {
            let data = fs::read_to_string(&self.path)?;
            let config: Config = serde_json::from_str(&data)?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        config.validate()?;
        let json = serde_json::to_string_pretty(config)?;
        write_atomic(&self.path, &json)
    }

    /// Store file named by the config, falling back to `store.json` in the base dir.
    pub fn store_path(&self, config: &Config) -> PathBuf {
        config
            .data_file
            .clone()
            .unwrap_or_else(|| paths::store_file_in(&self.base))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
