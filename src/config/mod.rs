use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::analysis::windows::Frequency;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub date: String,
    pub market_return: String,
    pub risk_free_rate: String,
    pub futures_close: String,
    pub fund_code: String,
    pub cumulative_nav: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            date: "date".to_string(),
            market_return: "market_return".to_string(),
            risk_free_rate: "risk_free_rate".to_string(),
            futures_close: "futures_close".to_string(),
            fund_code: "fund_code".to_string(),
            cumulative_nav: "cumulative_nav".to_string(),
        }
    }
}

/// Locations of the two exported sheets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub market_path: PathBuf,
    pub fund_path: PathBuf,
    pub columns: ColumnNames,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            market_path: PathBuf::from("data/market.csv"),
            fund_path: PathBuf::from("data/fund.csv"),
            columns: ColumnNames::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    pub fund_code: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub frequency: Frequency,
    pub trading_days_per_year: u32,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            fund_code: "5827".to_string(),
            start_date: NaiveDate::from_ymd_opt(2023, 12, 31).unwrap_or_default(),
            end_date: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap_or_default(),
            frequency: Frequency::Quarterly,
            trading_days_per_year: 252,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HedgeSettings {
    /// Index points per futures contract
    pub contract_multiplier: f64,
    /// One exposure per window, in window order
    pub exposure_notionals: Vec<f64>,
}

impl Default for HedgeSettings {
    fn default() -> Self {
        Self {
            contract_multiplier: 300.0,
            exposure_notionals: vec![
                41_144_000_000.0,
                39_036_000_000.0,
                43_835_000_000.0,
                37_498_000_000.0,
            ],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data: DataSettings,
    pub analysis: AnalysisSettings,
    pub hedge: HedgeSettings,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.analysis.end_date < self.analysis.start_date {
            return Err(ConfigError::Invalid(format!(
                "end_date {} is before start_date {}",
                self.analysis.end_date, self.analysis.start_date
            )));
        }
        if self.analysis.trading_days_per_year == 0 {
            return Err(ConfigError::Invalid(
                "trading_days_per_year must be positive".to_string(),
            ));
        }
        let multiplier = self.hedge.contract_multiplier;
        if !multiplier.is_finite() || multiplier <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "contract_multiplier must be positive, got {}",
                multiplier
            )));
        }
        if let Some((i, notional)) = self
            .hedge
            .exposure_notionals
            .iter()
            .enumerate()
            .find(|(_, n)| !n.is_finite() || **n <= 0.0)
        {
            return Err(ConfigError::Invalid(format!(
                "exposure_notionals[{}] must be positive, got {}",
                i, notional
            )));
        }
        Ok(())
    }
}
