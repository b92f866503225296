use crate::domain::{AccountId, Decimal};
use crate::engine::{BuyPriceOverrides, TaxPolicy};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub operations_path: String,
    pub reference_path: String,
    pub account_id: AccountId,
    /// Reports are computed as of this instant; `None` means now.
    pub valuation_date: Option<DateTime<Utc>>,
    pub report_mode: ReportMode,
    pub tax_policy: TaxPolicy,
    pub snapshot_lookback_days: u32,
    pub buy_price_overrides: BuyPriceOverrides,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportMode {
    /// One row per open lot.
    Lots,
    /// One row per ticker cohort.
    General,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let operations_path = env_map
            .get("OPERATIONS_PATH")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("OPERATIONS_PATH".to_string()))?;

        let reference_path = env_map
            .get("REFERENCE_PATH")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("REFERENCE_PATH".to_string()))?;

        let account_id = AccountId::new(
            env_map
                .get("ACCOUNT_ID")
                .map(|s| s.as_str())
                .unwrap_or("default"),
        );

        let valuation_date = env_map
            .get("VALUATION_DATE")
            .map(|s| {
                DateTime::parse_from_rfc3339(s)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|_| {
                        ConfigError::InvalidValue(
                            "VALUATION_DATE".to_string(),
                            "must be an RFC 3339 timestamp".to_string(),
                        )
                    })
            })
            .transpose()?;

        let report_mode = match env_map
            .get("REPORT_MODE")
            .map(|s| s.as_str())
            .unwrap_or("general")
        {
            "lots" => ReportMode::Lots,
            "general" => ReportMode::General,
            other => {
                return Err(ConfigError::InvalidValue(
                    "REPORT_MODE".to_string(),
                    format!("must be lots or general, got {}", other),
                ))
            }
        };

        let defaults = TaxPolicy::default();
        let rate = match env_map.get("TAX_RATE") {
            Some(s) => Decimal::from_str_canonical(s).map_err(|_| {
                ConfigError::InvalidValue("TAX_RATE".to_string(), "must be a decimal".to_string())
            })?,
            None => defaults.rate,
        };
        if rate.is_negative() || rate > Decimal::one() {
            return Err(ConfigError::InvalidValue(
                "TAX_RATE".to_string(),
                "must be between 0 and 1".to_string(),
            ));
        }

        let exemption_hours = env_map
            .get("TAX_EXEMPTION_HOURS")
            .map(|s| s.parse::<i64>())
            .transpose()
            .map_err(|_| {
                ConfigError::InvalidValue(
                    "TAX_EXEMPTION_HOURS".to_string(),
                    "must be a valid i64".to_string(),
                )
            })?
            .unwrap_or(defaults.exemption_hours);

        let snapshot_lookback_days = env_map
            .get("SNAPSHOT_LOOKBACK_DAYS")
            .map(|s| s.as_str())
            .unwrap_or("10")
            .parse::<u32>()
            .map_err(|_| {
                ConfigError::InvalidValue(
                    "SNAPSHOT_LOOKBACK_DAYS".to_string(),
                    "must be a valid u32".to_string(),
                )
            })?;

        let buy_price_overrides = env_map
            .get("BUY_PRICE_OVERRIDES")
            .map(|s| BuyPriceOverrides::parse(s))
            .transpose()
            .map_err(|e| ConfigError::InvalidValue("BUY_PRICE_OVERRIDES".to_string(), e))?
            .unwrap_or_default();

        Ok(Config {
            operations_path,
            reference_path,
            account_id,
            valuation_date,
            report_mode,
            tax_policy: TaxPolicy {
                rate,
                exemption_hours,
            },
            snapshot_lookback_days,
            buy_price_overrides,
        })
    }
}
