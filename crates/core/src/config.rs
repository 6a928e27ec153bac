use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::error::ConfigError;
use super::money::Money;
use super::period::GivingYear;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileConfig {
    pub thresholds: Thresholds,
    #[serde(default)]
    pub years: Option<YearRange>,
    #[serde(default)]
    pub sponsorship: SponsorshipConfig,
}

/// Follow-up thresholds. Both are required in a config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    pub thank_you: Money,
    pub project: Money,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            thank_you: Money::from_cents(10_000),
            project: Money::from_cents(100_000),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub first: i32,
    pub last: i32,
}

impl YearRange {
    pub fn years(self) -> Vec<GivingYear> {
        GivingYear::span(GivingYear(self.first), GivingYear(self.last))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SponsorshipConfig {
    pub cutoff_month: u32,
    pub cutoff_day: u32,
}

impl Default for SponsorshipConfig {
    fn default() -> Self {
        Self {
            cutoff_month: 5,
            cutoff_day: 8,
        }
    }
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            years: None,
            sponsorship: SponsorshipConfig::default(),
        }
    }
}

impl ReconcileConfig {
    pub fn from_toml(toml_content: &str) -> Result<Self, ConfigError> {
        let config: ReconcileConfig =
            toml::from_str(toml_content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("thank_you", self.thresholds.thank_you),
            ("project", self.thresholds.project),
        ] {
            if !value.is_positive() {
                return Err(ConfigError::NonPositiveThreshold { name, value });
            }
        }

        if let Some(range) = self.years {
            if range.first > range.last {
                return Err(ConfigError::InvertedYears {
                    first: range.first,
                    last: range.last,
                });
            }
        }

        let SponsorshipConfig {
            cutoff_month,
            cutoff_day,
        } = self.sponsorship;
        // 2000 is a leap year, so Feb 29 is accepted.
        if NaiveDate::from_ymd_opt(2000, cutoff_month, cutoff_day).is_none() {
            return Err(ConfigError::InvalidCutoff {
                month: cutoff_month,
                day: cutoff_day,
            });
        }

        Ok(())
    }
}
