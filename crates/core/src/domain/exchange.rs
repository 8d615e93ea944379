use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Where a recorded USD to ARS rate came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateSource {
    Manual,
    Scraped,
}

impl fmt::Display for RateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Manual => f.write_str("manual"),
            Self::Scraped => f.write_str("scraped"),
        }
    }
}

impl FromStr for RateSource {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "manual" => Ok(Self::Manual),
            "scraped" => Ok(Self::Scraped),
            other => Err(DomainError::InvariantViolation(format!(
                "unsupported rate source `{other}` (expected manual|scraped)"
            ))),
        }
    }
}

/// One entry of the append-only USD to ARS rate log. The authoritative
/// rate is the latest by `fetched_at`; older rows are history.
///
/// Rates are stored for display only. The pricing engine does not convert
/// between currencies.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRate {
    pub id: i64,
    pub rate: Decimal,
    pub source: RateSource,
    pub fetched_at: DateTime<Utc>,
}

impl ExchangeRate {
    pub fn validate_rate(rate: Decimal) -> Result<(), DomainError> {
        if rate <= Decimal::ZERO {
            return Err(DomainError::NonPositiveRate(rate));
        }
        Ok(())
    }
}
