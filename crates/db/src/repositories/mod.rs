pub mod catalog;
pub mod exchange_rate;
pub mod quotation;

use std::str::FromStr;

use chrono::{DateTime, Utc};
use cotiza_core::StoreError;
use rust_decimal::Decimal;

pub use catalog::SqlCatalogStore;
pub use exchange_rate::SqlExchangeRateStore;
pub use quotation::SqlQuotationStore;

pub(crate) fn db_error(error: sqlx::Error) -> StoreError {
    StoreError::Backend(format!("database error: {error}"))
}

pub(crate) fn parse_money(
    field: &str,
    value: Option<String>,
) -> Result<Option<Decimal>, StoreError> {
    value
        .map(|raw| {
            Decimal::from_str(&raw).map_err(|error| {
                StoreError::Backend(format!("invalid decimal value for {field}: {error}"))
            })
        })
        .transpose()
}

pub(crate) fn require_money(field: &str, value: String) -> Result<Decimal, StoreError> {
    Decimal::from_str(&value).map_err(|error| {
        StoreError::Backend(format!("invalid decimal value for {field}: {error}"))
    })
}

pub(crate) fn parse_timestamp(field: &str, value: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|error| StoreError::Backend(format!("invalid timestamp for {field}: {error}")))
}
