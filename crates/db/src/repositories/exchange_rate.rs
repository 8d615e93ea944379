use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{sqlite::SqliteRow, Row};

use cotiza_core::{ExchangeRate, ExchangeRateStore, RateSource, StoreError};

use super::{db_error, parse_timestamp, require_money};
use crate::DbPool;

/// Append-only USD to ARS rate log. The current rate is the newest row by
/// `fetched_at`; earlier rows are retained as history.
pub struct SqlExchangeRateStore {
    pool: DbPool,
}

impl SqlExchangeRateStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn rate_from_row(row: &SqliteRow) -> Result<ExchangeRate, StoreError> {
        let source_raw: String = row.try_get("source").map_err(db_error)?;
        let fetched_at: String = row.try_get("fetched_at").map_err(db_error)?;

        Ok(ExchangeRate {
            id: row.try_get("id").map_err(db_error)?,
            rate: require_money("exchange_rate.rate", row.try_get("rate").map_err(db_error)?)?,
            source: source_raw
                .parse::<RateSource>()
                .map_err(|error| StoreError::Backend(error.to_string()))?,
            fetched_at: parse_timestamp("exchange_rate.fetched_at", &fetched_at)?,
        })
    }
}

#[async_trait]
impl ExchangeRateStore for SqlExchangeRateStore {
    async fn current(&self) -> Result<Option<ExchangeRate>, StoreError> {
        let row = sqlx::query(
            "SELECT id, rate, source, fetched_at FROM exchange_rate
             ORDER BY fetched_at DESC, id DESC
             LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;
        row.as_ref().map(Self::rate_from_row).transpose()
    }

    async fn record(&self, rate: Decimal, source: RateSource) -> Result<ExchangeRate, StoreError> {
        ExchangeRate::validate_rate(rate)
            .map_err(|error| StoreError::Validation(error.to_string()))?;

        let result = sqlx::query(
            "INSERT INTO exchange_rate (rate, source, fetched_at) VALUES (?, ?, ?)",
        )
        .bind(rate.to_string())
        .bind(source.to_string())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        let row = sqlx::query("SELECT id, rate, source, fetched_at FROM exchange_rate WHERE id = ?")
            .bind(result.last_insert_rowid())
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;
        Self::rate_from_row(&row)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use cotiza_core::{ExchangeRateStore, RateSource, StoreError};

    use super::SqlExchangeRateStore;
    use crate::connection::{connect, PoolSettings};
    use crate::migrations;

    async fn setup() -> SqlExchangeRateStore {
        let pool = connect("sqlite::memory:", PoolSettings::new(1, 30)).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        SqlExchangeRateStore::new(pool)
    }

    #[tokio::test]
    async fn current_is_none_until_a_rate_is_recorded() {
        let store = setup().await;
        assert_eq!(store.current().await.expect("current"), None);
    }

    #[tokio::test]
    async fn latest_recorded_rate_wins_and_history_is_kept() {
        let store = setup().await;
        store.record(Decimal::from(1_300), RateSource::Scraped).await.expect("first");
        let second = store.record(Decimal::from(1_350), RateSource::Manual).await.expect("second");

        let current = store.current().await.expect("current").expect("some rate");
        assert_eq!(current.id, second.id);
        assert_eq!(current.rate, Decimal::from(1_350));
        assert_eq!(current.source, RateSource::Manual);
    }

    #[tokio::test]
    async fn non_positive_rates_are_rejected() {
        let store = setup().await;
        let error =
            store.record(Decimal::ZERO, RateSource::Manual).await.expect_err("zero rate");
        assert!(matches!(error, StoreError::Validation(_)));
    }
}
