use async_trait::async_trait;
use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row};

use cotiza_core::{
    ClientInfo, Quotation, QuotationDraft, QuotationFilter, QuotationPage, QuotationStats,
    QuotationStore, StoreError,
};

use super::{db_error, parse_timestamp, require_money};
use crate::DbPool;

/// SQLite-backed quotation record writer. Records are immutable once
/// created; only the soft-delete fields ever change afterwards.
pub struct SqlQuotationStore {
    pool: DbPool,
}

impl SqlQuotationStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn quotation_from_row(row: &SqliteRow) -> Result<Quotation, StoreError> {
        let deleted_at: Option<String> = row.try_get("deleted_at").map_err(db_error)?;
        let created_at: String = row.try_get("created_at").map_err(db_error)?;

        Ok(Quotation {
            id: row.try_get("id").map_err(db_error)?,
            machine_code: row.try_get("machine_code").map_err(db_error)?,
            client: ClientInfo {
                name: row.try_get("client_name").map_err(db_error)?,
                tax_id: row.try_get("client_tax_id").map_err(db_error)?,
                phone: row.try_get("client_phone").map_err(db_error)?,
                email: row.try_get("client_email").map_err(db_error)?,
                company: row.try_get("client_company").map_err(db_error)?,
                address: row.try_get("client_address").map_err(db_error)?,
            },
            notes: row.try_get("notes").map_err(db_error)?,
            client_discount_percent: require_money(
                "quotation.client_discount_percent",
                row.try_get("client_discount_percent").map_err(db_error)?,
            )?,
            additional_discount_percent: require_money(
                "quotation.additional_discount_percent",
                row.try_get("additional_discount_percent").map_err(db_error)?,
            )?,
            total_discount_percent: require_money(
                "quotation.total_discount_percent",
                row.try_get("total_discount_percent").map_err(db_error)?,
            )?,
            original_price: require_money(
                "quotation.original_price",
                row.try_get("original_price").map_err(db_error)?,
            )?,
            final_price: require_money(
                "quotation.final_price",
                row.try_get("final_price").map_err(db_error)?,
            )?,
            options_data: row.try_get("options_data").map_err(db_error)?,
            options_total: require_money(
                "quotation.options_total",
                row.try_get("options_total").map_err(db_error)?,
            )?,
            is_deleted: row.try_get("is_deleted").map_err(db_error)?,
            deleted_at: deleted_at
                .map(|raw| parse_timestamp("quotation.deleted_at", &raw))
                .transpose()?,
            deleted_by: row.try_get("deleted_by").map_err(db_error)?,
            created_at: parse_timestamp("quotation.created_at", &created_at)?,
        })
    }

    async fn fetch_by_id(&self, id: i64) -> Result<Option<Quotation>, StoreError> {
        let row = sqlx::query("SELECT * FROM quotation WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
        row.as_ref().map(Self::quotation_from_row).transpose()
    }
}

#[async_trait]
impl QuotationStore for SqlQuotationStore {
    async fn create(&self, draft: QuotationDraft) -> Result<Quotation, StoreError> {
        let created_at = Utc::now().to_rfc3339();

        let result = sqlx::query(
            "INSERT INTO quotation
                 (machine_code, client_name, client_tax_id, client_phone, client_email,
                  client_company, client_address, notes,
                  client_discount_percent, additional_discount_percent, total_discount_percent,
                  original_price, final_price, options_data, options_total,
                  is_deleted, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?)",
        )
        .bind(&draft.machine_code)
        .bind(&draft.client.name)
        .bind(&draft.client.tax_id)
        .bind(&draft.client.phone)
        .bind(&draft.client.email)
        .bind(&draft.client.company)
        .bind(&draft.client.address)
        .bind(&draft.notes)
        .bind(draft.client_discount_percent.to_string())
        .bind(draft.additional_discount_percent.to_string())
        .bind(draft.total_discount_percent.to_string())
        .bind(draft.original_price.to_string())
        .bind(draft.final_price.to_string())
        .bind(&draft.options_data)
        .bind(draft.options_total.to_string())
        .bind(&created_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        let id = result.last_insert_rowid();
        self.fetch_by_id(id)
            .await?
            .ok_or_else(|| StoreError::not_found("quotation", id.to_string()))
    }

    async fn soft_delete(&self, id: i64, actor: &str) -> Result<(), StoreError> {
        let is_deleted: Option<bool> =
            sqlx::query_scalar("SELECT is_deleted FROM quotation WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error)?;

        match is_deleted {
            None => Err(StoreError::not_found("quotation", id.to_string())),
            Some(true) => Ok(()),
            Some(false) => {
                sqlx::query(
                    "UPDATE quotation SET is_deleted = 1, deleted_at = ?, deleted_by = ?
                     WHERE id = ?",
                )
                .bind(Utc::now().to_rfc3339())
                .bind(actor)
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(db_error)?;
                Ok(())
            }
        }
    }

    async fn restore(&self, id: i64) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE quotation SET is_deleted = 0, deleted_at = NULL, deleted_by = NULL
             WHERE id = ?",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("quotation", id.to_string()));
        }
        Ok(())
    }

    async fn list(&self, filter: QuotationFilter) -> Result<QuotationPage, StoreError> {
        let pattern = format!("%{}%", filter.query.clone().unwrap_or_default().trim());
        let limit = filter.limit.unwrap_or(50).max(0);
        let offset = filter.offset.unwrap_or(0).max(0);

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM quotation
             WHERE (?1 OR is_deleted = 0)
               AND (?2 IS NULL
                    OR client_name LIKE ?3
                    OR client_tax_id LIKE ?3
                    OR machine_code LIKE ?3
                    OR IFNULL(client_company, '') LIKE ?3)",
        )
        .bind(filter.include_deleted)
        .bind(&filter.query)
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;

        let rows = sqlx::query(
            "SELECT * FROM quotation
             WHERE (?1 OR is_deleted = 0)
               AND (?2 IS NULL
                    OR client_name LIKE ?3
                    OR client_tax_id LIKE ?3
                    OR machine_code LIKE ?3
                    OR IFNULL(client_company, '') LIKE ?3)
             ORDER BY created_at DESC, id DESC
             LIMIT ?4 OFFSET ?5",
        )
        .bind(filter.include_deleted)
        .bind(&filter.query)
        .bind(&pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        let items =
            rows.iter().map(Self::quotation_from_row).collect::<Result<Vec<_>, _>>()?;
        Ok(QuotationPage { items, total })
    }

    async fn stats(&self) -> Result<QuotationStats, StoreError> {
        let total_quotations: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM quotation WHERE is_deleted = 0")
                .fetch_one(&self.pool)
                .await
                .map_err(db_error)?;
        let with_discount: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM quotation
             WHERE is_deleted = 0 AND CAST(total_discount_percent AS REAL) > 0",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(QuotationStats { total_quotations, with_discount })
    }
}
