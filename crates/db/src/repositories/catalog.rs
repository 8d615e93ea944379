use async_trait::async_trait;
use sqlx::{sqlite::SqliteRow, Row};

use cotiza_core::{
    CatalogStore, ConditionDraft, Currency, Machine, MachineDraft, MachineFilter, MachineOption,
    MachinePage, MachineUpsert, PaymentCondition, StoreError,
};

use super::{db_error, parse_money};
use crate::DbPool;

/// SQLite-backed catalog store.
///
/// `upsert_machine` writes the machine row, its ordered specs and its
/// option links inside one transaction, so a failing product in an import
/// batch never leaves partial state behind.
pub struct SqlCatalogStore {
    pool: DbPool,
}

impl SqlCatalogStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn machine_from_row(row: &SqliteRow) -> Result<Machine, StoreError> {
        let currency_raw: String = row.try_get("price_currency").map_err(db_error)?;
        let price_currency = currency_raw
            .parse::<Currency>()
            .map_err(|error| StoreError::Backend(error.to_string()))?;

        Ok(Machine {
            id: row.try_get("id").map_err(db_error)?,
            code: row.try_get("code").map_err(db_error)?,
            name: row.try_get("name").map_err(db_error)?,
            model_name: row.try_get("model_name").map_err(db_error)?,
            product_title: row.try_get("product_title").map_err(db_error)?,
            category: row.try_get("category").map_err(db_error)?,
            price: parse_money("machine.price", row.try_get("price").map_err(db_error)?)?,
            price_currency,
            description: row.try_get("description").map_err(db_error)?,
            specs: Vec::new(),
            active: row.try_get("active").map_err(db_error)?,
            options: Vec::new(),
        })
    }

    fn option_from_row(row: &SqliteRow) -> Result<MachineOption, StoreError> {
        Ok(MachineOption {
            id: row.try_get("id").map_err(db_error)?,
            name: row.try_get("name").map_err(db_error)?,
            price: parse_money("option.price", row.try_get("price").map_err(db_error)?)?,
            description: row.try_get("description").map_err(db_error)?,
            active: row.try_get("active").map_err(db_error)?,
        })
    }

    fn condition_from_row(row: &SqliteRow) -> Result<PaymentCondition, StoreError> {
        Ok(PaymentCondition {
            id: row.try_get("id").map_err(db_error)?,
            name: row.try_get("name").map_err(db_error)?,
            discount_percent: super::require_money(
                "payment_condition.discount_percent",
                row.try_get("discount_percent").map_err(db_error)?,
            )?,
            description: row.try_get("description").map_err(db_error)?,
            sort_order: row.try_get("sort_order").map_err(db_error)?,
            active: row.try_get("active").map_err(db_error)?,
        })
    }

    async fn load_machine_details(&self, machine: &mut Machine) -> Result<(), StoreError> {
        machine.specs = sqlx::query_scalar(
            "SELECT spec_text FROM machine_spec WHERE machine_id = ? ORDER BY sort_order, id",
        )
        .bind(machine.id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        machine.options = sqlx::query(
            "SELECT o.id, o.name, o.price, o.description, o.active
             FROM machine_option o
             JOIN machine_option_link l ON l.option_id = o.id
             WHERE l.machine_id = ?
             ORDER BY o.name",
        )
        .bind(machine.id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?
        .iter()
        .map(Self::option_from_row)
        .collect::<Result<Vec<_>, _>>()?;

        Ok(())
    }
}

#[async_trait]
impl CatalogStore for SqlCatalogStore {
    async fn machine_by_code(&self, code: &str) -> Result<Option<Machine>, StoreError> {
        let row = sqlx::query(
            "SELECT id, code, name, model_name, product_title, category, price,
                    price_currency, description, active
             FROM machine WHERE code = ?",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        let Some(row) = row else { return Ok(None) };
        let mut machine = Self::machine_from_row(&row)?;
        self.load_machine_details(&mut machine).await?;
        Ok(Some(machine))
    }

    async fn list_machines(&self, filter: MachineFilter) -> Result<MachinePage, StoreError> {
        let limit = filter.limit.unwrap_or(100).max(0);
        let offset = filter.offset.unwrap_or(0).max(0);

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM machine
             WHERE (?1 IS NULL OR category = ?1) AND (?2 IS NULL OR active = ?2)",
        )
        .bind(&filter.category)
        .bind(filter.active)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;

        let rows = sqlx::query(
            "SELECT id, code, name, model_name, product_title, category, price,
                    price_currency, description, active
             FROM machine
             WHERE (?1 IS NULL OR category = ?1) AND (?2 IS NULL OR active = ?2)
             ORDER BY category, name, id
             LIMIT ?3 OFFSET ?4",
        )
        .bind(&filter.category)
        .bind(filter.active)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        let mut machines = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut machine = Self::machine_from_row(row)?;
            self.load_machine_details(&mut machine).await?;
            machines.push(machine);
        }

        Ok(MachinePage { machines, total })
    }

    async fn active_machine_codes(&self) -> Result<Vec<String>, StoreError> {
        sqlx::query_scalar("SELECT code FROM machine WHERE active = 1 ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)
    }

    async fn upsert_machine(&self, draft: MachineDraft) -> Result<MachineUpsert, StoreError> {
        draft.validate().map_err(|error| StoreError::Validation(error.to_string()))?;
        let code = draft.code.trim().to_string();
        let price_text = draft.price.map(|price| price.to_string());

        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let existing_id: Option<i64> = sqlx::query_scalar("SELECT id FROM machine WHERE code = ?")
            .bind(&code)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_error)?;

        let machine_id = match existing_id {
            Some(id) => {
                // Descriptions are operator-authored; an import update
                // must not wipe them.
                sqlx::query(
                    "UPDATE machine
                     SET name = ?, model_name = ?, product_title = ?, category = ?,
                         price = ?, price_currency = ?, active = 1
                     WHERE id = ?",
                )
                .bind(&draft.name)
                .bind(&draft.model_name)
                .bind(&draft.product_title)
                .bind(&draft.category)
                .bind(&price_text)
                .bind(draft.price_currency.to_string())
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(db_error)?;
                id
            }
            None => sqlx::query(
                "INSERT INTO machine
                     (code, name, model_name, product_title, category, price,
                      price_currency, description, active)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, 1)",
            )
            .bind(&code)
            .bind(&draft.name)
            .bind(&draft.model_name)
            .bind(&draft.product_title)
            .bind(&draft.category)
            .bind(&price_text)
            .bind(draft.price_currency.to_string())
            .bind(&draft.description)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?
            .last_insert_rowid(),
        };

        sqlx::query("DELETE FROM machine_spec WHERE machine_id = ?")
            .bind(machine_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
        for (position, spec) in draft.specs.iter().enumerate() {
            if spec.trim().is_empty() {
                continue;
            }
            sqlx::query(
                "INSERT INTO machine_spec (machine_id, spec_text, sort_order) VALUES (?, ?, ?)",
            )
            .bind(machine_id)
            .bind(spec.trim())
            .bind(position as i64)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
        }

        sqlx::query("DELETE FROM machine_option_link WHERE machine_id = ?")
            .bind(machine_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
        for option in &draft.options {
            let name = option.name.trim();
            if name.is_empty() {
                continue;
            }
            let option_id: Option<i64> =
                sqlx::query_scalar("SELECT id FROM machine_option WHERE name = ?")
                    .bind(name)
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(db_error)?;
            let option_id = match option_id {
                Some(id) => id,
                None => sqlx::query(
                    "INSERT INTO machine_option (name, price, description, active)
                     VALUES (?, ?, ?, 1)",
                )
                .bind(name)
                .bind(option.price.map(|price| price.to_string()))
                .bind(&option.description)
                .execute(&mut *tx)
                .await
                .map_err(db_error)?
                .last_insert_rowid(),
            };
            sqlx::query(
                "INSERT OR IGNORE INTO machine_option_link (machine_id, option_id) VALUES (?, ?)",
            )
            .bind(machine_id)
            .bind(option_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
        }

        tx.commit().await.map_err(db_error)?;

        let machine = self
            .machine_by_code(&code)
            .await?
            .ok_or_else(|| StoreError::not_found("machine", &code))?;
        Ok(MachineUpsert { machine, created: existing_id.is_none() })
    }

    async fn deactivate_machine(&self, code: &str) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE machine SET active = 0 WHERE code = ?")
            .bind(code)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("machine", code));
        }
        Ok(())
    }

    async fn list_options(
        &self,
        include_inactive: bool,
    ) -> Result<Vec<MachineOption>, StoreError> {
        sqlx::query(
            "SELECT id, name, price, description, active FROM machine_option
             WHERE (?1 OR active = 1)
             ORDER BY name",
        )
        .bind(include_inactive)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?
        .iter()
        .map(Self::option_from_row)
        .collect()
    }

    async fn upsert_option(&self, draft: cotiza_core::OptionDraft) -> Result<MachineOption, StoreError> {
        let name = draft.name.trim().to_string();
        if name.is_empty() {
            return Err(StoreError::Validation("option name must not be empty".to_string()));
        }

        sqlx::query(
            "INSERT INTO machine_option (name, price, description, active)
             VALUES (?, ?, ?, 1)
             ON CONFLICT(name) DO UPDATE SET
                price = excluded.price,
                description = excluded.description,
                active = 1",
        )
        .bind(&name)
        .bind(draft.price.map(|price| price.to_string()))
        .bind(&draft.description)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        let row = sqlx::query(
            "SELECT id, name, price, description, active FROM machine_option WHERE name = ?",
        )
        .bind(&name)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        Self::option_from_row(&row)
    }

    async fn deactivate_option(&self, id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE machine_option SET active = 0 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("option", id.to_string()));
        }
        Ok(())
    }

    async fn list_payment_conditions(
        &self,
        only_active: bool,
    ) -> Result<Vec<PaymentCondition>, StoreError> {
        sqlx::query(
            "SELECT id, name, discount_percent, description, sort_order, active
             FROM payment_condition
             WHERE (?1 = 0 OR active = 1)
             ORDER BY sort_order, id",
        )
        .bind(only_active)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?
        .iter()
        .map(Self::condition_from_row)
        .collect()
    }

    async fn upsert_payment_condition(
        &self,
        draft: ConditionDraft,
    ) -> Result<PaymentCondition, StoreError> {
        draft.validate().map_err(|error| StoreError::Validation(error.to_string()))?;
        let name = draft.name.trim().to_string();
        let percent_text = draft.discount_percent.to_string();

        let existing_id: Option<i64> =
            sqlx::query_scalar("SELECT id FROM payment_condition WHERE name = ?")
                .bind(&name)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error)?;

        match (existing_id, draft.sort_order) {
            (Some(id), Some(sort_order)) => {
                sqlx::query(
                    "UPDATE payment_condition
                     SET discount_percent = ?, description = ?, sort_order = ?, active = 1
                     WHERE id = ?",
                )
                .bind(&percent_text)
                .bind(&draft.description)
                .bind(sort_order)
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(db_error)?;
            }
            (Some(id), None) => {
                // Not an explicit reorder: the stored sort_order stays.
                sqlx::query(
                    "UPDATE payment_condition
                     SET discount_percent = ?, description = ?, active = 1
                     WHERE id = ?",
                )
                .bind(&percent_text)
                .bind(&draft.description)
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(db_error)?;
            }
            (None, sort_order) => {
                let sort_order = match sort_order {
                    Some(explicit) => explicit,
                    None => sqlx::query_scalar(
                        "SELECT IFNULL(MAX(sort_order) + 1, 0) FROM payment_condition",
                    )
                    .fetch_one(&self.pool)
                    .await
                    .map_err(db_error)?,
                };
                sqlx::query(
                    "INSERT INTO payment_condition
                         (name, discount_percent, description, sort_order, active)
                     VALUES (?, ?, ?, ?, 1)",
                )
                .bind(&name)
                .bind(&percent_text)
                .bind(&draft.description)
                .bind(sort_order)
                .execute(&self.pool)
                .await
                .map_err(db_error)?;
            }
        }

        let row = sqlx::query(
            "SELECT id, name, discount_percent, description, sort_order, active
             FROM payment_condition WHERE name = ?",
        )
        .bind(&name)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        Self::condition_from_row(&row)
    }

    async fn deactivate_payment_condition(&self, id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE payment_condition SET active = 0 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("payment condition", id.to_string()));
        }
        Ok(())
    }
}
