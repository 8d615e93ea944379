use sqlx::migrate::{MigrateError, Migrator};

use crate::DbPool;

pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

pub async fn run_pending(pool: &DbPool) -> Result<(), MigrateError> {
    MIGRATOR.run(pool).await
}

#[cfg(test)]
mod tests {
    use sqlx::Row;

    use super::{run_pending, MIGRATOR};
    use crate::connection::{connect, PoolSettings};

    const MANAGED_SCHEMA_OBJECTS: &[&str] = &[
        "machine",
        "machine_spec",
        "machine_option",
        "machine_option_link",
        "payment_condition",
        "exchange_rate",
        "quotation",
        "idx_machine_category",
        "idx_machine_active",
        "idx_machine_spec_machine_id",
        "idx_exchange_rate_fetched_at",
        "idx_quotation_created_at",
        "idx_quotation_is_deleted",
    ];

    async fn managed_schema_signature(pool: &sqlx::SqlitePool) -> Vec<(String, String, String)> {
        let mut signature: Vec<(String, String, String)> = sqlx::query(
            "SELECT type, name, IFNULL(sql, '') AS sql
             FROM sqlite_master
             WHERE type IN ('table', 'index')",
        )
        .fetch_all(pool)
        .await
        .expect("load schema objects")
        .into_iter()
        .filter_map(|row| {
            let name = row.get::<String, _>("name");
            MANAGED_SCHEMA_OBJECTS.contains(&name.as_str()).then(|| {
                (row.get::<String, _>("type"), name, row.get::<String, _>("sql"))
            })
        })
        .collect();
        signature.sort();
        signature
    }

    #[tokio::test]
    async fn migrations_create_all_managed_objects() {
        let pool =
            connect("sqlite::memory:", PoolSettings::new(1, 30)).await.expect("connect");
        run_pending(&pool).await.expect("run migrations");

        let signature = managed_schema_signature(&pool).await;
        assert_eq!(
            signature.len(),
            MANAGED_SCHEMA_OBJECTS.len(),
            "baseline migration should create every managed schema object",
        );
    }

    #[tokio::test]
    async fn migrations_up_down_up_preserves_schema_signature() {
        let pool =
            connect("sqlite::memory:", PoolSettings::new(1, 30)).await.expect("connect");
        run_pending(&pool).await.expect("run migrations");
        let initial = managed_schema_signature(&pool).await;

        MIGRATOR.undo(&pool, 0).await.expect("undo migrations");
        assert!(
            managed_schema_signature(&pool).await.is_empty(),
            "full undo should remove every managed schema object",
        );

        run_pending(&pool).await.expect("re-run migrations");
        assert_eq!(managed_schema_signature(&pool).await, initial);
    }
}
