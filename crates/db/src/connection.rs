use std::time::Duration;

use sqlx::sqlite::SqlitePoolOptions;

pub type DbPool = sqlx::SqlitePool;

/// Pool sizing knobs; defaults match the single-operator usage pattern.
#[derive(Clone, Copy, Debug)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self { max_connections: 5, acquire_timeout_secs: 30 }
    }
}

impl PoolSettings {
    pub fn new(max_connections: u32, acquire_timeout_secs: u64) -> Self {
        Self {
            max_connections: max_connections.max(1),
            acquire_timeout_secs: acquire_timeout_secs.max(1),
        }
    }
}

pub async fn connect(database_url: &str, settings: PoolSettings) -> Result<DbPool, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(settings.max_connections.max(1))
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs.max(1)))
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                sqlx::query("PRAGMA foreign_keys = ON").execute(&mut *conn).await?;
                sqlx::query("PRAGMA journal_mode = WAL").execute(&mut *conn).await?;
                sqlx::query("PRAGMA busy_timeout = 5000").execute(&mut *conn).await?;
                Ok(())
            })
        })
        .connect(database_url)
        .await
}
