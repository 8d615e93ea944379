pub mod connection;
pub mod fixtures;
pub mod migrations;
pub mod repositories;

pub use connection::{connect, DbPool, PoolSettings};
pub use fixtures::{seed_demo_catalog, SeedSummary};
pub use repositories::{SqlCatalogStore, SqlExchangeRateStore, SqlQuotationStore};
