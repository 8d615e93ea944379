//! Persistence ports consumed by the reconciler, the pricing endpoints and
//! the quotation writer. Implementations live in the db crate.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::exchange::{ExchangeRate, RateSource};
use crate::domain::machine::{Machine, MachineDraft, MachineOption, OptionDraft};
use crate::domain::payment::{ConditionDraft, PaymentCondition};
use crate::domain::quotation::{Quotation, QuotationDraft};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("storage failure: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound { entity, key: key.into() }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct MachineFilter {
    pub category: Option<String>,
    pub active: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MachinePage {
    pub machines: Vec<Machine>,
    pub total: i64,
}

/// Result of a by-code machine upsert: the stored row plus whether it was
/// created (`imported`) rather than updated.
#[derive(Clone, Debug, PartialEq)]
pub struct MachineUpsert {
    pub machine: Machine,
    pub created: bool,
}

/// Catalog ownership boundary. A machine upsert applies the machine row,
/// its ordered specs and its option links in one transaction, so a failed
/// product never leaves half-written state behind.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn machine_by_code(&self, code: &str) -> Result<Option<Machine>, StoreError>;
    async fn list_machines(&self, filter: MachineFilter) -> Result<MachinePage, StoreError>;
    async fn active_machine_codes(&self) -> Result<Vec<String>, StoreError>;
    async fn upsert_machine(&self, draft: MachineDraft) -> Result<MachineUpsert, StoreError>;
    async fn deactivate_machine(&self, code: &str) -> Result<(), StoreError>;

    async fn list_options(&self, include_inactive: bool)
        -> Result<Vec<MachineOption>, StoreError>;
    async fn upsert_option(&self, draft: OptionDraft) -> Result<MachineOption, StoreError>;
    async fn deactivate_option(&self, id: i64) -> Result<(), StoreError>;

    async fn list_payment_conditions(
        &self,
        only_active: bool,
    ) -> Result<Vec<PaymentCondition>, StoreError>;
    async fn upsert_payment_condition(
        &self,
        draft: ConditionDraft,
    ) -> Result<PaymentCondition, StoreError>;
    async fn deactivate_payment_condition(&self, id: i64) -> Result<(), StoreError>;
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuotationFilter {
    /// Substring matched across client name, tax id, machine code and
    /// company (OR semantics).
    pub query: Option<String>,
    pub include_deleted: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QuotationPage {
    pub items: Vec<Quotation>,
    pub total: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct QuotationStats {
    pub total_quotations: i64,
    pub with_discount: i64,
}

/// Quotation records are append-only with soft delete; listing is always
/// newest-first.
#[async_trait]
pub trait QuotationStore: Send + Sync {
    async fn create(&self, draft: QuotationDraft) -> Result<Quotation, StoreError>;
    /// Idempotent: soft-deleting an already-deleted record succeeds.
    async fn soft_delete(&self, id: i64, actor: &str) -> Result<(), StoreError>;
    async fn restore(&self, id: i64) -> Result<(), StoreError>;
    async fn list(&self, filter: QuotationFilter) -> Result<QuotationPage, StoreError>;
    async fn stats(&self) -> Result<QuotationStats, StoreError>;
}

/// Append-only USD to ARS rate log with a latest-row accessor.
#[async_trait]
pub trait ExchangeRateStore: Send + Sync {
    async fn current(&self) -> Result<Option<ExchangeRate>, StoreError>;
    async fn record(&self, rate: Decimal, source: RateSource) -> Result<ExchangeRate, StoreError>;
}
