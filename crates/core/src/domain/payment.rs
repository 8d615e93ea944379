use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// A named discount policy ("Contado", "30/60/90 días", ...), shown on
/// quotation documents and applied as the client discount at quote time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PaymentCondition {
    pub id: i64,
    pub name: String,
    pub discount_percent: Decimal,
    pub description: String,
    pub sort_order: i64,
    pub active: bool,
}

/// Write-side shape for upserting a payment condition by name.
/// `sort_order: None` keeps the stored order on update and appends on
/// create; `Some` explicitly reorders.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConditionDraft {
    pub name: String,
    #[serde(default)]
    pub discount_percent: Decimal,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub sort_order: Option<i64>,
}

impl ConditionDraft {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::InvariantViolation(
                "payment condition has no name".to_string(),
            ));
        }
        if self.discount_percent < Decimal::ZERO || self.discount_percent > Decimal::from(100) {
            return Err(DomainError::DiscountOutOfRange(self.discount_percent));
        }
        Ok(())
    }
}
