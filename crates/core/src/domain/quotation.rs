use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Marker stored in `machine_code` when a quotation covers several
/// machines; the per-line breakdown then lives in `options_data`.
pub const MULTI_MACHINE_CODE: &str = "MULTIPLE";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    pub tax_id: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub company: Option<String>,
    pub address: Option<String>,
}

/// A finalized quotation. Immutable once created, except for the
/// soft-delete fields an admin can flip and clear.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quotation {
    pub id: i64,
    pub machine_code: String,
    pub client: ClientInfo,
    pub notes: Option<String>,
    pub client_discount_percent: Decimal,
    pub additional_discount_percent: Decimal,
    pub total_discount_percent: Decimal,
    pub original_price: Decimal,
    pub final_price: Decimal,
    /// JSON snapshot of the selected options and, for multi-machine
    /// quotations, the full line breakdown.
    pub options_data: Option<String>,
    pub options_total: Decimal,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Inputs plus computed outputs of a quotation, ready to persist.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuotationDraft {
    pub machine_code: String,
    pub client: ClientInfo,
    pub notes: Option<String>,
    pub client_discount_percent: Decimal,
    pub additional_discount_percent: Decimal,
    pub total_discount_percent: Decimal,
    pub original_price: Decimal,
    pub final_price: Decimal,
    pub options_data: Option<String>,
    pub options_total: Decimal,
}
