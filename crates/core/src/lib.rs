pub mod config;
pub mod domain;
pub mod errors;
pub mod import;
pub mod pricelist;
pub mod pricing;
pub mod store;

pub use domain::exchange::{ExchangeRate, RateSource};
pub use domain::machine::{Currency, Machine, MachineDraft, MachineOption, OptionDraft};
pub use domain::payment::{ConditionDraft, PaymentCondition};
pub use domain::quotation::{ClientInfo, Quotation, QuotationDraft};
pub use errors::{DomainError, ParseError};
pub use import::{ImportReconciler, ImportResult, ProductOutcome, ReviewedProduct};
pub use pricelist::{ParsedCondition, ParsedOptional, ParsedProduct, PreviewResult};
pub use pricing::{LineItem, PriceBreakdown, PriceLookup, PricedLine, QuoteTotals};
pub use store::{
    CatalogStore, ExchangeRateStore, MachineFilter, MachinePage, MachineUpsert, QuotationFilter,
    QuotationPage, QuotationStats, QuotationStore, StoreError,
};
