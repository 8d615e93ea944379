//! Import reconciliation: applies an operator-approved price-list
//! extraction to the catalog.
//!
//! Matching is by exact machine `code`. Each product is applied
//! all-or-nothing (the store's machine upsert is transactional), but the
//! batch itself is best-effort: one failed product is reported and the
//! rest continue. Input order is preserved so counts and error messages
//! are reproducible for identical input.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::domain::machine::{MachineDraft, OptionDraft};
use crate::domain::payment::ConditionDraft;
use crate::pricelist::{ParsedCondition, ParsedProduct};
use crate::store::{CatalogStore, StoreError};

/// A parsed product as it comes back from operator review. The `include`
/// flag is review state only and never reaches the persisted machine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReviewedProduct {
    #[serde(default = "default_include")]
    pub include: bool,
    #[serde(flatten)]
    pub product: ParsedProduct,
}

fn default_include() -> bool {
    true
}

impl From<ParsedProduct> for ReviewedProduct {
    fn from(product: ParsedProduct) -> Self {
        Self { include: true, product }
    }
}

/// Outcome of applying one reviewed product.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProductOutcome {
    Imported { code: String },
    Updated { code: String },
    Failed { reason: String },
}

/// Batch summary returned to the operator. Per-product failures stay
/// individually identifiable; they are never collapsed into one opaque
/// batch error.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportResult {
    pub imported: u32,
    pub updated: u32,
    pub errors: Vec<String>,
    pub payment_conditions_imported: u32,
}

impl ImportResult {
    fn absorb(&mut self, outcome: ProductOutcome) {
        match outcome {
            ProductOutcome::Imported { .. } => self.imported += 1,
            ProductOutcome::Updated { .. } => self.updated += 1,
            ProductOutcome::Failed { reason } => self.errors.push(reason),
        }
    }
}

pub struct ImportReconciler<'a, S: CatalogStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: CatalogStore + ?Sized> ImportReconciler<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Apply reviewed products and payment conditions to the catalog.
    ///
    /// With `replace_existing`, every active machine absent from the
    /// included set is deactivated first; nothing is ever hard-deleted,
    /// so existing quotations keep their referential history.
    ///
    /// Returns `Err` only for infrastructure failures outside any single
    /// product (e.g. the deactivation sweep); per-product problems land
    /// in [`ImportResult::errors`].
    pub async fn confirm(
        &self,
        products: Vec<ReviewedProduct>,
        payment_conditions: Vec<ParsedCondition>,
        replace_existing: bool,
    ) -> Result<ImportResult, StoreError> {
        let included: Vec<ParsedProduct> = products
            .into_iter()
            .filter(|reviewed| reviewed.include)
            .map(|reviewed| reviewed.product)
            .collect();

        if replace_existing {
            self.deactivate_absent(&included).await?;
        }

        let mut result = ImportResult::default();
        for product in included {
            result.absorb(self.apply_product(product).await);
        }

        for condition in payment_conditions {
            match self.apply_condition(condition).await {
                Ok(()) => result.payment_conditions_imported += 1,
                Err(error) => result.errors.push(error),
            }
        }

        Ok(result)
    }

    async fn deactivate_absent(&self, included: &[ParsedProduct]) -> Result<(), StoreError> {
        let incoming: HashSet<&str> =
            included.iter().map(|product| product.code.trim()).collect();
        for code in self.store.active_machine_codes().await? {
            if !incoming.contains(code.as_str()) {
                self.store.deactivate_machine(&code).await?;
            }
        }
        Ok(())
    }

    async fn apply_product(&self, product: ParsedProduct) -> ProductOutcome {
        let code = product.code.trim().to_string();
        if code.is_empty() {
            return ProductOutcome::Failed {
                reason: format!("product without code: {}", product.name),
            };
        }

        let draft = MachineDraft {
            code: code.clone(),
            name: if product.name.trim().is_empty() { code.clone() } else { product.name },
            model_name: product.model_name,
            product_title: product.product_title,
            category: product.category,
            price: product.price,
            price_currency: product.price_currency,
            description: String::new(),
            specs: product
                .specs
                .into_iter()
                .map(|spec| spec.trim().to_string())
                .filter(|spec| !spec.is_empty())
                .collect(),
            options: product
                .optionals
                .into_iter()
                .filter(|optional| !optional.name.trim().is_empty())
                .map(|optional| OptionDraft {
                    name: optional.name.trim().to_string(),
                    price: optional.price,
                    description: String::new(),
                })
                .collect(),
        };

        match self.store.upsert_machine(draft).await {
            Ok(upsert) if upsert.created => ProductOutcome::Imported { code },
            Ok(_) => ProductOutcome::Updated { code },
            Err(error) => {
                ProductOutcome::Failed { reason: format!("error importing {code}: {error}") }
            }
        }
    }

    async fn apply_condition(&self, condition: ParsedCondition) -> Result<(), String> {
        let name = condition.name.trim().to_string();
        if name.is_empty() {
            return Err("payment condition without name".to_string());
        }

        // No explicit reorder on import: an existing condition keeps its
        // stored sort_order, new ones append in document order.
        let draft = ConditionDraft {
            name: name.clone(),
            discount_percent: condition.discount_percent,
            description: condition.description,
            sort_order: None,
        };
        self.store
            .upsert_payment_condition(draft)
            .await
            .map(|_| ())
            .map_err(|error| format!("error importing payment condition {name}: {error}"))
    }
}

#[cfg(test)]
mod tests {
    use crate::pricelist::{ParsedOptional, ParsedProduct};

    use super::{ImportResult, ProductOutcome, ReviewedProduct};

    #[test]
    fn review_payload_defaults_to_included() {
        let payload = r#"{
            "code": "AVA4000",
            "product_title": "ACOPLADO VOLCADOR",
            "model_name": "A.V.A. 4000",
            "name": "ACOPLADO VOLCADOR",
            "category": "Volcadores",
            "price": "6087",
            "price_currency": "USD",
            "specs": ["Caja volcadora"],
            "optionals": [{"name": "Ruedas duales", "price": null}]
        }"#;

        let reviewed: ReviewedProduct = serde_json::from_str(payload).expect("deserialize");
        assert!(reviewed.include);
        assert_eq!(reviewed.product.code, "AVA4000");
        assert_eq!(reviewed.product.optionals, vec![ParsedOptional {
            name: "Ruedas duales".to_string(),
            price: None,
        }]);
    }

    #[test]
    fn excluded_flag_round_trips_next_to_product_fields() {
        let payload = r#"{
            "include": false,
            "code": "SF6",
            "product_title": "SIN FIN",
            "model_name": "S.F. 6",
            "name": "SIN FIN",
            "category": "Sinfines",
            "price": null,
            "price_currency": "USD",
            "specs": [],
            "optionals": []
        }"#;

        let reviewed: ReviewedProduct = serde_json::from_str(payload).expect("deserialize");
        assert!(!reviewed.include);
        assert_eq!(reviewed.product.price, None);
    }

    #[test]
    fn summary_aggregates_per_product_outcomes() {
        let mut result = ImportResult::default();
        result.absorb(ProductOutcome::Imported { code: "A".to_string() });
        result.absorb(ProductOutcome::Updated { code: "B".to_string() });
        result.absorb(ProductOutcome::Failed { reason: "product without code: C".to_string() });

        assert_eq!(result.imported, 1);
        assert_eq!(result.updated, 1);
        assert_eq!(result.errors, vec!["product without code: C".to_string()]);
    }

    #[test]
    fn parsed_product_converts_into_included_review_row() {
        let product = ParsedProduct {
            code: "P10".to_string(),
            product_title: "ACOPLADO RURAL PLAYO".to_string(),
            model_name: "P-10".to_string(),
            name: "ACOPLADO RURAL PLAYO – P-10".to_string(),
            category: "Acoplados Playos".to_string(),
            price: None,
            price_currency: Default::default(),
            specs: vec![],
            optionals: vec![],
        };

        let reviewed = ReviewedProduct::from(product.clone());
        assert!(reviewed.include);
        assert_eq!(reviewed.product, product);
    }
}
