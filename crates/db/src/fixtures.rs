//! Deterministic starter data for empty databases, used by `cotiza seed`
//! and local development.

use cotiza_core::{CatalogStore, ConditionDraft, Currency, MachineDraft, OptionDraft, StoreError};
use rust_decimal::Decimal;

use crate::repositories::SqlCatalogStore;
use crate::DbPool;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub machines: u32,
    pub payment_conditions: u32,
}

/// Seed a small demo catalog. A no-op when machines already exist, so it
/// is safe to run repeatedly.
pub async fn seed_demo_catalog(pool: &DbPool) -> Result<SeedSummary, StoreError> {
    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM machine")
        .fetch_one(pool)
        .await
        .map_err(|error| StoreError::Backend(format!("database error: {error}")))?;
    if existing > 0 {
        return Ok(SeedSummary::default());
    }

    let store = SqlCatalogStore::new(pool.clone());
    let mut summary = SeedSummary::default();

    for draft in demo_machines() {
        store.upsert_machine(draft).await?;
        summary.machines += 1;
    }
    for (position, (name, percent, description)) in demo_conditions().into_iter().enumerate() {
        store
            .upsert_payment_condition(ConditionDraft {
                name: name.to_string(),
                discount_percent: Decimal::from(percent),
                description: description.to_string(),
                sort_order: Some(position as i64),
            })
            .await?;
        summary.payment_conditions += 1;
    }

    Ok(summary)
}

fn demo_machines() -> Vec<MachineDraft> {
    vec![
        MachineDraft {
            code: "AVA4000".to_string(),
            name: "Acoplado volcador trivuelco – A.V.A. 4000".to_string(),
            model_name: "A.V.A. 4000".to_string(),
            product_title: "ACOPLADO VOLCADOR TRIVUELCO DE USO RURAL".to_string(),
            category: "Volcadores Trivuelco".to_string(),
            price: Some(Decimal::from(6_087)),
            price_currency: Currency::Usd,
            description: "Volcador trivuelco con vuelco manual".to_string(),
            specs: vec![
                "Caja volcadora de 4000 kg".to_string(),
                "Piso de chapa plegada".to_string(),
            ],
            options: vec![OptionDraft {
                name: "Ruedas duales".to_string(),
                price: Some(Decimal::from(350)),
                description: String::new(),
            }],
        },
        MachineDraft {
            code: "ATF10".to_string(),
            name: "Acoplado tolva – A.T.F. 10".to_string(),
            model_name: "A.T.F. 10".to_string(),
            product_title: "ACOPLADO TOLVA PARA SEMILLAS Y FERTILIZANTES".to_string(),
            category: "Tolvas".to_string(),
            price: Some(Decimal::from(25_300)),
            price_currency: Currency::Usd,
            description: "Tolva de 10 toneladas con descarga a sinfin".to_string(),
            specs: vec!["Capacidad 10 toneladas".to_string()],
            options: vec![OptionDraft {
                name: "Balanza electronica".to_string(),
                price: Some(Decimal::from(1_200)),
                description: String::new(),
            }],
        },
        MachineDraft {
            code: "SF6".to_string(),
            name: "Sinfin – S.F. 6".to_string(),
            model_name: "S.F. 6".to_string(),
            product_title: "SIN FIN PARA TRASLADO DE CEREALES".to_string(),
            category: "Sinfines".to_string(),
            price: Some(Decimal::from(4_100)),
            price_currency: Currency::Usd,
            description: "Sinfin de 6 metros".to_string(),
            specs: vec![],
            options: vec![],
        },
    ]
}

fn demo_conditions() -> Vec<(&'static str, i64, &'static str)> {
    vec![
        ("Contado", 12, "Pago al contado contra entrega"),
        ("Cheques 30/60/90", 5, "Valores a fecha con cheques propios"),
        ("Financiado", 0, "12 cuotas fijas, consultar interes"),
    ]
}
