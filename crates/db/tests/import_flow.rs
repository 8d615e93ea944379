//! End-to-end import reconciliation against the real SQLite catalog
//! store: merge/replace semantics, idempotence, partial failure and
//! concurrent confirms.

use rust_decimal::Decimal;

use cotiza_core::pricelist::{ParsedCondition, ParsedOptional, ParsedProduct};
use cotiza_core::{CatalogStore, Currency, ImportReconciler, ReviewedProduct};
use cotiza_db::{connect, migrations, PoolSettings, SqlCatalogStore};

fn product(code: &str, price: Option<i64>) -> ParsedProduct {
    ParsedProduct {
        code: code.to_string(),
        product_title: format!("TITULO {code}"),
        model_name: code.to_string(),
        name: format!("Producto {code}"),
        category: "Tolvas".to_string(),
        price: price.map(Decimal::from),
        price_currency: Currency::Usd,
        specs: vec![format!("spec de {code}")],
        optionals: vec![ParsedOptional {
            name: "Ruedas duales".to_string(),
            price: Some(Decimal::from(350)),
        }],
    }
}

fn reviewed(codes_and_prices: &[(&str, Option<i64>)]) -> Vec<ReviewedProduct> {
    codes_and_prices
        .iter()
        .map(|(code, price)| ReviewedProduct::from(product(code, *price)))
        .collect()
}

async fn setup() -> SqlCatalogStore {
    let pool = connect("sqlite::memory:", PoolSettings::new(1, 30)).await.expect("connect");
    migrations::run_pending(&pool).await.expect("migrations");
    SqlCatalogStore::new(pool)
}

#[tokio::test]
async fn merge_confirm_is_idempotent() {
    let store = setup().await;
    let reconciler = ImportReconciler::new(&store);

    let first = reconciler
        .confirm(reviewed(&[("A", Some(100)), ("B", Some(200))]), vec![], false)
        .await
        .expect("first confirm");
    assert_eq!(first.imported, 2);
    assert_eq!(first.updated, 0);
    assert!(first.errors.is_empty());

    let second = reconciler
        .confirm(reviewed(&[("A", Some(100)), ("B", Some(200))]), vec![], false)
        .await
        .expect("second confirm");
    assert_eq!(second.imported, 0);
    assert_eq!(second.updated, 2);
    assert!(second.errors.is_empty());
}

#[tokio::test]
async fn replace_deactivates_absent_machines_without_deleting_rows() {
    let store = setup().await;
    let reconciler = ImportReconciler::new(&store);
    reconciler
        .confirm(reviewed(&[("A", Some(1)), ("B", Some(2)), ("C", Some(3))]), vec![], false)
        .await
        .expect("seed catalog");

    let result = reconciler
        .confirm(reviewed(&[("B", Some(20)), ("D", Some(4))]), vec![], true)
        .await
        .expect("replace confirm");

    assert_eq!(result.imported, 1); // D
    assert_eq!(result.updated, 1); // B
    assert!(result.errors.is_empty());

    for (code, expected_active) in [("A", false), ("B", true), ("C", false), ("D", true)] {
        let machine = store
            .machine_by_code(code)
            .await
            .expect("fetch")
            .unwrap_or_else(|| panic!("machine {code} must still exist"));
        assert_eq!(machine.active, expected_active, "machine {code}");
    }

    let updated = store.machine_by_code("B").await.expect("fetch").expect("B exists");
    assert_eq!(updated.price, Some(Decimal::from(20)));
}

#[tokio::test]
async fn excluded_products_are_discarded_without_effect() {
    let store = setup().await;
    let reconciler = ImportReconciler::new(&store);

    let mut products = reviewed(&[("A", Some(1)), ("B", Some(2))]);
    products[1].include = false;

    let result = reconciler.confirm(products, vec![], false).await.expect("confirm");
    assert_eq!(result.imported, 1);
    assert!(store.machine_by_code("B").await.expect("fetch").is_none());
}

#[tokio::test]
async fn one_invalid_product_does_not_abort_the_batch() {
    let store = setup().await;
    let reconciler = ImportReconciler::new(&store);

    let mut batch = reviewed(&[("A", Some(1)), ("", Some(2)), ("C", Some(3))]);
    batch[1].product.name = "Producto sin codigo".to_string();

    let result = reconciler.confirm(batch, vec![], false).await.expect("confirm");

    assert_eq!(result.imported, 2);
    assert_eq!(result.updated, 0);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].contains("Producto sin codigo"));
    assert!(store.machine_by_code("A").await.expect("fetch").is_some());
    assert!(store.machine_by_code("C").await.expect("fetch").is_some());
}

#[tokio::test]
async fn products_with_unknown_price_commit_as_unpriced() {
    let store = setup().await;
    let reconciler = ImportReconciler::new(&store);

    let result =
        reconciler.confirm(reviewed(&[("A", None)]), vec![], false).await.expect("confirm");
    assert_eq!(result.imported, 1);

    let machine = store.machine_by_code("A").await.expect("fetch").expect("exists");
    assert_eq!(machine.price, None);
}

#[tokio::test]
async fn imported_optionals_become_global_options_linked_to_the_machine() {
    let store = setup().await;
    let reconciler = ImportReconciler::new(&store);

    reconciler
        .confirm(reviewed(&[("A", Some(1)), ("B", Some(2))]), vec![], false)
        .await
        .expect("confirm");

    let options = store.list_options(true).await.expect("options");
    assert_eq!(options.len(), 1, "same optional name resolves to one global option");

    let machine = store.machine_by_code("A").await.expect("fetch").expect("exists");
    assert_eq!(machine.options.len(), 1);
    assert_eq!(machine.options[0].name, "Ruedas duales");
}

#[tokio::test]
async fn payment_conditions_upsert_by_name_and_keep_their_order() {
    let store = setup().await;
    let reconciler = ImportReconciler::new(&store);

    let conditions = vec![
        ParsedCondition {
            name: "Contado".to_string(),
            discount_percent: Decimal::from(12),
            description: "pago contado".to_string(),
            sort_order: 0,
        },
        ParsedCondition {
            name: "Cheques 30/60/90".to_string(),
            discount_percent: Decimal::from(5),
            description: "valores a fecha".to_string(),
            sort_order: 1,
        },
    ];
    let result =
        reconciler.confirm(vec![], conditions.clone(), false).await.expect("first import");
    assert_eq!(result.payment_conditions_imported, 2);

    // Re-import with changed percentages but reversed document order:
    // stored order must survive.
    let reimported = vec![
        ParsedCondition {
            name: "Cheques 30/60/90".to_string(),
            discount_percent: Decimal::from(8),
            description: "valores a fecha actualizados".to_string(),
            sort_order: 0,
        },
        ParsedCondition {
            name: "Contado".to_string(),
            discount_percent: Decimal::from(15),
            description: "pago contado actualizado".to_string(),
            sort_order: 1,
        },
    ];
    reconciler.confirm(vec![], reimported, false).await.expect("second import");

    let stored = store.list_payment_conditions(false).await.expect("list");
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].name, "Contado");
    assert_eq!(stored[0].discount_percent, Decimal::from(15));
    assert_eq!(stored[1].name, "Cheques 30/60/90");
    assert_eq!(stored[1].discount_percent, Decimal::from(8));
}

#[tokio::test]
async fn concurrent_confirms_on_overlapping_codes_never_corrupt_a_machine() {
    let pool = connect("sqlite::memory:?cache=shared", PoolSettings::new(4, 30))
        .await
        .expect("connect");
    migrations::run_pending(&pool).await.expect("migrations");
    let store_one = SqlCatalogStore::new(pool.clone());
    let store_two = SqlCatalogStore::new(pool.clone());

    let first = async {
        ImportReconciler::new(&store_one)
            .confirm(reviewed(&[("A", Some(100)), ("B", Some(100))]), vec![], false)
            .await
            .expect("first confirm")
    };
    let second = async {
        ImportReconciler::new(&store_two)
            .confirm(reviewed(&[("B", Some(900)), ("C", Some(900))]), vec![], false)
            .await
            .expect("second confirm")
    };
    tokio::join!(first, second);

    // Last writer wins on B, but there is exactly one consistent row.
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM machine WHERE code = 'B'")
        .fetch_one(&pool)
        .await
        .expect("count");
    assert_eq!(count, 1);

    let store = SqlCatalogStore::new(pool.clone());
    let machine = store.machine_by_code("B").await.expect("fetch").expect("exists");
    assert!(
        machine.price == Some(Decimal::from(100)) || machine.price == Some(Decimal::from(900)),
        "price must come from one of the two confirms, got {:?}",
        machine.price
    );
    assert_eq!(machine.specs, vec!["spec de B".to_string()]);
}
