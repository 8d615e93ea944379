//! Price-list import endpoints: the two-step preview/confirm flow.
//!
//! - `POST /admin/price-list/preview`  — raw PDF bytes in, parsed preview
//!   out; writes nothing
//! - `POST /admin/price-list/confirm`  — operator-reviewed products in,
//!   import summary out
//! - `GET  /admin/price-list/machines` — full catalog listing, inactive
//!   machines included

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tracing::info;

use cotiza_core::pricelist::{self, ParsedCondition, PreviewResult};
use cotiza_core::{
    CatalogStore, ImportReconciler, ImportResult, MachineFilter, MachinePage, ParseError,
    ReviewedProduct,
};
use cotiza_db::SqlCatalogStore;

use crate::api::{error_response, store_error, AppState, ErrorResponse};

pub fn router(state: AppState) -> Router {
    let body_limit = state.config.import.max_document_bytes;
    Router::new()
        .route("/admin/price-list/preview", post(preview))
        .route("/admin/price-list/confirm", post(confirm))
        .route("/admin/price-list/machines", get(list_all_machines))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct ConfirmRequest {
    products: Vec<ReviewedProduct>,
    #[serde(default)]
    payment_conditions: Vec<ParsedCondition>,
    #[serde(default)]
    replace_existing: bool,
}

async fn preview(
    State(state): State<AppState>,
    document: Bytes,
) -> Result<Json<PreviewResult>, ErrorResponse> {
    let preview = pricelist::parse_with_limit(&document, state.config.import.max_document_bytes)
        .map_err(parse_error)?;

    info!(
        event_name = "import.preview.parsed",
        total_products = preview.total_products,
        total_with_price = preview.total_with_price,
        payment_conditions = preview.payment_conditions.len(),
        "price list parsed for preview"
    );
    Ok(Json(preview))
}

async fn confirm(
    State(state): State<AppState>,
    Json(request): Json<ConfirmRequest>,
) -> Result<Json<ImportResult>, ErrorResponse> {
    if request.products.iter().all(|product| !product.include) {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "no products selected for import",
        ));
    }

    let store = SqlCatalogStore::new(state.pool.clone());
    let result = ImportReconciler::new(&store)
        .confirm(request.products, request.payment_conditions, request.replace_existing)
        .await
        .map_err(store_error)?;

    info!(
        event_name = "import.confirm.applied",
        imported = result.imported,
        updated = result.updated,
        failed = result.errors.len(),
        payment_conditions = result.payment_conditions_imported,
        replace_existing = request.replace_existing,
        "price list import applied"
    );
    Ok(Json(result))
}

async fn list_all_machines(
    State(state): State<AppState>,
) -> Result<Json<MachinePage>, ErrorResponse> {
    let store = SqlCatalogStore::new(state.pool.clone());
    let page = store
        .list_machines(MachineFilter { limit: Some(i64::MAX), ..MachineFilter::default() })
        .await
        .map_err(store_error)?;
    Ok(Json(page))
}

fn parse_error(error: ParseError) -> ErrorResponse {
    let status = match error {
        ParseError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        ParseError::Unreadable(_) | ParseError::EmptyDocument => StatusCode::UNPROCESSABLE_ENTITY,
    };
    error_response(status, error.to_string())
}

#[cfg(test)]
mod tests {
    use axum::body::Bytes;
    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::Json;
    use rust_decimal::Decimal;

    use cotiza_core::config::AppConfig;
    use cotiza_core::pricelist::{ParsedOptional, ParsedProduct};
    use cotiza_core::{CatalogStore, Currency, ReviewedProduct};
    use cotiza_db::{connect, migrations, PoolSettings, SqlCatalogStore};

    use super::{confirm, preview, ConfirmRequest};
    use crate::api::AppState;

    async fn setup() -> AppState {
        let pool = connect("sqlite::memory:", PoolSettings::new(1, 30)).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        AppState::new(pool, AppConfig::default())
    }

    fn reviewed(code: &str, price: Option<i64>) -> ReviewedProduct {
        ReviewedProduct::from(ParsedProduct {
            code: code.to_string(),
            product_title: "ACOPLADO DE PRUEBA".to_string(),
            model_name: code.to_string(),
            name: format!("Acoplado {code}"),
            category: "Tolvas".to_string(),
            price: price.map(Decimal::from),
            price_currency: Currency::Usd,
            specs: vec!["spec".to_string()],
            optionals: vec![ParsedOptional { name: "Ruedas duales".to_string(), price: None }],
        })
    }

    #[tokio::test]
    async fn preview_rejects_unreadable_documents() {
        let state = setup().await;

        let (status, _) = preview(State(state), Bytes::from_static(b"not a pdf"))
            .await
            .expect_err("garbage bytes");
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn preview_rejects_oversized_documents() {
        let mut state = setup().await;
        let mut config = AppConfig::default();
        config.import.max_document_bytes = 4;
        state.config = std::sync::Arc::new(config);

        let (status, _) = preview(State(state), Bytes::from_static(b"too many bytes"))
            .await
            .expect_err("oversized");
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn confirm_applies_reviewed_products() {
        let state = setup().await;

        let result = confirm(
            State(state.clone()),
            Json(ConfirmRequest {
                products: vec![reviewed("ATF10", Some(25_300)), reviewed("SF6", None)],
                payment_conditions: vec![],
                replace_existing: false,
            }),
        )
        .await
        .expect("confirm");

        assert_eq!(result.0.imported, 2);
        assert_eq!(result.0.updated, 0);

        let store = SqlCatalogStore::new(state.pool.clone());
        let machine = store.machine_by_code("SF6").await.expect("fetch").expect("exists");
        assert_eq!(machine.price, None);
    }

    #[tokio::test]
    async fn confirm_without_included_products_is_a_bad_request() {
        let state = setup().await;

        let mut excluded = reviewed("ATF10", Some(1));
        excluded.include = false;

        let (status, _) = confirm(
            State(state),
            Json(ConfirmRequest {
                products: vec![excluded],
                payment_conditions: vec![],
                replace_existing: false,
            }),
        )
        .await
        .expect_err("nothing to import");
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
