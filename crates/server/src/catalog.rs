//! Catalog administration endpoints.
//!
//! - `GET    /machines`                        — active machines (quote form)
//! - `GET    /machines/{code}`                 — one active machine
//! - `GET    /admin/machines`                  — paginated listing with filters
//! - `POST   /admin/machines`                  — create or update by code
//! - `DELETE /admin/machines/{code}`           — deactivate (never hard-delete)
//! - `GET    /options` / `GET /admin/options`  — option listings
//! - `POST   /admin/options`                   — upsert option by name
//! - `DELETE /admin/options/{id}`              — deactivate option
//! - `GET    /payment-conditions`              — active conditions (quote form)
//! - `GET    /admin/payment-conditions`        — all conditions
//! - `POST   /admin/payment-conditions`        — upsert condition by name
//! - `DELETE /admin/payment-conditions/{id}`   — deactivate condition
//! - `GET    /admin/exchange-rate`             — current USD/ARS rate
//! - `POST   /admin/exchange-rate/manual`      — record a manual rate

use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use cotiza_core::{
    CatalogStore, ConditionDraft, ExchangeRateStore, Machine, MachineDraft, MachineFilter,
    MachineOption, MachinePage, OptionDraft, PaymentCondition, RateSource, StoreError,
};
use cotiza_db::{SqlCatalogStore, SqlExchangeRateStore};

use crate::api::{store_error, AppState, ErrorResponse};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/machines", get(list_active_machines))
        .route("/machines/{code}", get(get_machine))
        .route("/admin/machines", get(list_machines_admin).post(upsert_machine))
        .route("/admin/machines/{code}", delete(deactivate_machine))
        .route("/options", get(list_active_options))
        .route("/admin/options", get(list_options_admin).post(upsert_option))
        .route("/admin/options/{id}", delete(deactivate_option))
        .route("/payment-conditions", get(list_active_conditions))
        .route(
            "/admin/payment-conditions",
            get(list_conditions_admin).post(upsert_condition),
        )
        .route("/admin/payment-conditions/{id}", delete(deactivate_condition))
        .route("/admin/exchange-rate", get(current_rate))
        .route("/admin/exchange-rate/manual", post(record_manual_rate))
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
struct MachineQuery {
    category: Option<String>,
    active: Option<bool>,
    limit: Option<i64>,
    offset: Option<i64>,
}

#[derive(Debug, Serialize)]
struct UpsertMachineResponse {
    machine: Machine,
    created: bool,
}

#[derive(Debug, Serialize)]
struct MessageResponse {
    message: String,
}

#[derive(Debug, Serialize)]
struct RateResponse {
    rate: Option<Decimal>,
    source: Option<RateSource>,
    fetched_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ManualRateRequest {
    rate: Decimal,
}

async fn list_active_machines(
    State(state): State<AppState>,
) -> Result<Json<MachinePage>, ErrorResponse> {
    let store = SqlCatalogStore::new(state.pool.clone());
    let page = store
        .list_machines(MachineFilter { active: Some(true), ..MachineFilter::default() })
        .await
        .map_err(store_error)?;
    Ok(Json(page))
}

async fn get_machine(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Machine>, ErrorResponse> {
    let store = SqlCatalogStore::new(state.pool.clone());
    let machine = store
        .machine_by_code(&code)
        .await
        .map_err(store_error)?
        .filter(|machine| machine.active)
        .ok_or_else(|| store_error(StoreError::not_found("machine", &code)))?;
    Ok(Json(machine))
}

async fn list_machines_admin(
    Query(query): Query<MachineQuery>,
    State(state): State<AppState>,
) -> Result<Json<MachinePage>, ErrorResponse> {
    let store = SqlCatalogStore::new(state.pool.clone());
    let page = store
        .list_machines(MachineFilter {
            category: query.category,
            active: query.active,
            limit: query.limit,
            offset: query.offset,
        })
        .await
        .map_err(store_error)?;
    Ok(Json(page))
}

async fn upsert_machine(
    State(state): State<AppState>,
    Json(draft): Json<MachineDraft>,
) -> Result<Json<UpsertMachineResponse>, ErrorResponse> {
    let store = SqlCatalogStore::new(state.pool.clone());
    let result = store.upsert_machine(draft).await.map_err(store_error)?;

    info!(
        event_name = "catalog.machine.upserted",
        machine_code = %result.machine.code,
        created = result.created,
        "machine upserted"
    );
    Ok(Json(UpsertMachineResponse { machine: result.machine, created: result.created }))
}

async fn deactivate_machine(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, ErrorResponse> {
    let store = SqlCatalogStore::new(state.pool.clone());
    store.deactivate_machine(&code).await.map_err(store_error)?;

    info!(event_name = "catalog.machine.deactivated", machine_code = %code, "machine deactivated");
    Ok(Json(MessageResponse { message: format!("machine {code} deactivated") }))
}

async fn list_active_options(
    State(state): State<AppState>,
) -> Result<Json<Vec<MachineOption>>, ErrorResponse> {
    let store = SqlCatalogStore::new(state.pool.clone());
    Ok(Json(store.list_options(false).await.map_err(store_error)?))
}

async fn list_options_admin(
    State(state): State<AppState>,
) -> Result<Json<Vec<MachineOption>>, ErrorResponse> {
    let store = SqlCatalogStore::new(state.pool.clone());
    Ok(Json(store.list_options(true).await.map_err(store_error)?))
}

async fn upsert_option(
    State(state): State<AppState>,
    Json(draft): Json<OptionDraft>,
) -> Result<Json<MachineOption>, ErrorResponse> {
    let store = SqlCatalogStore::new(state.pool.clone());
    Ok(Json(store.upsert_option(draft).await.map_err(store_error)?))
}

async fn deactivate_option(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, ErrorResponse> {
    let store = SqlCatalogStore::new(state.pool.clone());
    store.deactivate_option(id).await.map_err(store_error)?;
    Ok(Json(MessageResponse { message: format!("option {id} deactivated") }))
}

async fn list_active_conditions(
    State(state): State<AppState>,
) -> Result<Json<Vec<PaymentCondition>>, ErrorResponse> {
    let store = SqlCatalogStore::new(state.pool.clone());
    Ok(Json(store.list_payment_conditions(true).await.map_err(store_error)?))
}

async fn list_conditions_admin(
    State(state): State<AppState>,
) -> Result<Json<Vec<PaymentCondition>>, ErrorResponse> {
    let store = SqlCatalogStore::new(state.pool.clone());
    Ok(Json(store.list_payment_conditions(false).await.map_err(store_error)?))
}

async fn upsert_condition(
    State(state): State<AppState>,
    Json(draft): Json<ConditionDraft>,
) -> Result<Json<PaymentCondition>, ErrorResponse> {
    let store = SqlCatalogStore::new(state.pool.clone());
    Ok(Json(store.upsert_payment_condition(draft).await.map_err(store_error)?))
}

async fn deactivate_condition(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, ErrorResponse> {
    let store = SqlCatalogStore::new(state.pool.clone());
    store.deactivate_payment_condition(id).await.map_err(store_error)?;
    Ok(Json(MessageResponse { message: format!("payment condition {id} deactivated") }))
}

async fn current_rate(
    State(state): State<AppState>,
) -> Result<Json<RateResponse>, ErrorResponse> {
    let store = SqlExchangeRateStore::new(state.pool.clone());
    let current = store.current().await.map_err(store_error)?;
    Ok(Json(match current {
        Some(rate) => RateResponse {
            rate: Some(rate.rate),
            source: Some(rate.source),
            fetched_at: Some(rate.fetched_at.to_rfc3339()),
        },
        None => RateResponse { rate: None, source: None, fetched_at: None },
    }))
}

async fn record_manual_rate(
    State(state): State<AppState>,
    Json(request): Json<ManualRateRequest>,
) -> Result<Json<RateResponse>, ErrorResponse> {
    let store = SqlExchangeRateStore::new(state.pool.clone());
    let recorded =
        store.record(request.rate, RateSource::Manual).await.map_err(store_error)?;

    info!(event_name = "catalog.exchange_rate.recorded", rate = %recorded.rate, "manual rate saved");
    Ok(Json(RateResponse {
        rate: Some(recorded.rate),
        source: Some(recorded.source),
        fetched_at: Some(recorded.fetched_at.to_rfc3339()),
    }))
}
