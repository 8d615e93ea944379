//! Quotation endpoints: pricing + auditable record creation, listing and
//! soft-delete management.
//!
//! - `POST   /quotations`                    — price line items and persist the quote
//! - `GET    /quotations`                    — newest-first listing with search
//! - `GET    /quotations/stats`              — admin dashboard counters
//! - `DELETE /admin/quotations/{id}`         — soft delete (idempotent)
//! - `POST   /admin/quotations/{id}/restore` — clear soft-delete state

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use cotiza_core::domain::quotation::MULTI_MACHINE_CODE;
use cotiza_core::pricing::{self, LineItem, PricedLine, QuoteTotals};
use cotiza_core::{
    CatalogStore, ClientInfo, Machine, Quotation, QuotationDraft, QuotationFilter, QuotationPage,
    QuotationStats, QuotationStore, StoreError,
};
use cotiza_db::{SqlCatalogStore, SqlQuotationStore};

use crate::api::{error_response, store_error, AppState, ErrorResponse};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/quotations", post(create_quotation).get(list_quotations))
        .route("/quotations/stats", get(quotation_stats))
        .route("/admin/quotations/{id}", delete(soft_delete_quotation))
        .route("/admin/quotations/{id}/restore", post(restore_quotation))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateQuotationRequest {
    line_items: Vec<LineItem>,
    #[serde(default)]
    option_ids: Vec<i64>,
    client_name: String,
    client_tax_id: String,
    #[serde(default)]
    client_phone: Option<String>,
    #[serde(default)]
    client_email: Option<String>,
    #[serde(default)]
    client_company: Option<String>,
    #[serde(default)]
    client_address: Option<String>,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    client_discount_percent: Decimal,
    #[serde(default)]
    additional_discount_percent: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QuotationPricing {
    lines: Vec<PricedLine>,
    grand_subtotal: Decimal,
    options_total: Decimal,
    #[serde(flatten)]
    totals: QuoteTotals,
}

#[derive(Debug, Serialize)]
struct CreateQuotationResponse {
    quotation: Quotation,
    pricing: QuotationPricing,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteRequest {
    #[serde(default)]
    deleted_by: Option<String>,
}

#[derive(Debug, Serialize)]
struct MessageResponse {
    message: String,
}

async fn create_quotation(
    State(state): State<AppState>,
    Json(request): Json<CreateQuotationRequest>,
) -> Result<Json<CreateQuotationResponse>, ErrorResponse> {
    if request.line_items.is_empty() {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "a quotation needs at least one line item",
        ));
    }
    if request.client_name.trim().is_empty() || request.client_tax_id.trim().is_empty() {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "client name and tax id are required",
        ));
    }

    let catalog = SqlCatalogStore::new(state.pool.clone());
    let machines = resolve_machines(&catalog, &request.line_items).await?;
    let selected_options = resolve_options(&catalog, &request.option_ids).await?;

    // Unit prices come from the catalog as tagged; no currency conversion.
    let lookup = |code: &str| machines.get(code).and_then(|machine| machine.price);
    let breakdown = pricing::price(&request.line_items, Decimal::ZERO, &lookup);

    let options_total: Decimal = selected_options
        .iter()
        .map(|(_, name_price)| name_price.1.unwrap_or(Decimal::ZERO))
        .sum();
    let totals = pricing::quote_totals(
        breakdown.grand_subtotal,
        options_total,
        request.client_discount_percent,
        request.additional_discount_percent,
    );

    let machine_code = if request.line_items.len() == 1 {
        request.line_items[0].machine_code.clone()
    } else {
        MULTI_MACHINE_CODE.to_string()
    };

    let options_data = json!({
        "items": breakdown.lines.iter().map(|line| {
            let machine_name = machines
                .get(&line.machine_code)
                .map(|machine| machine.name.clone())
                .unwrap_or_default();
            json!({
                "machine_code": line.machine_code,
                "machine_name": machine_name,
                "quantity": line.quantity,
                "unit_price": line.unit_price,
                "subtotal": line.subtotal,
            })
        }).collect::<Vec<_>>(),
        "options": selected_options.iter().map(|(id, (name, price))| json!({
            "id": id,
            "name": name,
            "price": price,
        })).collect::<Vec<_>>(),
        "totals": {
            "machines_subtotal": breakdown.grand_subtotal,
            "options_total": options_total,
            "original_price": totals.original_price,
            "total_discount_percent": totals.total_discount_percent,
            "final_price": totals.final_price,
        },
    });

    let draft = QuotationDraft {
        machine_code,
        client: ClientInfo {
            name: request.client_name.trim().to_string(),
            tax_id: request.client_tax_id.trim().to_string(),
            phone: request.client_phone,
            email: request.client_email,
            company: request.client_company,
            address: request.client_address,
        },
        notes: request.notes,
        client_discount_percent: pricing::clamp_discount(request.client_discount_percent),
        additional_discount_percent: pricing::clamp_discount(request.additional_discount_percent),
        total_discount_percent: totals.total_discount_percent,
        original_price: totals.original_price,
        final_price: totals.final_price,
        options_data: Some(options_data.to_string()),
        options_total,
    };

    let store = SqlQuotationStore::new(state.pool.clone());
    let quotation = store.create(draft).await.map_err(store_error)?;

    info!(
        event_name = "quotation.created",
        quotation_id = quotation.id,
        machine_code = %quotation.machine_code,
        final_price = %quotation.final_price,
        "quotation persisted"
    );

    Ok(Json(CreateQuotationResponse {
        quotation,
        pricing: QuotationPricing {
            lines: breakdown.lines,
            grand_subtotal: breakdown.grand_subtotal,
            options_total,
            totals,
        },
    }))
}

/// All quoted machines must exist and be active; the engine's zero-price
/// fallback is a last line of defense, not the API contract.
async fn resolve_machines(
    catalog: &SqlCatalogStore,
    line_items: &[LineItem],
) -> Result<HashMap<String, Machine>, ErrorResponse> {
    let mut machines = HashMap::new();
    let mut missing: Vec<String> = Vec::new();

    for item in line_items {
        if machines.contains_key(&item.machine_code) {
            continue;
        }
        match catalog.machine_by_code(&item.machine_code).await.map_err(store_error)? {
            Some(machine) if machine.active => {
                machines.insert(item.machine_code.clone(), machine);
            }
            _ => missing.push(item.machine_code.clone()),
        }
    }

    if missing.is_empty() {
        Ok(machines)
    } else {
        Err(error_response(
            StatusCode::NOT_FOUND,
            format!("machines not found: {}", missing.join(", ")),
        ))
    }
}

type SelectedOption = (i64, (String, Option<Decimal>));

async fn resolve_options(
    catalog: &SqlCatalogStore,
    option_ids: &[i64],
) -> Result<Vec<SelectedOption>, ErrorResponse> {
    if option_ids.is_empty() {
        return Ok(Vec::new());
    }

    let available = catalog.list_options(false).await.map_err(store_error)?;
    let mut selected = Vec::with_capacity(option_ids.len());
    for id in option_ids {
        let option = available
            .iter()
            .find(|option| option.id == *id)
            .ok_or_else(|| store_error(StoreError::not_found("option", id.to_string())))?;
        selected.push((option.id, (option.name.clone(), option.price)));
    }
    Ok(selected)
}

async fn list_quotations(
    Query(filter): Query<QuotationFilter>,
    State(state): State<AppState>,
) -> Result<Json<QuotationPage>, ErrorResponse> {
    let store = SqlQuotationStore::new(state.pool.clone());
    Ok(Json(store.list(filter).await.map_err(store_error)?))
}

async fn quotation_stats(
    State(state): State<AppState>,
) -> Result<Json<QuotationStats>, ErrorResponse> {
    let store = SqlQuotationStore::new(state.pool.clone());
    Ok(Json(store.stats().await.map_err(store_error)?))
}

async fn soft_delete_quotation(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    body: Option<Json<DeleteRequest>>,
) -> Result<Json<MessageResponse>, ErrorResponse> {
    let actor = body
        .and_then(|Json(request)| request.deleted_by)
        .unwrap_or_else(|| "admin".to_string());

    let store = SqlQuotationStore::new(state.pool.clone());
    store.soft_delete(id, &actor).await.map_err(store_error)?;

    info!(event_name = "quotation.soft_deleted", quotation_id = id, deleted_by = %actor, "quotation hidden");
    Ok(Json(MessageResponse { message: format!("quotation {id} deleted") }))
}

async fn restore_quotation(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, ErrorResponse> {
    let store = SqlQuotationStore::new(state.pool.clone());
    store.restore(id).await.map_err(store_error)?;

    info!(event_name = "quotation.restored", quotation_id = id, "quotation restored");
    Ok(Json(MessageResponse { message: format!("quotation {id} restored") }))
}
