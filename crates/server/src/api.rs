//! Shared HTTP-layer state and error mapping.

use std::sync::Arc;

use axum::{http::StatusCode, Json};
use cotiza_core::config::AppConfig;
use cotiza_core::StoreError;
use cotiza_db::DbPool;
use serde::Serialize;

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(pool: DbPool, config: AppConfig) -> Self {
        Self { pool, config: Arc::new(config) }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
}

pub type ErrorResponse = (StatusCode, Json<ApiError>);

pub fn error_response(status: StatusCode, message: impl Into<String>) -> ErrorResponse {
    (status, Json(ApiError { error: message.into() }))
}

pub fn store_error(error: StoreError) -> ErrorResponse {
    let status = match &error {
        StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
        StoreError::Validation(_) => StatusCode::BAD_REQUEST,
        StoreError::Backend(_) => StatusCode::SERVICE_UNAVAILABLE,
    };
    error_response(status, error.to_string())
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use cotiza_core::StoreError;

    use super::store_error;

    #[test]
    fn store_errors_map_to_http_status_codes() {
        assert_eq!(store_error(StoreError::not_found("machine", "X")).0, StatusCode::NOT_FOUND);
        assert_eq!(
            store_error(StoreError::Validation("bad".to_string())).0,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            store_error(StoreError::Backend("down".to_string())).0,
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
