use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use crate::location::{LocationError, LocationOption, OptionsKey};

use super::state::AppState;

// ─── Error response ──────────────────────────────────────────────

#[derive(Serialize)]
struct ApiErrorBody {
    error: String,
    code: u16,
}

#[derive(Debug)]
pub struct ApiError(pub StatusCode, pub String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            error: self.1,
            code: self.0.as_u16(),
        };
        (self.0, Json(body)).into_response()
    }
}

impl From<LocationError> for ApiError {
    fn from(e: LocationError) -> Self {
        let status = match e {
            LocationError::NotFound(_) | LocationError::Offline(_) => StatusCode::NOT_FOUND,
            LocationError::MissingParent(_) => StatusCode::BAD_REQUEST,
            LocationError::Network(_) | LocationError::InvalidResponse(_) => StatusCode::BAD_GATEWAY,
        };
        ApiError(status, e.to_string())
    }
}

// ─── Option lists ────────────────────────────────────────────────

async fn list(state: &AppState, key: OptionsKey) -> Result<Json<Vec<LocationOption>>, ApiError> {
    let start = Instant::now();

    if key.parent().is_some_and(|code| code.trim().is_empty()) {
        return Err(ApiError(StatusCode::BAD_REQUEST, "Missing parent code".into()));
    }

    let options = state.directory.list(&key).await?;

    info!(
        key = %key,
        count = options.len(),
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "served options"
    );
    Ok(Json(options))
}

// GET /api/provinces
pub async fn provinces(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<LocationOption>>, ApiError> {
    list(&state, OptionsKey::Provinces).await
}

// GET /api/provinces/{code}/municipalities
pub async fn municipalities(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Json<Vec<LocationOption>>, ApiError> {
    list(&state, OptionsKey::Municipalities(code)).await
}

// GET /api/municipalities/{code}/barangays
pub async fn barangays(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Json<Vec<LocationOption>>, ApiError> {
    list(&state, OptionsKey::Barangays(code)).await
}

#[derive(Serialize)]
pub struct Health {
    status: &'static str,
    version: &'static str,
}

// GET /api/health
pub async fn health() -> Json<Health> {
    Json(Health {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
