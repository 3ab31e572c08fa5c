//! Panel login check

use axum::extract::State;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
}

/// POST /api/auth
///
/// Stateless: the panel keeps sending the same credentials as HTTP Basic
/// auth on every management call.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    if !state.panel.is_configured() {
        return Err(ApiError::internal("Panel credentials are not configured"));
    }

    if !state.panel.verify(&request.username, &request.password) {
        warn!("Panel login failed");
        return Err(ApiError::unauthorized("Invalid username or password"));
    }

    info!(username = %request.username, "Panel login succeeded");
    Ok(Json(LoginResponse { success: true }))
}
