//! Key management endpoints

use axum::{
    extract::{Query, State},
    http::StatusCode,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::api::middleware::RequirePanel;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::access_key::deserialize_chat_id;
use crate::domain::{AccessKeyRecord, KeyStatus, NewAccessKey};

/// Missing fields deserialize as empty so they fail validation with 400
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateKeyRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub bot_token: String,
    #[serde(default, deserialize_with = "deserialize_chat_id")]
    pub chat_id: String,
    #[serde(default)]
    pub days: i64,
}

impl From<CreateKeyRequest> for NewAccessKey {
    fn from(req: CreateKeyRequest) -> Self {
        NewAccessKey::new(req.name, req.bot_token, req.chat_id, req.days)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendKeyRequest {
    pub access_key: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteKeyQuery {
    pub key: Option<String>,
}

/// A stored record plus its status at response time
#[derive(Debug, Serialize)]
pub struct KeyResponse {
    #[serde(flatten)]
    pub record: AccessKeyRecord,
    pub status: KeyStatus,
}

impl From<AccessKeyRecord> for KeyResponse {
    fn from(record: AccessKeyRecord) -> Self {
        let status = record.status_at(Utc::now());
        Self { record, status }
    }
}

#[derive(Debug, Serialize)]
pub struct DeleteKeyResponse {
    pub success: bool,
}

/// GET /api/keys
pub async fn list_keys(
    _panel: RequirePanel,
    State(state): State<AppState>,
) -> Result<Json<Vec<KeyResponse>>, ApiError> {
    let keys = state.access_key_service.list_keys().await?;

    Ok(Json(keys.into_iter().map(KeyResponse::from).collect()))
}

/// POST /api/keys
pub async fn create_key(
    _panel: RequirePanel,
    State(state): State<AppState>,
    Json(request): Json<CreateKeyRequest>,
) -> Result<(StatusCode, Json<KeyResponse>), ApiError> {
    let record = state
        .access_key_service
        .create_key(request.into())
        .await?;

    Ok((StatusCode::CREATED, Json(record.into())))
}

/// PUT /api/keys
pub async fn extend_key(
    _panel: RequirePanel,
    State(state): State<AppState>,
    Json(request): Json<ExtendKeyRequest>,
) -> Result<Json<KeyResponse>, ApiError> {
    let record = state
        .access_key_service
        .extend_key(&request.access_key)
        .await?;

    Ok(Json(record.into()))
}

/// DELETE /api/keys?key=...
pub async fn delete_key(
    _panel: RequirePanel,
    State(state): State<AppState>,
    Query(query): Query<DeleteKeyQuery>,
) -> Result<Json<DeleteKeyResponse>, ApiError> {
    let key = query
        .key
        .filter(|k| !k.is_empty())
        .ok_or_else(|| ApiError::bad_request("Query parameter 'key' is required"))?;

    state.access_key_service.delete_key(&key).await?;

    Ok(Json(DeleteKeyResponse { success: true }))
}
