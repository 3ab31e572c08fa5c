//! Message relay endpoint

use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::infrastructure::access_key::SendOutcome;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    #[serde(default)]
    pub access_key: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    pub success: bool,
}

/// POST /api/send
pub async fn send_message(
    State(state): State<AppState>,
    Json(request): Json<SendMessageRequest>,
) -> Result<Json<SendMessageResponse>, ApiError> {
    if request.access_key.is_empty() {
        return Err(ApiError::bad_request("accessKey is required"));
    }
    if request.message.is_empty() {
        return Err(ApiError::bad_request("message is required"));
    }

    match state
        .access_key_service
        .send_message(&request.access_key, &request.message)
        .await
    {
        SendOutcome::Delivered => Ok(Json(SendMessageResponse { success: true })),
        SendOutcome::Invalid => {
            Err(ApiError::forbidden("Invalid access key").with_code("invalid_key"))
        }
        SendOutcome::Expired => {
            Err(ApiError::forbidden("Access key has expired").with_code("expired_key"))
        }
        SendOutcome::RelayFailed(e) => Err(e.into()),
    }
}
