//! Panel authentication extractor
//!
//! Management routes take HTTP Basic credentials matching the configured
//! panel username and password.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use base64::{engine::general_purpose::STANDARD, Engine};
use tracing::{debug, warn};

use crate::api::state::AppState;
use crate::api::types::ApiError;

/// Extractor that requires valid panel credentials
#[derive(Debug, Clone)]
pub struct RequirePanel {
    pub username: String,
}

impl FromRequestParts<AppState> for RequirePanel {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if !state.panel.is_configured() {
            warn!("Panel request rejected: panel credentials are not configured");
            return Err(ApiError::internal("Panel credentials are not configured"));
        }

        let (username, password) = extract_basic_credentials(&parts.headers)?;

        if !state.panel.verify(&username, &password) {
            debug!("Panel credentials rejected");
            return Err(ApiError::unauthorized("Invalid panel credentials"));
        }

        Ok(RequirePanel { username })
    }
}

fn extract_basic_credentials(headers: &HeaderMap) -> Result<(String, String), ApiError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| {
            ApiError::unauthorized("Panel credentials required. Provide 'Authorization: Basic <credentials>'")
        })?
        .to_str()
        .map_err(|_| ApiError::bad_request("Invalid Authorization header encoding"))?;

    let encoded = value
        .strip_prefix("Basic ")
        .ok_or_else(|| ApiError::unauthorized("Expected Basic authorization"))?;

    let decoded = STANDARD
        .decode(encoded.trim())
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .ok_or_else(|| ApiError::bad_request("Malformed Basic credentials"))?;

    let (username, password) = decoded
        .split_once(':')
        .ok_or_else(|| ApiError::bad_request("Malformed Basic credentials"))?;

    Ok((username.to_string(), password.to_string()))
}
