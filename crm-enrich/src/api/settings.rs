//! Settings API endpoint
//!
//! `POST /api/settings/{provider}_api_key` for `pdl` and `apollo`.

use crate::config::{is_valid_key, sync_settings_to_toml, ProviderKey};
use crate::{ApiError, ApiResult, AppState};
use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{info, warn};

/// Request payload for setting a provider API key
#[derive(Debug, Deserialize)]
pub struct SetApiKeyRequest {
    pub api_key: String,
}

/// Response payload for API key configuration
#[derive(Debug, Serialize)]
pub struct SetApiKeyResponse {
    pub success: bool,
    pub message: String,
}

/// POST /api/settings/:setting
///
/// **Request:** `{"api_key": "..."}`
///
/// **Behavior:**
/// 1. Validate key (non-empty, non-whitespace)
/// 2. Write to database (authoritative)
/// 3. Replace the running provider client
/// 4. Sync to TOML (best-effort backup)
///
/// **Errors:**
/// - 404 Not Found: unknown setting
/// - 400 Bad Request: empty or whitespace-only key
/// - 500 Internal Server Error: database write or client construction failed
pub async fn set_provider_api_key(
    State(state): State<AppState>,
    Path(setting): Path<String>,
    Json(payload): Json<SetApiKeyRequest>,
) -> ApiResult<Json<SetApiKeyResponse>> {
    let provider = setting
        .strip_suffix("_api_key")
        .and_then(ProviderKey::from_name)
        .ok_or_else(|| ApiError::NotFound(format!("Setting {}", setting)))?;

    if !is_valid_key(&payload.api_key) {
        return Err(ApiError::BadRequest(
            "API key cannot be empty or whitespace-only".to_string(),
        ));
    }
    let api_key = payload.api_key.trim().to_string();

    provider
        .store_in_db(&state.db, api_key.clone())
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to save API key to database: {}", e)))?;

    state
        .install_provider_key(provider, api_key.clone())
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to build {} client: {}", provider, e)))?;

    info!("{} API key configured via API", provider);

    if let Some(toml_path) = &state.toml_path {
        let mut settings = HashMap::new();
        settings.insert(provider.setting_key().to_string(), api_key);
        if let Err(e) = sync_settings_to_toml(settings, toml_path).await {
            warn!("TOML sync failed (database write succeeded): {}", e);
        }
    }

    Ok(Json(SetApiKeyResponse {
        success: true,
        message: format!("{} API key configured successfully", provider),
    }))
}

/// Build settings routes
pub fn settings_routes() -> Router<AppState> {
    Router::new().route("/api/settings/:setting", post(set_provider_api_key))
}
