//! Enrichment endpoints
//!
//! - `POST /api/contacts/:id/enrich` runs the pipeline ("Verify & Enrich")
//! - `GET /api/contacts/:id/enrichment` returns the stored profile

use crate::db::profiles::{self, EnrichmentProfile};
use crate::workflow::{EnrichError, EnrichmentReport};
use crate::{ApiError, ApiResult, AppState};
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use tracing::info;

/// POST /api/contacts/:id/enrich
///
/// **Errors:**
/// - 404 Not Found: contact does not exist
/// - 500 Internal Server Error: contact could not be loaded
///
/// A failed database write after scoring is not an error; the report comes
/// back with `persisted: false`.
pub async fn enrich_contact(
    State(state): State<AppState>,
    Path(contact_id): Path<String>,
) -> ApiResult<Json<EnrichmentReport>> {
    info!(contact_id = %contact_id, "Enrichment requested");

    let pipeline = state.pipeline().await;
    match pipeline.enrich_contact(&contact_id).await {
        Ok(report) => {
            if !report.persisted {
                state
                    .record_error(format!(
                        "Enrichment for contact {} was not persisted",
                        contact_id
                    ))
                    .await;
            }
            Ok(Json(report))
        }
        Err(e @ EnrichError::Database(_)) => {
            state.record_error(e.to_string()).await;
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}

/// GET /api/contacts/:id/enrichment
pub async fn get_enrichment(
    State(state): State<AppState>,
    Path(contact_id): Path<String>,
) -> ApiResult<Json<EnrichmentProfile>> {
    profiles::latest_profile(&state.db, &contact_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Enrichment profile for contact {}", contact_id)))
}

/// Build enrichment routes
pub fn enrichment_routes() -> Router<AppState> {
    Router::new()
        .route("/api/contacts/:id/enrich", post(enrich_contact))
        .route("/api/contacts/:id/enrichment", get(get_enrichment))
}
