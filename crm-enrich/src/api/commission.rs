//! Commission split endpoint

use crate::services::commission::{resolve_agent_split, CommissionError, CommissionSplit};
use crate::{ApiResult, AppState};
use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tracing::warn;

/// Split returned to callers, with where it came from
#[derive(Debug, Serialize)]
pub struct CommissionSplitResponse {
    pub agent_id: String,
    pub agent_pct: f64,
    pub house_pct: f64,
    /// "plan" for a stored plan, "default" for the brokerage standard
    pub source: &'static str,
}

/// GET /api/agents/:id/commission_split
///
/// Agents without a plan get the standard 70/30 split marked `"default"`.
/// A malformed stored plan is reported (422) rather than papered over.
pub async fn get_commission_split(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
) -> ApiResult<Json<CommissionSplitResponse>> {
    let (split, source) = match resolve_agent_split(&state.db, &agent_id).await {
        Ok(split) => (split, "plan"),
        Err(CommissionError::NoPlan(_)) => (CommissionSplit::STANDARD, "default"),
        Err(e) => {
            warn!(agent_id = %agent_id, error = %e, "Commission split unavailable");
            return Err(e.into());
        }
    };

    Ok(Json(CommissionSplitResponse {
        agent_id,
        agent_pct: split.agent_pct,
        house_pct: split.house_pct,
        source,
    }))
}

/// Build commission routes
pub fn commission_routes() -> Router<AppState> {
    Router::new().route("/api/agents/:id/commission_split", get(get_commission_split))
}
