//! Server-Sent Events for enrichment progress

use crate::AppState;
use axum::{
    extract::{Query, State},
    response::sse::{Event, Sse},
};
use futures::stream::Stream;
use serde::Deserialize;
use std::convert::Infallible;

/// Optional filter for `/events`
#[derive(Debug, Deserialize)]
pub struct EventStreamQuery {
    /// Only stream events about this contact
    pub contact_id: Option<String>,
}

/// GET /events[?contact_id=...]
///
/// Streams EnrichmentStarted, EnrichmentStageCompleted, EnrichmentCompleted
/// and EnrichmentFailed.
pub async fn event_stream(
    State(state): State<AppState>,
    Query(query): Query<EventStreamQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    crm_common::sse::create_event_sse_stream("crm-enrich", &state.event_bus, query.contact_id)
}
