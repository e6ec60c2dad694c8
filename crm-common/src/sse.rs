//! Server-Sent Events (SSE) utilities
//!
//! Shared SSE implementation forwarding EventBus traffic to HTTP clients.

use crate::events::{CrmEvent, EventBus};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

/// Create an SSE stream forwarding events from the bus
///
/// When `contact_filter` is set, only events about that contact are sent.
///
/// # Example
/// ```rust,ignore
/// pub async fn event_stream(
///     State(state): State<AppState>,
/// ) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
///     crm_common::sse::create_event_sse_stream("crm-enrich", &state.event_bus, None)
/// }
/// ```
pub fn create_event_sse_stream(
    service_name: &'static str,
    event_bus: &EventBus,
    contact_filter: Option<String>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!("New SSE client connected to {} events", service_name);

    let mut rx = event_bus.subscribe();

    let stream = async_stream::stream! {
        info!("SSE: {} event stream started", service_name);

        yield Ok(Event::default()
            .event("ConnectionStatus")
            .data("connected"));

        loop {
            match rx.recv().await {
                Ok(event) => {
                    if let Some(contact_id) = &contact_filter {
                        if event.contact_id() != contact_id {
                            continue;
                        }
                    }
                    if let Some(sse_event) = to_sse_event(&event) {
                        yield Ok(sse_event);
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("SSE: client lagged, {} events skipped", skipped);
                }
                Err(RecvError::Closed) => {
                    debug!("SSE: event bus closed, ending stream");
                    break;
                }
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(HEARTBEAT_INTERVAL)
            .text("heartbeat"),
    )
}

fn to_sse_event(event: &CrmEvent) -> Option<Event> {
    let event_type = event.event_type();
    match serde_json::to_string(event) {
        Ok(event_json) => {
            debug!("SSE: Broadcasting event: {}", event_type);
            Some(Event::default().event(event_type).data(event_json))
        }
        Err(e) => {
            warn!("SSE: Failed to serialize event {}: {}", event_type, e);
            None
        }
    }
}
