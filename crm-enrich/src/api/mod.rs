//! HTTP API handlers for crm-enrich
//!
//! REST endpoints for enrichment, settings and commission lookups, plus an
//! SSE stream of enrichment events.

pub mod commission;
pub mod enrichment;
pub mod health;
pub mod settings;
pub mod sse;

pub use commission::commission_routes;
pub use enrichment::enrichment_routes;
pub use health::health_routes;
pub use settings::settings_routes;
pub use sse::event_stream;
