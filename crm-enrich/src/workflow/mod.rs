//! Enrichment workflow orchestration

pub mod pipeline;

pub use pipeline::{EnrichError, EnrichmentPipeline, EnrichmentReport, Providers};
