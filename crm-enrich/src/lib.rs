//! crm-enrich library interface
//!
//! Contact enrichment and lead scoring for the brokerage CRM. Exposes the
//! pipeline, its building blocks and the HTTP router for integration testing.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod fusion;
pub mod providers;
pub mod scoring;
pub mod services;
pub mod types;
pub mod workflow;

pub use crate::error::{ApiError, ApiResult};

use crate::config::ProviderKey;
use crate::providers::{ApolloClient, PdlClient, ProviderError};
use crate::workflow::{EnrichmentPipeline, Providers};
use axum::Router;
use chrono::{DateTime, Utc};
use crm_common::events::EventBus;
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    /// Active provider clients; replaced when an API key changes
    pub providers: Arc<RwLock<Providers>>,
    /// TOML file that receives settings backups (None disables the sync)
    pub toml_path: Option<PathBuf>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last error for diagnostic purposes
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(db: SqlitePool, event_bus: EventBus, providers: Providers) -> Self {
        Self {
            db,
            event_bus,
            providers: Arc::new(RwLock::new(providers)),
            toml_path: None,
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }

    pub fn with_toml_path(mut self, toml_path: PathBuf) -> Self {
        self.toml_path = Some(toml_path);
        self
    }

    /// Pipeline over a snapshot of the current providers
    pub async fn pipeline(&self) -> EnrichmentPipeline {
        let providers = self.providers.read().await.clone();
        EnrichmentPipeline::with_events(self.db.clone(), providers, self.event_bus.clone())
    }

    /// Rebuild the client for `provider` with a new API key
    pub async fn install_provider_key(
        &self,
        provider: ProviderKey,
        api_key: String,
    ) -> Result<(), ProviderError> {
        let mut providers = self.providers.write().await;
        match provider {
            ProviderKey::Pdl => providers.identity = Some(Arc::new(PdlClient::new(api_key)?)),
            ProviderKey::Apollo => providers.graph = Some(Arc::new(ApolloClient::new(api_key)?)),
        }
        Ok(())
    }

    pub async fn record_error(&self, message: String) {
        *self.last_error.write().await = Some(message);
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .merge(api::enrichment_routes())
        .merge(api::commission_routes())
        .merge(api::settings_routes())
        .merge(api::health_routes())
        .route("/events", get(api::event_stream))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}
