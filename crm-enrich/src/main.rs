//! crm-enrich - Contact Enrichment & Lead Scoring Microservice
//!
//! **Module Identity:**
//! - Name: crm-enrich
//! - Default port: 5810
//!
//! Runs "Verify & Enrich" for CRM contacts: identity resolution, graph
//! lookups, property records cross-reference, lead scoring and persistence.

use anyhow::{Context, Result};
use clap::Parser;
use crm_common::config::{
    default_config_path, load_toml_config, RootFolderInitializer, RootFolderResolver, TomlConfig,
};
use crm_common::events::EventBus;
use crm_enrich::config::{resolve_provider_key, ProviderKey};
use crm_enrich::providers::{ApolloClient, PdlClient, PlutoClient};
use crm_enrich::workflow::Providers;
use crm_enrich::{build_router, AppState};
use sqlx::SqlitePool;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const MODULE_NAME: &str = "crm-enrich";
const DEFAULT_PORT: u16 = 5810;
const EVENT_BUS_CAPACITY: usize = 100;

/// Command-line arguments for crm-enrich
#[derive(Parser, Debug)]
#[command(name = "crm-enrich")]
#[command(about = "Contact enrichment and lead scoring service")]
#[command(version)]
struct Args {
    /// Root folder holding the service database
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// Port to listen on (overrides TOML)
    #[arg(short, long, env = "CRM_ENRICH_PORT")]
    port: Option<u16>,

    /// TOML config file (default: <config dir>/crm/crm-enrich.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn init_tracing(config: &TomlConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},tower_http=info", config.logging.level)));

    match &config.logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }
    Ok(())
}

async fn build_providers(db: &SqlitePool, config: &TomlConfig) -> Result<Providers> {
    let mut providers = Providers::default();

    if let Some(key) = resolve_provider_key(db, config, ProviderKey::Pdl).await? {
        providers.identity = Some(Arc::new(PdlClient::new(key)?));
    }
    if let Some(key) = resolve_provider_key(db, config, ProviderKey::Apollo).await? {
        providers.graph = Some(Arc::new(ApolloClient::new(key)?));
    }

    // Public dataset: usable without a token
    providers.records = Some(Arc::new(PlutoClient::new(config.pluto_app_token.clone())?));

    Ok(providers)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args
        .config
        .clone()
        .or_else(|| default_config_path(MODULE_NAME));
    let toml_config = match &config_path {
        Some(path) => load_toml_config(path)?,
        None => TomlConfig::default(),
    };

    init_tracing(&toml_config)?;

    // Build identification first, before any database work
    info!(
        "Starting crm-enrich v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    if let Some(path) = &config_path {
        info!("Config file: {}", path.display());
    }

    // Root folder: CLI → ENV → TOML → compiled default
    let root_folder = RootFolderResolver::new(MODULE_NAME)
        .with_cli_arg(args.root_folder.clone())
        .with_config_path(config_path.clone())
        .resolve();

    let initializer = RootFolderInitializer::new(root_folder);
    initializer
        .ensure_directory_exists()
        .map_err(|e| anyhow::anyhow!("Failed to initialize root folder: {}", e))?;

    let db_path = initializer.database_path();
    info!("Database: {}", db_path.display());

    let db_pool = crm_enrich::db::init_database_pool(&db_path).await?;
    info!("Database connection established");

    let providers = build_providers(&db_pool, &toml_config).await?;
    let configured = providers.configured();
    if configured.is_empty() {
        warn!("No enrichment providers configured");
    } else {
        info!("Providers: {}", configured.join(", "));
    }

    let event_bus = EventBus::new(EVENT_BUS_CAPACITY);

    let mut state = AppState::new(db_pool, event_bus, providers);
    if let Some(path) = config_path {
        state = state.with_toml_path(path);
    }

    let app = build_router(state);

    let port = args.port.or(toml_config.port).unwrap_or(DEFAULT_PORT);
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
