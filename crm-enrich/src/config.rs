//! Configuration resolution for crm-enrich
//!
//! Provider API keys resolve with Database → ENV → TOML priority.

use crm_common::config::{load_toml_config, write_toml_config, TomlConfig};
use crm_common::Result;
use sqlx::{Pool, Sqlite};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use tracing::{info, warn};

/// Providers whose API key is user-configurable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKey {
    Pdl,
    Apollo,
}

impl ProviderKey {
    pub const ALL: [ProviderKey; 2] = [ProviderKey::Pdl, ProviderKey::Apollo];

    /// Parse the provider segment of `/api/settings/{provider}_api_key`
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "pdl" => Some(ProviderKey::Pdl),
            "apollo" => Some(ProviderKey::Apollo),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ProviderKey::Pdl => "pdl",
            ProviderKey::Apollo => "apollo",
        }
    }

    /// Key in the settings table (also the TOML field name)
    pub fn setting_key(&self) -> &'static str {
        match self {
            ProviderKey::Pdl => "pdl_api_key",
            ProviderKey::Apollo => "apollo_api_key",
        }
    }

    pub fn env_var(&self) -> &'static str {
        match self {
            ProviderKey::Pdl => "CRM_PDL_API_KEY",
            ProviderKey::Apollo => "CRM_APOLLO_API_KEY",
        }
    }

    fn toml_value<'a>(&self, config: &'a TomlConfig) -> Option<&'a String> {
        match self {
            ProviderKey::Pdl => config.pdl_api_key.as_ref(),
            ProviderKey::Apollo => config.apollo_api_key.as_ref(),
        }
    }

    fn set_toml_value(&self, config: &mut TomlConfig, value: String) {
        match self {
            ProviderKey::Pdl => config.pdl_api_key = Some(value),
            ProviderKey::Apollo => config.apollo_api_key = Some(value),
        }
    }

    async fn load_from_db(&self, db: &Pool<Sqlite>) -> Result<Option<String>> {
        match self {
            ProviderKey::Pdl => crate::db::settings::get_pdl_api_key(db).await,
            ProviderKey::Apollo => crate::db::settings::get_apollo_api_key(db).await,
        }
    }

    pub async fn store_in_db(&self, db: &Pool<Sqlite>, key: String) -> Result<()> {
        match self {
            ProviderKey::Pdl => crate::db::settings::set_pdl_api_key(db, key).await,
            ProviderKey::Apollo => crate::db::settings::set_apollo_api_key(db, key).await,
        }
    }
}

impl fmt::Display for ProviderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Resolve a provider API key
///
/// **Priority:** Database → ENV → TOML. Returns None when no source holds a
/// usable key; the provider is then skipped by the pipeline.
pub async fn resolve_provider_key(
    db: &Pool<Sqlite>,
    toml_config: &TomlConfig,
    provider: ProviderKey,
) -> Result<Option<String>> {
    let db_key = provider.load_from_db(db).await?.filter(|k| is_valid_key(k));
    let env_key = std::env::var(provider.env_var()).ok().filter(|k| is_valid_key(k));
    let toml_key = provider.toml_value(toml_config).filter(|k| is_valid_key(k)).cloned();

    let sources: Vec<&str> = [
        db_key.as_ref().map(|_| "database"),
        env_key.as_ref().map(|_| "environment"),
        toml_key.as_ref().map(|_| "TOML"),
    ]
    .into_iter()
    .flatten()
    .collect();

    if sources.len() > 1 {
        warn!(
            "{} API key found in multiple sources: {}. Using {} (highest priority).",
            provider,
            sources.join(", "),
            sources[0]
        );
    }

    if let Some(key) = db_key {
        info!("{} API key loaded from database", provider);
        return Ok(Some(key));
    }
    if let Some(key) = env_key {
        info!("{} API key loaded from environment variable", provider);
        return Ok(Some(key));
    }
    if let Some(key) = toml_key {
        info!("{} API key loaded from TOML config", provider);
        return Ok(Some(key));
    }

    warn!(
        "{} API key not configured (set {} or {} in TOML, or POST /api/settings/{}_api_key); \
         provider disabled",
        provider,
        provider.env_var(),
        provider.setting_key(),
        provider.name()
    );
    Ok(None)
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Copy database settings into the TOML file as a backup
///
/// Map keys are settings-table keys (`pdl_api_key`, `apollo_api_key`). A
/// failed TOML write is logged and not an error: the database is authoritative.
pub async fn sync_settings_to_toml(
    settings: HashMap<String, String>,
    toml_path: &Path,
) -> Result<()> {
    let mut config = load_toml_config(toml_path)?;

    for provider in ProviderKey::ALL {
        if let Some(value) = settings.get(provider.setting_key()) {
            provider.set_toml_value(&mut config, value.clone());
        }
    }

    match write_toml_config(&config, toml_path) {
        Ok(()) => {
            info!("Settings synced to TOML: {}", toml_path.display());
            Ok(())
        }
        Err(e) => {
            warn!("TOML write failed (database write succeeded): {}", e);
            Ok(())
        }
    }
}
