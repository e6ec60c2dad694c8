//! Bootstrap configuration loading and root folder resolution
//!
//! Two tiers of configuration exist:
//! 1. **TOML bootstrap**: root folder, port, logging, provider credentials
//! 2. **Database runtime**: the `settings` table, owned by each service
//!
//! Root folder priority order:
//! 1. Command-line argument (highest priority)
//! 2. `CRM_ROOT_FOLDER` environment variable
//! 3. TOML config file `root_folder` key
//! 4. OS-dependent compiled default (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable consulted for the root folder
pub const ROOT_FOLDER_ENV: &str = "CRM_ROOT_FOLDER";

/// Database file created inside the root folder
pub const DATABASE_FILE_NAME: &str = "crm.db";

/// Bootstrap configuration loaded from TOML
///
/// These settings cannot change while a service is running.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Root folder holding the service database
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_folder: Option<PathBuf>,

    /// HTTP server port (service default when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// People Data Labs API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdl_api_key: Option<String>,

    /// Apollo API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apollo_api_key: Option<String>,

    /// Socrata application token for NYC Open Data (optional, raises quota)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pluto_app_token: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (logs to stderr if not specified)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Compiled-in root folder used when nothing else is configured
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
}

impl CompiledDefaults {
    /// Defaults for the platform this binary was built for
    pub fn for_current_platform() -> Self {
        Self {
            root_folder: default_root_folder(),
        }
    }
}

/// Get OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/crm (or /var/lib/crm for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join("crm"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/crm"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("crm"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/crm"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("crm"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\crm"))
    } else {
        PathBuf::from("./crm_data")
    }
}

/// Default TOML path for a service: `<config dir>/crm/<module>.toml`
pub fn default_config_path(module_name: &str) -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("crm").join(format!("{}.toml", module_name)))
}

/// Load a TOML bootstrap config
///
/// A missing file is not an error: a warning is logged and defaults are used.
/// A file that exists but fails to parse is a configuration error.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        warn!(
            "Config file {} not found, using built-in defaults",
            path.display()
        );
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed: {}", e)))?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;

    debug!(path = %path.display(), "Loaded TOML config");
    Ok(config)
}

/// Write a TOML bootstrap config atomically (temp file + rename)
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    let tmp_path = path.with_extension("toml.tmp");
    std::fs::write(&tmp_path, content)?;
    std::fs::rename(&tmp_path, path)?;

    Ok(())
}

/// Resolves the root folder following the documented priority order
pub struct RootFolderResolver {
    module_name: String,
    cli_arg: Option<PathBuf>,
    config_path: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(module_name: &str) -> Self {
        Self {
            module_name: module_name.to_string(),
            cli_arg: None,
            config_path: default_config_path(module_name),
        }
    }

    /// Root folder given on the command line
    pub fn with_cli_arg(mut self, cli_arg: Option<PathBuf>) -> Self {
        self.cli_arg = cli_arg;
        self
    }

    /// Override the TOML file consulted at priority 3
    pub fn with_config_path(mut self, config_path: Option<PathBuf>) -> Self {
        if config_path.is_some() {
            self.config_path = config_path;
        }
        self
    }

    pub fn resolve(&self) -> PathBuf {
        // Priority 1: Command-line argument
        if let Some(path) = &self.cli_arg {
            info!("Root folder from command line: {}", path.display());
            return path.clone();
        }

        // Priority 2: Environment variable
        if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
            if !path.trim().is_empty() {
                info!("Root folder from {}: {}", ROOT_FOLDER_ENV, path);
                return PathBuf::from(path);
            }
        }

        // Priority 3: TOML config file
        if let Some(config_path) = &self.config_path {
            if config_path.exists() {
                match load_toml_config(config_path) {
                    Ok(TomlConfig {
                        root_folder: Some(root_folder),
                        ..
                    }) => {
                        info!("Root folder from TOML config: {}", root_folder.display());
                        return root_folder;
                    }
                    Ok(_) => {}
                    Err(e) => warn!(
                        module = %self.module_name,
                        "Ignoring unreadable config {}: {}",
                        config_path.display(),
                        e
                    ),
                }
            }
        }

        // Priority 4: OS-dependent compiled default
        let root_folder = CompiledDefaults::for_current_platform().root_folder;
        info!("Root folder from compiled default: {}", root_folder.display());
        root_folder
    }
}

/// Creates the root folder and locates the database inside it
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    pub fn ensure_directory_exists(&self) -> Result<()> {
        if !self.root_folder.exists() {
            std::fs::create_dir_all(&self.root_folder)?;
            info!("Created root folder: {}", self.root_folder.display());
        }
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE_NAME)
    }
}
