//! Configuration file support for mirrorselect.
//!
//! Configuration is loaded with the following precedence (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (prefixed with `MIRRORSELECT_`, e.g., `MIRRORSELECT_BACKEND_URL`)
//! 3. Config file (~/.config/mirrorselect/config.toml or ./mirrorselect.toml)
//! 4. Built-in defaults
//!
//! Example config file:
//! ```toml
//! [backend]
//! url = "https://search.example.com"
//! token = "..."  # or use MIRRORSELECT_BACKEND_TOKEN env var
//!
//! principal = "alice"
//!
//! [sync]
//! allow_sync_all = false
//! ```

use std::path::PathBuf;

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Platform backend connection.
    pub backend: BackendConfig,
    /// Principal whose selection is managed.
    pub principal: Option<String>,
    /// Default sync options.
    pub sync: SyncConfig,
}

/// Platform backend connection settings.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the platform backend.
    /// Can also be set via MIRRORSELECT_BACKEND_URL environment variable.
    pub url: Option<String>,
    /// Bearer token for the backend API.
    /// Can also be set via MIRRORSELECT_BACKEND_TOKEN environment variable.
    pub token: Option<String>,
}

/// Default sync options.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Whether the sync-everything mode is offered for this deployment.
    pub allow_sync_all: bool,
    /// Request timeout in seconds for backend calls.
    pub request_timeout_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            allow_sync_all: false,
            request_timeout_secs: 30,
        }
    }
}

impl Config {
    /// Load configuration using the config crate's layered approach.
    ///
    /// Sources are loaded in order (later sources override earlier):
    /// 1. Built-in defaults
    /// 2. XDG config file (~/.config/mirrorselect/config.toml)
    /// 3. Local config file (./mirrorselect.toml)
    /// 4. Environment variables with MIRRORSELECT_ prefix
    pub fn load() -> Self {
        let mut builder = ConfigBuilder::builder();

        if let Some(proj_dirs) = ProjectDirs::from("", "", "mirrorselect") {
            let xdg_config = proj_dirs.config_dir().join("config.toml");
            if xdg_config.exists() {
                tracing::debug!("Loading config from {:?}", xdg_config);
                builder = builder.add_source(
                    File::from(xdg_config)
                        .format(FileFormat::Toml)
                        .required(false),
                );
            }
        }

        // Local config file (higher priority than XDG)
        let local_config = PathBuf::from("mirrorselect.toml");
        if local_config.exists() {
            tracing::debug!("Loading config from ./mirrorselect.toml");
            builder = builder.add_source(
                File::from(local_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        // MIRRORSELECT_ prefixed environment variables,
        // e.g. MIRRORSELECT_BACKEND_URL -> backend.url
        builder = builder.add_source(
            Environment::with_prefix("MIRRORSELECT")
                .separator("_")
                .try_parsing(true),
        );

        match builder.build() {
            Ok(settings) => match settings.try_deserialize::<Config>() {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Failed to deserialize config: {}", e);
                    Config::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to build config: {}", e);
                Config::default()
            }
        }
    }

    /// Backend URL, required for every command that talks to the platform.
    pub fn backend_url(&self) -> Result<&str, String> {
        self.backend.url.as_deref().ok_or_else(|| {
            "No backend URL configured. Set MIRRORSELECT_BACKEND_URL or add \
             [backend] url to the config file."
                .to_string()
        })
    }

    /// Principal whose selection is managed.
    pub fn principal(&self) -> Result<&str, String> {
        self.principal.as_deref().ok_or_else(|| {
            "No principal configured. Set MIRRORSELECT_PRINCIPAL or add \
             principal to the config file."
                .to_string()
        })
    }

    /// Get the default config file path.
    #[allow(dead_code)]
    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "mirrorselect")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}
