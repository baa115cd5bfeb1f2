//! Server configuration.
//!
//! Settings are layered: built-in defaults, then an optional TOML file,
//! then `LISTO_*` environment variables (double underscore separates
//! sections, e.g. `LISTO_SERVER__PORT=9000`).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::auth::AuthConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8787,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Path to the SQLite file. Supports `~` expansion.
    pub path: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        let path = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("listo")
            .join("listo.db");
        Self {
            path: path.to_string_lossy().into_owned(),
        }
    }
}

impl DatabaseSettings {
    /// Database path with `~` expanded.
    pub fn resolved_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.path).into_owned())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub auth: AuthConfig,
}

impl Settings {
    /// Load settings, layering file and environment over defaults.
    ///
    /// When `path` is None, `$XDG_CONFIG_HOME/listo/config.toml` is read
    /// if it exists.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        match path {
            Some(path) => {
                builder = builder.add_source(config::File::from(path).required(true));
            }
            None => {
                if let Some(default_path) = Self::default_config_path() {
                    builder =
                        builder.add_source(config::File::from(default_path).required(false));
                }
            }
        }

        builder = builder.add_source(
            config::Environment::with_prefix("LISTO")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .context("reading configuration")?
            .try_deserialize()
            .context("parsing configuration")?;

        Ok(settings)
    }

    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("listo").join("config.toml"))
    }
}
