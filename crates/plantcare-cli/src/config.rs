//! Configuration file management for plantcare.
//!
//! Provides a TOML-based config file at `~/.config/plantcare/config.toml` and a
//! resolution chain: CLI flag > env var > config file > default.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use plantcare_db::config::DbConfig;

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigFile {
    pub database: DatabaseSection,
    #[serde(default)]
    pub server: ServerSection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseSection {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default = "ServerSection::default_bind")]
    pub bind: String,
    #[serde(default = "ServerSection::default_port")]
    pub port: u16,
}

impl ServerSection {
    pub const DEFAULT_BIND: &str = "127.0.0.1";
    pub const DEFAULT_PORT: u16 = 3000;

    fn default_bind() -> String {
        Self::DEFAULT_BIND.to_owned()
    }

    fn default_port() -> u16 {
        Self::DEFAULT_PORT
    }
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: Self::default_bind(),
            port: Self::default_port(),
        }
    }
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the plantcare config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/plantcare` or
/// `~/.config/plantcare`, including on macOS.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("plantcare");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("plantcare")
}

/// Return the path to the plantcare config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file at the default path.
pub fn load_config() -> Result<ConfigFile> {
    load_config_from(&config_path())
}

pub fn load_config_from(path: &Path) -> Result<ConfigFile> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents).context("failed to parse config file")?;
    Ok(config)
}

/// Serialize and write the config file, creating parent dirs as needed.
/// Sets file permissions to 0600 on Unix since the URL may hold a password.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    save_config_to(config, &config_path())
}

pub fn save_config_to(config: &ConfigFile, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create config directory {}", dir.display()))?;
    }

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct PlantcareConfig {
    pub db_config: DbConfig,
    pub server: ServerSection,
}

impl PlantcareConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config file > default.
    ///
    /// - DB URL: `cli_db_url` > `PLANTCARE_DATABASE_URL` > `database.url` > `DbConfig::DEFAULT_URL`
    /// - Server: `[server]` section of the config file > built-in defaults
    pub fn resolve(cli_db_url: Option<&str>) -> Result<Self> {
        let file_config = match load_config() {
            Ok(cfg) => Some(cfg),
            Err(e) if config_path().exists() => return Err(e),
            Err(_) => None,
        };

        let db_url = if let Some(url) = cli_db_url {
            url.to_string()
        } else if let Ok(url) = std::env::var(DbConfig::ENV_VAR) {
            url
        } else if let Some(ref cfg) = file_config {
            cfg.database.url.clone()
        } else {
            DbConfig::DEFAULT_URL.to_string()
        };

        let server = file_config.map(|cfg| cfg.server).unwrap_or_default();

        Ok(Self {
            db_config: DbConfig::new(db_url),
            server,
        })
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
