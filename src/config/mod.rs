use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_PLAYBACK_TTL_SECS: i64 = 3600;
/// Signed links never outlive a week.
pub const MAX_PLAYBACK_TTL_SECS: i64 = 7 * 24 * 3600;
pub const BASE_URL_ENV: &str = "MINDVIEW_URL";

/// `[server]` block from config.toml.
#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct ServerConfig {
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
    /// Assumed lifetime of a signed playback link when the backend omits one.
    pub playback_ttl_secs: Option<i64>,
}

/// Top-level mindview config file structure.
#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct MindviewConfig {
    pub server: Option<ServerConfig>,
}

/// Effective settings after the resolution chain.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settings {
    pub base_url: String,
    pub timeout_secs: u64,
    pub playback_ttl_secs: i64,
}

impl MindviewConfig {
    /// Load config from ~/.mindview/config.toml. Returns default if file doesn't exist.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(MindviewConfig::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: MindviewConfig =
            toml::from_str(&content).with_context(|| "Failed to parse config.toml")?;
        Ok(config)
    }

    /// Resolve settings: CLI flag > env var > config file > built-in default.
    pub fn resolve(&self, cli_base_url: Option<&str>) -> Settings {
        let env_url = std::env::var(BASE_URL_ENV).ok();
        self.resolve_with(cli_base_url, env_url.as_deref())
    }

    fn resolve_with(&self, cli_base_url: Option<&str>, env_url: Option<&str>) -> Settings {
        let server = self.server.clone().unwrap_or_default();
        let base_url = [cli_base_url, env_url, server.base_url.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|s| !s.is_empty())
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
            .to_string();

        Settings {
            base_url,
            timeout_secs: server.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            playback_ttl_secs: server
                .playback_ttl_secs
                .filter(|ttl| *ttl > 0)
                .map(|ttl| ttl.min(MAX_PLAYBACK_TTL_SECS))
                .unwrap_or(DEFAULT_PLAYBACK_TTL_SECS),
        }
    }
}

impl Settings {
    pub fn display(&self) -> String {
        [
            "[server]".to_string(),
            format!("  base_url = \"{}\"", self.base_url),
            format!("  timeout_secs = {}", self.timeout_secs),
            format!("  playback_ttl_secs = {}", self.playback_ttl_secs),
        ]
        .join("\n")
    }
}

/// Path to the config file: ~/.mindview/config.toml
pub fn config_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".mindview").join("config.toml"))
}

/// Default config template content.
pub fn default_config_template() -> &'static str {
    r#"# ~/.mindview/config.toml
# Base URL resolution order: --base-url flag > MINDVIEW_URL env var > base_url

[server]
# base_url = "http://localhost:8000"
# timeout_secs = 30
# playback_ttl_secs = 3600
"#
}

/// Create the default config file if it doesn't already exist.
pub fn init_config() -> Result<bool> {
    init_config_at(&config_path()?)
}

pub fn init_config_at(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    std::fs::write(path, default_config_template())?;
    Ok(true)
}
