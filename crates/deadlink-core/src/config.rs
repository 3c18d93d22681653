use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::proxy::default_socks_port;

/// Checker configuration loaded from `~/.config/deadlink/config.toml`.
/// Missing keys fall back to the defaults below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckerConfig {
    /// Time limit for a header-only request, in seconds.
    pub header_timeout_secs: u64,
    /// Time limit for a full-body request, in seconds.
    pub full_timeout_secs: u64,
    /// Overrides the built-in browser user agent for HTTP and FTP.
    pub user_agent: Option<String>,
    /// Split batches into waves with at most one URL per host.
    pub queue_by_domain: bool,
    /// libcurl verbose output on stderr.
    pub verbose: bool,
    /// SOCKS5 proxy used for onion addresses.
    pub socks_host: String,
    pub socks_port: u16,
    /// Pause between waves, in milliseconds.
    pub wave_delay_ms: u64,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            header_timeout_secs: 30,
            full_timeout_secs: 60,
            user_agent: None,
            queue_by_domain: true,
            verbose: false,
            socks_host: "127.0.0.1".to_string(),
            socks_port: default_socks_port(),
            wave_delay_ms: 1000,
        }
    }
}

impl CheckerConfig {
    pub fn header_timeout(&self) -> Duration {
        Duration::from_secs(self.header_timeout_secs)
    }

    pub fn full_timeout(&self) -> Duration {
        Duration::from_secs(self.full_timeout_secs)
    }

    pub fn wave_delay(&self) -> Duration {
        Duration::from_millis(self.wave_delay_ms)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("deadlink")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<CheckerConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = CheckerConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from(&path)
}

/// Load configuration from an explicit file.
pub fn load_from(path: &Path) -> Result<CheckerConfig> {
    let data = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: CheckerConfig =
        toml::from_str(&data).with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg)
}
