// src/config.rs
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

// --- env defaults & names ---
pub const DEFAULT_CONFIG_PATH: &str = "config/dashboard.toml";
pub const DEFAULT_DATA_PATH: &str = "data/jsondata.json";

pub const ENV_CONFIG_PATH: &str = "DASHBOARD_CONFIG_PATH";
pub const ENV_DATA_PATH: &str = "DASHBOARD_DATA_PATH";
pub const ENV_DEBUG_ROUTES: &str = "DEBUG_ROUTES";

fn default_data_path() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_PATH)
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DashboardConfig {
    /// Exported documents (JSON array or JSON Lines).
    #[serde(default = "default_data_path")]
    pub data_path: PathBuf,
    /// Expose `/metrics`.
    #[serde(default)]
    pub debug_routes: bool,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_path: default_data_path(),
            debug_routes: false,
        }
    }
}

impl DashboardConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading dashboard config from {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("parsing dashboard config {}", path.display()))
    }

    /// Resolve config using env var + fallbacks, then apply env overrides:
    /// 1) $DASHBOARD_CONFIG_PATH (must exist)
    /// 2) config/dashboard.toml
    /// 3) built-in defaults
    pub fn load() -> Result<Self> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            Self::load_from_file(&pb)?
        } else {
            let default = PathBuf::from(DEFAULT_CONFIG_PATH);
            if default.exists() {
                Self::load_from_file(&default)?
            } else {
                Self::default()
            }
        };
        cfg.apply_env_overrides();
        Ok(cfg)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(p) = std::env::var(ENV_DATA_PATH) {
            if !p.trim().is_empty() {
                self.data_path = PathBuf::from(p.trim());
            }
        }
        if let Ok(v) = std::env::var(ENV_DEBUG_ROUTES) {
            self.debug_routes = matches!(v.trim(), "1" | "true" | "yes");
        }
    }
}
