use crate::error::{ConfradarError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

pub const APP_NAME: &str = "confradar";
pub const CONFIG_FILE: &str = "config.toml";
pub const DATA_DIR_ENV: &str = "CONFRADAR_DATA_DIR";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub refresh: RefreshConfig,
    pub tui: TuiConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// Per-source timeout for remote fetches.
    pub timeout_seconds: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TuiConfig {
    /// Lower bound on rows per page regardless of terminal height.
    pub min_page_size: usize,
    /// Rows kept for borders, header and footer.
    pub reserved_rows: usize,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 10,
            user_agent: format!("{}/{}", APP_NAME, env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Default for TuiConfig {
    fn default() -> Self {
        Self {
            min_page_size: 5,
            reserved_rows: 10,
        }
    }
}

impl Config {
    /// Read `config.toml` from the data directory. A missing, unreadable or
    /// malformed file yields the defaults.
    pub fn load(data_dir: &Path) -> Self {
        let config_path = data_dir.join(CONFIG_FILE);
        if !config_path.exists() {
            return Self::default();
        }
        match Self::read(&config_path) {
            Ok(config) => config,
            Err(e) => {
                warn!("Ignoring config file, using defaults: {}", e);
                Self::default()
            }
        }
    }

    fn read(config_path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(config_path).map_err(|e| {
            ConfradarError::Config(format!(
                "Failed to read config file '{}': {}",
                config_path.display(),
                e
            ))
        })?;
        Self::parse(&config_content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn refresh_timeout(&self) -> Duration {
        Duration::from_secs(self.refresh.timeout_seconds)
    }
}

/// `--data-dir`, then `CONFRADAR_DATA_DIR`, then the platform data
/// directory. The directory is created if missing.
pub fn resolve_data_dir(cli_override: Option<PathBuf>) -> Result<PathBuf> {
    let dir = match cli_override {
        Some(dir) => dir,
        None => match std::env::var(DATA_DIR_ENV) {
            Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => dirs::data_dir()
                .map(|d| d.join(APP_NAME))
                .ok_or_else(|| {
                    ConfradarError::Config("Could not determine a per-user data directory".to_string())
                })?,
        },
    };
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_config_uses_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load(dir.path());
        assert_eq!(config.refresh.timeout_seconds, 10);
        assert_eq!(config.tui.min_page_size, 5);
        assert_eq!(config.tui.reserved_rows, 10);
    }

    #[test]
    fn test_partial_config_overrides_fields() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            "[refresh]\ntimeout_seconds = 3\n\n[tui]\nreserved_rows = 6\n",
        )
        .unwrap();
        let config = Config::load(dir.path());
        assert_eq!(config.refresh_timeout(), Duration::from_secs(3));
        assert!(config.refresh.user_agent.starts_with("confradar/"));
        assert_eq!(config.tui.reserved_rows, 6);
        assert_eq!(config.tui.min_page_size, 5);
    }

    #[test]
    fn test_malformed_config_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "[refresh\ntimeout_seconds = 3\n").unwrap();
        let config = Config::load(dir.path());
        assert_eq!(config.refresh.timeout_seconds, 10);
        assert_eq!(config.tui.min_page_size, 5);
    }

    #[test]
    fn test_parse_reports_wrong_types() {
        let parsed = Config::parse("[refresh]\ntimeout_seconds = \"soon\"\n");
        assert!(matches!(parsed, Err(ConfradarError::Toml(_))));
    }

    #[test]
    fn test_cli_override_wins_and_is_created() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("nested").join("data");
        let resolved = resolve_data_dir(Some(target.clone())).unwrap();
        assert_eq!(resolved, target);
        assert!(target.is_dir());
    }
}
