use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::error::ScanError;

pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:5000";
pub const API_BASE_ENV: &str = "SENTINEL_API_BASE";
const DEFAULT_TIMEOUT_SECS: u64 = 120;
const CONFIG_DIR_NAME: &str = "sentinel";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Contents of `~/.config/sentinel/config.toml`. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub api_base: Option<String>,
    pub timeout_secs: Option<u64>,
    pub output_dir: Option<PathBuf>,
}

impl FileConfig {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Missing file is not an error; an unreadable or invalid one is.
    pub fn load_from(path: &Path) -> Result<Option<Self>, ScanError> {
        if !path.exists() {
            log::debug!("[config] file_absent: path={}", path.display());
            return Ok(None);
        }

        let content = fs::read_to_string(path)?;
        let parsed: FileConfig = toml::from_str(&content).map_err(|e| {
            ScanError::Config(format!("failed to parse {}: {}", path.display(), e))
        })?;
        log::info!("[config] file_loaded: path={}", path.display());
        Ok(Some(parsed))
    }
}

/// Values given on the command line; these win over everything else.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub api_base: Option<String>,
    pub timeout_secs: Option<u64>,
    pub output_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base: Url,
    /// `None` means requests never time out.
    pub timeout: Option<Duration>,
    pub output_dir: PathBuf,
}

impl Config {
    /// Resolve from defaults, config file, `SENTINEL_API_BASE`, then overrides.
    pub fn load(overrides: Overrides) -> Result<Self, ScanError> {
        let file = match FileConfig::default_path() {
            Some(path) => FileConfig::load_from(&path)?,
            None => None,
        };
        let env_api_base = std::env::var(API_BASE_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty());

        Self::resolve(file.unwrap_or_default(), env_api_base, overrides)
    }

    pub fn resolve(
        file: FileConfig,
        env_api_base: Option<String>,
        overrides: Overrides,
    ) -> Result<Self, ScanError> {
        let api_base = overrides
            .api_base
            .or(env_api_base)
            .or(file.api_base)
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        let timeout_secs = overrides
            .timeout_secs
            .or(file.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let output_dir = overrides
            .output_dir
            .or(file.output_dir)
            .unwrap_or_else(|| PathBuf::from("."));

        let config = Self {
            api_base: parse_api_base(&api_base)?,
            timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)),
            output_dir,
        };

        log::debug!("[config] resolved: api_base={} timeout={:?} output_dir={}",
            config.api_base, config.timeout, config.output_dir.display());

        Ok(config)
    }

    /// Defaults with only the API base replaced.
    pub fn with_api_base(api_base: &str) -> Result<Self, ScanError> {
        Self::resolve(
            FileConfig::default(),
            None,
            Overrides {
                api_base: Some(api_base.to_string()),
                ..Overrides::default()
            },
        )
    }

    /// Full URL for an endpoint path such as `api/scan`.
    pub fn endpoint(&self, path: &str) -> Result<Url, ScanError> {
        self.api_base
            .join(path)
            .map_err(|e| ScanError::Config(format!("invalid endpoint {}: {}", path, e)))
    }
}

fn parse_api_base(raw: &str) -> Result<Url, ScanError> {
    let mut url = Url::parse(raw.trim())
        .map_err(|e| ScanError::Config(format!("invalid api base '{}': {}", raw, e)))?;

    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(ScanError::Config(format!(
            "api base must be an http(s) url, got '{}'",
            raw
        )));
    }

    // Keep any path prefix when joining endpoint paths
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}
