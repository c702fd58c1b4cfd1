use crate::model::{DEFAULT_HISTORY_LIMIT, DEFAULT_SOURCE_LABEL};
use anyhow::{Context, Result, anyhow, bail};
use chrono_tz::Tz;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use url::Url;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        if self.source.label.trim().is_empty() {
            bail!("source.label must not be empty");
        }
        Url::parse(&self.source.url)
            .with_context(|| format!("source.url is not a valid url: {}", self.source.url))?;
        if let Some(tz) = &self.source.timezone {
            tz.parse::<Tz>()
                .map_err(|err| anyhow!("source.timezone {tz} is not a known timezone: {err}"))?;
        }

        if self.fetch.timeout_secs == 0 {
            bail!("fetch.timeout_secs must be greater than zero");
        }
        match self.fetch.mode {
            FetchMode::Http => {}
            FetchMode::Browser => {
                if self.fetch.browser_binary.trim().is_empty() {
                    bail!("fetch.browser_binary is required for browser mode");
                }
            }
            FetchMode::File => {
                if self.fetch.file_path.is_none() {
                    bail!("fetch.file_path is required for file mode");
                }
            }
        }

        if self.store.history_limit == 0 {
            bail!("store.history_limit must be at least 1");
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_label")]
    pub label: String,
    #[serde(default = "default_url")]
    pub url: String,
    /// IANA zone used for the `gregorian` and `updated_at` stamps. Falls back
    /// to the host clock.
    #[serde(default)]
    pub timezone: Option<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            label: default_label(),
            url: default_url(),
            timezone: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FetchMode {
    #[default]
    Http,
    Browser,
    File,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    #[serde(default)]
    pub mode: FetchMode,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub file_path: Option<PathBuf>,
    #[serde(default = "default_browser_binary")]
    pub browser_binary: String,
    #[serde(default = "default_browser_args")]
    pub browser_args: Vec<String>,
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            mode: FetchMode::Http,
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            headers: BTreeMap::new(),
            file_path: None,
            browser_binary: default_browser_binary(),
            browser_args: default_browser_args(),
            settle_ms: default_settle_ms(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CorruptStorePolicy {
    /// Abort the run and leave the file alone.
    #[default]
    Fail,
    /// Move the broken file aside and start from an empty store.
    Reset,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    #[serde(default)]
    pub on_corrupt: CorruptStorePolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            history_limit: default_history_limit(),
            on_corrupt: CorruptStorePolicy::Fail,
        }
    }
}

pub fn load_config_file(config_path: &Path) -> Result<AppConfig> {
    let text = std::fs::read_to_string(config_path)
        .with_context(|| format!("failed to read config: {}", config_path.display()))?;
    let mut config: AppConfig = toml::from_str(&text)
        .with_context(|| format!("failed to parse toml in {}", config_path.display()))?;

    config.store.path = resolve_path(config_path, &config.store.path)?;
    if let Some(file_path) = &config.fetch.file_path {
        config.fetch.file_path = Some(resolve_path(config_path, file_path)?);
    }

    config
        .validate()
        .with_context(|| format!("invalid config {}", config_path.display()))?;
    Ok(config)
}

/// Loads `config_path` when given, otherwise the built-in defaults.
pub fn load_config(config_path: Option<&Path>) -> Result<AppConfig> {
    match config_path {
        Some(path) => load_config_file(path),
        None => Ok(AppConfig::default()),
    }
}

pub fn resolve_path(base_config_path: &Path, maybe_relative: &Path) -> Result<PathBuf> {
    if maybe_relative.is_absolute() {
        return Ok(maybe_relative.to_path_buf());
    }

    let parent = base_config_path.parent().ok_or_else(|| {
        anyhow!(
            "config file has no parent directory: {}",
            base_config_path.display()
        )
    })?;

    Ok(parent.join(maybe_relative))
}

fn default_label() -> String {
    DEFAULT_SOURCE_LABEL.to_string()
}

fn default_url() -> String {
    "https://www.spa.gov.sa/".to_string()
}

fn default_timeout_secs() -> u64 {
    20
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36"
        .to_string()
}

fn default_browser_binary() -> String {
    "chromium".to_string()
}

fn default_browser_args() -> Vec<String> {
    vec![
        "--headless".to_string(),
        "--no-sandbox".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--disable-gpu".to_string(),
        "--window-size=1920,1080".to_string(),
    ]
}

fn default_settle_ms() -> u64 {
    3000
}

fn default_store_path() -> PathBuf {
    PathBuf::from("api/hijri.json")
}

fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        config.validate().unwrap();
        assert_eq!(config.store.path, PathBuf::from("api/hijri.json"));
        assert_eq!(config.store.history_limit, 365);
        assert_eq!(config.fetch.mode, FetchMode::Http);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [source]
            timezone = "Asia/Riyadh"

            [fetch]
            mode = "browser"
            timeout_secs = 30
            "#,
        )
        .unwrap();
        config.validate().unwrap();
        assert_eq!(config.source.label, "spa.gov.sa");
        assert_eq!(config.fetch.mode, FetchMode::Browser);
        assert_eq!(config.fetch.timeout_secs, 30);
        assert_eq!(config.store.on_corrupt, CorruptStorePolicy::Fail);
    }

    #[test]
    fn rejects_unknown_timezone_and_zero_limit() {
        let mut config = AppConfig::default();
        config.source.timezone = Some("Mars/Olympus".to_string());
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.store.history_limit = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn sample_config_resolves_store_next_to_repo_root() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("configs/hijri.toml");
        let config = load_config_file(&path).unwrap();
        assert_eq!(config.source.timezone.as_deref(), Some("Asia/Riyadh"));
        assert_eq!(config.fetch.headers.get("Accept-Language").map(String::as_str), Some("ar"));
        assert!(config.store.path.ends_with("configs/../api/hijri.json"));
    }

    #[test]
    fn file_mode_requires_path() {
        let mut config = AppConfig::default();
        config.fetch.mode = FetchMode::File;
        assert!(config.validate().is_err());
        config.fetch.file_path = Some(PathBuf::from("page.html"));
        config.validate().unwrap();
    }
}
