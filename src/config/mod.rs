use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_REFRESH_SECS: u64 = 30;

const ENV_API_URL: &str = "SOCDASH_API_URL";
const ENV_API_KEY: &str = "SOCDASH_API_KEY";

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_secs: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_page: Option<String>,
}

/// Resolved backend address and credential
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiSettings {
    pub base_url: String,
    pub api_key: Option<String>,
}

impl ApiSettings {
    /// CLI value, then environment, then config file, then the default
    pub fn resolve(cli_url: Option<&str>, cli_key: Option<&str>, config: &Config) -> Self {
        let env_url = std::env::var(ENV_API_URL).ok();
        let env_key = std::env::var(ENV_API_KEY).ok();
        Self::resolve_with(cli_url, cli_key, env_url.as_deref(), env_key.as_deref(), config)
    }

    fn resolve_with(
        cli_url: Option<&str>,
        cli_key: Option<&str>,
        env_url: Option<&str>,
        env_key: Option<&str>,
        config: &Config,
    ) -> Self {
        let base_url = [cli_url, env_url, config.api_base_url.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|s| !s.is_empty())
            .map(normalize_base_url)
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        let api_key = [cli_key, env_key, config.api_key.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|s| !s.is_empty())
            .map(str::to_string);
        Self { base_url, api_key }
    }

    pub fn masked_key(&self) -> String {
        match self.api_key.as_deref() {
            None => "(not set)".to_string(),
            Some(key) if key.chars().count() <= 4 => "****".to_string(),
            Some(key) => {
                let tail: String = key
                    .chars()
                    .rev()
                    .take(4)
                    .collect::<String>()
                    .chars()
                    .rev()
                    .collect();
                format!("****{tail}")
            }
        }
    }
}

pub fn load() -> Config {
    let Some(path) = config_path() else {
        return Config::default();
    };
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(_) => return Config::default(),
    };
    match toml::from_str::<Config>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "ignoring unreadable config");
            Config::default()
        }
    }
}

pub fn save(config: &Config) -> Result<PathBuf> {
    let path = config_path().context("no config directory available")?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let content = toml::to_string_pretty(config).context("serialize config")?;
    fs::write(&path, content).with_context(|| format!("write {}", path.display()))?;
    Ok(path)
}

pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os("SOCDASH_CONFIG").map(PathBuf::from) {
        return Some(path);
    }
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from) {
        return Some(xdg.join("socdash").join("config.toml"));
    }
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        return Some(home.join(".config").join("socdash").join("config.toml"));
    }

    directories::ProjectDirs::from("io", "socdash", "socdash")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

pub fn data_dir() -> Option<PathBuf> {
    if let Some(xdg) = std::env::var_os("XDG_DATA_HOME").map(PathBuf::from) {
        return Some(xdg.join("socdash"));
    }
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        return Some(home.join(".local").join("share").join("socdash"));
    }
    directories::ProjectDirs::from("io", "socdash", "socdash")
        .map(|dirs| dirs.data_dir().to_path_buf())
}

pub fn log_path() -> PathBuf {
    data_dir()
        .map(|dir| dir.join("socdash.log"))
        .unwrap_or_else(|| PathBuf::from("socdash.log"))
}

pub fn export_dir() -> PathBuf {
    data_dir()
        .map(|dir| dir.join("exports"))
        .unwrap_or_else(|| PathBuf::from(".socdash").join("exports"))
}

/// Trim, drop trailing slashes and default the scheme to http
pub fn normalize_base_url(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    }
}
