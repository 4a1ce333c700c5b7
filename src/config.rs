use serde::Deserialize;
use anyhow::{Context, Result};
use reqwest::Url;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

pub const DEFAULT_ENDPOINT: &str = "https://api.coingecko.com/api/v3/ping";
pub const API_KEY_PARAM: &str = "x_cg_demo_api_key";
const DEFAULT_CONFIG_FILE: &str = "probe.json";

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ProbeConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    // None means the request may block forever
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    #[serde(default = "default_enable_progress_log")]
    pub enable_progress_log: bool,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_log_file() -> PathBuf {
    PathBuf::from("./log_progress")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_enable_progress_log() -> bool {
    true
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: None,
            log_file: default_log_file(),
            log_level: default_log_level(),
            timeout_ms: None,
            enable_progress_log: default_enable_progress_log(),
        }
    }
}

impl ProbeConfig {
    /// Load from the JSON file named by `PROBE_CONFIG` (default `probe.json`),
    /// then apply environment overrides.
    ///
    /// A missing default file falls back to built-in defaults; a missing file
    /// that was named explicitly is an error.
    pub async fn load() -> Result<Self> {
        let explicit = std::env::var("PROBE_CONFIG").ok();
        let config_file = explicit
            .clone()
            .unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string());

        let mut config = if explicit.is_none() && !Path::new(&config_file).exists() {
            Self::default()
        } else {
            Self::load_file_config(&config_file).await?
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    async fn load_file_config(file_path: &str) -> Result<ProbeConfig> {
        if !Path::new(file_path).exists() {
            return Err(anyhow::anyhow!("Config file not found: {}", file_path));
        }

        let content = fs::read_to_string(file_path).await?;
        let config: ProbeConfig = serde_json::from_str(&content)
            .with_context(|| format!("parsing config file {}", file_path))?;
        Ok(config)
    }

    /// Apply per-field overrides. `lookup` is `std::env::var` in production.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = lookup("PROBE_ENDPOINT") {
            self.endpoint = endpoint;
        }
        if let Some(key) = lookup("CG_DEMO_API_KEY") {
            self.api_key = Some(key).filter(|k| !k.is_empty());
        }
        if let Some(path) = lookup("PROGRESS_LOG_FILE") {
            self.log_file = PathBuf::from(path);
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(ms) = lookup("PROBE_TIMEOUT_MS") {
            let ms = ms
                .trim()
                .parse::<u64>()
                .with_context(|| format!("PROBE_TIMEOUT_MS is not a number: {}", ms))?;
            self.timeout_ms = Some(ms);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.validate_log_level()?;
        self.request_url()?;
        if self.timeout_ms == Some(0) {
            return Err(anyhow::anyhow!("timeout_ms must be greater than zero"));
        }
        Ok(())
    }

    /// Get the log level as a tracing::Level
    pub fn get_tracing_level(&self) -> Result<tracing::Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(tracing::Level::TRACE),
            "debug" => Ok(tracing::Level::DEBUG),
            "info" => Ok(tracing::Level::INFO),
            "warn" | "warning" => Ok(tracing::Level::WARN),
            "error" => Ok(tracing::Level::ERROR),
            _ => Err(anyhow::anyhow!("Invalid log level: {}. Valid levels are: trace, debug, info, warn, error", self.log_level))
        }
    }

    pub fn validate_log_level(&self) -> Result<()> {
        self.get_tracing_level().map(|_| ())
    }

    /// Endpoint with the demo API key appended as a query parameter, if one is set.
    pub fn request_url(&self) -> Result<Url> {
        let mut url = Url::parse(self.endpoint.trim())
            .with_context(|| format!("invalid endpoint: {}", self.endpoint))?;
        if let Some(key) = &self.api_key {
            url.query_pairs_mut().append_pair(API_KEY_PARAM, key);
        }
        Ok(url)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_target_coingecko_ping() {
        let config = ProbeConfig::default();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.log_file, PathBuf::from("./log_progress"));
        assert_eq!(config.timeout_ms, None);
        assert!(config.enable_progress_log);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_json_uses_defaults() {
        let config: ProbeConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ProbeConfig::default());
    }

    #[test]
    fn json_fields_override_defaults() {
        let raw = r#"{
            "endpoint": "http://127.0.0.1:8080/ping",
            "api_key": "CG-test",
            "log_file": "/tmp/progress",
            "timeout_ms": 1500,
            "enable_progress_log": false
        }"#;
        let config: ProbeConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(config.endpoint, "http://127.0.0.1:8080/ping");
        assert_eq!(config.api_key.as_deref(), Some("CG-test"));
        assert_eq!(config.log_file, PathBuf::from("/tmp/progress"));
        assert_eq!(config.timeout(), Some(Duration::from_millis(1500)));
        assert!(!config.enable_progress_log);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn request_url_appends_key_only_when_present() {
        let mut config = ProbeConfig::default();
        assert_eq!(config.request_url().unwrap().as_str(), DEFAULT_ENDPOINT);

        config.api_key = Some("CG-abc123".to_string());
        assert_eq!(
            config.request_url().unwrap().as_str(),
            "https://api.coingecko.com/api/v3/ping?x_cg_demo_api_key=CG-abc123"
        );
    }

    #[test]
    fn invalid_endpoint_fails_validation() {
        let config = ProbeConfig {
            endpoint: "not a url".to_string(),
            ..ProbeConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn log_levels() {
        let mut config = ProbeConfig::default();
        config.log_level = "WARNING".to_string();
        assert_eq!(config.get_tracing_level().unwrap(), tracing::Level::WARN);

        config.log_level = "verbose".to_string();
        assert!(config.validate_log_level().is_err());
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = ProbeConfig::default();
        config
            .apply_overrides(lookup_from(&[
                ("PROBE_ENDPOINT", "http://localhost:9/ping"),
                ("CG_DEMO_API_KEY", "CG-env"),
                ("PROGRESS_LOG_FILE", "progress.txt"),
                ("PROBE_TIMEOUT_MS", "250"),
                ("LOG_LEVEL", "debug"),
            ]))
            .unwrap();

        assert_eq!(config.endpoint, "http://localhost:9/ping");
        assert_eq!(config.api_key.as_deref(), Some("CG-env"));
        assert_eq!(config.log_file, PathBuf::from("progress.txt"));
        assert_eq!(config.timeout_ms, Some(250));
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn empty_api_key_override_clears_key() {
        let mut config = ProbeConfig {
            api_key: Some("CG-file".to_string()),
            ..ProbeConfig::default()
        };
        config
            .apply_overrides(lookup_from(&[("CG_DEMO_API_KEY", "")]))
            .unwrap();
        assert_eq!(config.api_key, None);
    }

    #[test]
    fn bad_timeout_override_is_an_error() {
        let mut config = ProbeConfig::default();
        let err = config
            .apply_overrides(lookup_from(&[("PROBE_TIMEOUT_MS", "soon")]))
            .unwrap_err();
        assert!(err.to_string().contains("PROBE_TIMEOUT_MS"));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let config = ProbeConfig {
            timeout_ms: Some(0),
            ..ProbeConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[tokio::test]
    async fn missing_explicit_file_is_an_error() {
        let err = ProbeConfig::load_file_config("/nonexistent/probe.json")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }
}
