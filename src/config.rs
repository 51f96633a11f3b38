use std::{env, fs, path::PathBuf, time::Duration};

use once_cell::sync::Lazy;
use serde::Deserialize;
use tracing::{info, warn};

pub const CONFIG_FILE: &str = "config.json";
pub const SETTINGS_FILE: &str = "settings.txt";
pub const API_KEY_ENV: &str = "OMDB_API_KEY";
pub const DEFAULT_OMDB_ENDPOINT: &str = "http://www.omdbapi.com/";
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

static DEFAULT_SETTINGS_PATH: Lazy<PathBuf> = Lazy::new(|| {
    directories::ProjectDirs::from("", "", "medialib")
        .map(|dirs| dirs.config_dir().join(SETTINGS_FILE))
        .unwrap_or_else(|| PathBuf::from(SETTINGS_FILE))
});

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub omdb_api_key: Option<String>,
    pub omdb_endpoint: String,
    pub fetch_timeout: Duration,
    pub settings_path: PathBuf,
    pub library_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            omdb_api_key: None,
            omdb_endpoint: DEFAULT_OMDB_ENDPOINT.to_string(),
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            settings_path: DEFAULT_SETTINGS_PATH.clone(),
            library_path: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(alias = "api_key")]
    omdb_api_key: Option<String>,
    omdb_endpoint: Option<String>,
    fetch_timeout_secs: Option<u64>,
    settings_path: Option<String>,
    library_path: Option<String>,
}

/// Read `config.json` from the working directory and the API key from the
/// environment. Never fails; anything unreadable falls back to defaults.
pub fn load_config() -> AppConfig {
    let cfg_path = PathBuf::from(CONFIG_FILE);
    let raw = match fs::read_to_string(&cfg_path) {
        Ok(raw) => {
            info!("Loaded config from {}", cfg_path.display());
            Some(raw)
        }
        Err(_) => {
            info!("No {CONFIG_FILE} found; using defaults");
            None
        }
    };
    parse_config(raw.as_deref(), env::var(API_KEY_ENV).ok())
}

/// Merge an optional `config.json` body and an optional environment key over
/// the defaults. The environment key wins when both are set.
pub fn parse_config(raw: Option<&str>, env_key: Option<String>) -> AppConfig {
    let mut cfg = AppConfig::default();

    let parsed = match raw.map(serde_json::from_str::<RawConfig>) {
        Some(Ok(parsed)) => parsed,
        Some(Err(err)) => {
            warn!("Failed to parse {CONFIG_FILE} ({err}). Using defaults.");
            RawConfig::default()
        }
        None => RawConfig::default(),
    };

    cfg.omdb_api_key = non_empty(parsed.omdb_api_key);
    if let Some(endpoint) = non_empty(parsed.omdb_endpoint) {
        cfg.omdb_endpoint = endpoint;
    }
    match parsed.fetch_timeout_secs {
        Some(0) => warn!("fetch_timeout_secs must be positive; keeping the default."),
        Some(secs) => cfg.fetch_timeout = Duration::from_secs(secs),
        None => {}
    }
    if let Some(path) = non_empty(parsed.settings_path) {
        cfg.settings_path = PathBuf::from(path);
    }
    cfg.library_path = non_empty(parsed.library_path).map(PathBuf::from);

    if let Some(key) = non_empty(env_key) {
        cfg.omdb_api_key = Some(key);
    }
    if cfg.omdb_api_key.is_none() {
        warn!("No OMDb API key configured (set {API_KEY_ENV}); metadata lookups are disabled.");
    }

    cfg
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_file_or_env() {
        let cfg = parse_config(None, None);
        assert_eq!(cfg.omdb_api_key, None);
        assert_eq!(cfg.omdb_endpoint, DEFAULT_OMDB_ENDPOINT);
        assert_eq!(cfg.fetch_timeout, Duration::from_secs(10));
        assert_eq!(cfg.library_path, None);
    }

    #[test]
    fn env_key_overrides_file_key() {
        let raw = r#"{ "omdb_api_key": "from-file", "fetch_timeout_secs": 3 }"#;
        let cfg = parse_config(Some(raw), Some("from-env".into()));
        assert_eq!(cfg.omdb_api_key.as_deref(), Some("from-env"));
        assert_eq!(cfg.fetch_timeout, Duration::from_secs(3));

        let cfg = parse_config(Some(raw), Some("   ".into()));
        assert_eq!(cfg.omdb_api_key.as_deref(), Some("from-file"));
    }

    #[test]
    fn broken_file_falls_back_to_defaults() {
        let cfg = parse_config(Some("{ not json"), None);
        assert_eq!(cfg, parse_config(None, None));
    }

    #[test]
    fn blank_values_are_ignored() {
        let raw = r#"{ "omdb_endpoint": "", "library_path": " ", "fetch_timeout_secs": 0 }"#;
        let cfg = parse_config(Some(raw), None);
        assert_eq!(cfg.omdb_endpoint, DEFAULT_OMDB_ENDPOINT);
        assert_eq!(cfg.library_path, None);
        assert_eq!(cfg.fetch_timeout, Duration::from_secs(10));
    }
}
