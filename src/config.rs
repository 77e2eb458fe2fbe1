//! Store limits and application configuration.
//! `StoreConfig` carries the invariants of the cache/history/settings
//! collections; `AppConfig` carries deployment knobs read from the environment.

use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

/// Storage key of the serialized settings record.
pub const SETTINGS_KEY: &str = "translation_settings";
/// Storage key of the serialized history list.
pub const HISTORY_KEY: &str = "translation_history";
/// Storage key of the serialized cache list.
pub const CACHE_KEY: &str = "translation_cache";

/// Seven days, in milliseconds.
pub const CACHE_TTL_MS: i64 = 7 * 24 * 60 * 60 * 1000;

/// Limits and timings for the translation store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub history_capacity: usize,
    pub cache_capacity: usize,
    pub cache_ttl: Duration,
    /// Source text longer than this is never cached.
    pub max_cache_text_chars: usize,
    /// Original or translated text longer than this is not recorded in history.
    pub max_history_text_chars: usize,
    /// Quiet period before a settings change is written back.
    pub settings_debounce: Duration,
    pub max_language_code_chars: usize,
    pub max_language_name_chars: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            history_capacity: 100,
            cache_capacity: 500,
            cache_ttl: Duration::from_millis(CACHE_TTL_MS as u64),
            max_cache_text_chars: 1000,
            max_history_text_chars: 5000,
            settings_debounce: Duration::from_millis(300),
            max_language_code_chars: 10,
            max_language_name_chars: 100,
        }
    }
}

impl StoreConfig {
    pub fn cache_ttl_ms(&self) -> i64 {
        self.cache_ttl.as_millis() as i64
    }
}

/// Deployment configuration for the binary: where data lives and which
/// remote endpoints to talk to.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub api_url: String,
    pub api_timeout: Duration,
    /// URL polled by the reachability probe. `None` disables probing.
    pub probe_url: Option<String>,
    pub probe_interval: Duration,
    pub store: StoreConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            api_url: "https://toolkit.rork.com/text/llm/".into(),
            api_timeout: Duration::from_secs(60),
            probe_url: None,
            probe_interval: Duration::from_secs(30),
            store: StoreConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from `SNAPLINGO_*` environment variables, reading `.env` first if present.
    /// Unparseable numeric values fall back to defaults with a warning.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        let mut config = Self::default();

        if let Ok(dir) = std::env::var("SNAPLINGO_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Ok(url) = std::env::var("SNAPLINGO_API_URL") {
            config.api_url = url;
        }
        if let Some(secs) = env_secs("SNAPLINGO_API_TIMEOUT_SECS") {
            config.api_timeout = Duration::from_secs(secs);
        }
        if let Ok(url) = std::env::var("SNAPLINGO_PROBE_URL") {
            if !url.trim().is_empty() {
                config.probe_url = Some(url);
            }
        }
        if let Some(secs) = env_secs("SNAPLINGO_PROBE_INTERVAL_SECS") {
            config.probe_interval = Duration::from_secs(secs.max(1));
        }

        config
    }

    /// Path of the SQLite key-value database inside the data directory.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("snaplingo.db")
    }
}

fn env_secs(name: &str) -> Option<u64> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse::<u64>() {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(var = name, value = %raw, error = %e, "ignoring invalid duration");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_store_limits() {
        let config = StoreConfig::default();
        assert_eq!(config.history_capacity, 100);
        assert_eq!(config.cache_capacity, 500);
        assert_eq!(config.cache_ttl_ms(), 604_800_000);
        assert_eq!(config.settings_debounce, Duration::from_millis(300));
    }

    #[test]
    fn database_lives_in_data_dir() {
        let config = AppConfig {
            data_dir: PathBuf::from("/tmp/snap"),
            ..AppConfig::default()
        };
        assert_eq!(config.database_path(), PathBuf::from("/tmp/snap/snaplingo.db"));
    }
}
