use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

const APP_DIR: &str = "crusty-queue";
const API_KEY_ENV: &str = "YOUTUBE_API_KEY";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// YouTube Data API key. Without one, searches go through yt-dlp.
    pub api_key: Option<String>,
    pub max_results: u32,
    /// Quiescence window before a typed query is sent.
    pub debounce_ms: u64,
    /// Live search kicks in once the query is longer than this.
    pub live_search_min_chars: usize,
    pub player_command: String,
    pub audio_only: bool,
    /// Pause between a track ending and the next one starting.
    pub advance_delay_ms: u64,
    pub startup_queries: Vec<String>,
    /// Local mode: sample songs only, no network.
    pub offline: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            max_results: 12,
            debounce_ms: 200,
            live_search_min_chars: 2,
            player_command: "mpv".to_string(),
            audio_only: true,
            advance_delay_ms: 500,
            startup_queries: vec![
                "trending music".to_string(),
                "top hits".to_string(),
                "popular songs".to_string(),
            ],
            offline: false,
        }
    }
}

impl Config {
    pub fn default_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(APP_DIR);
        path.push("config.toml");
        path
    }

    /// Loads `path` (or the default location). A missing file is not an
    /// error; an unreadable or malformed one is. The `YOUTUBE_API_KEY`
    /// environment variable overrides the file.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(Self::default_path);

        let mut config = if path.exists() {
            let content = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
                path: path.clone(),
                source,
            })?;
            Self::from_toml_str(&content).map_err(|source| ConfigError::Parse { path, source })?
        } else {
            Self::default()
        };

        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                config.api_key = Some(key);
            }
        }

        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn advance_delay(&self) -> Duration {
        Duration::from_millis(self.advance_delay_ms)
    }
}
