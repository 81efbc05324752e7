// Error types shared across the player.
//
// Every failure here is recoverable: a failed search falls back to the sample
// set, a failed playback request shows a notice, a broken config file is
// reported once at startup.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("search endpoint returned HTTP {0}")]
    Status(u16),

    #[error("could not decode search response: {0}")]
    Decode(String),

    #[error("failed to run yt-dlp: {0}")]
    Process(String),

    #[error("search task failed: {0}")]
    Join(String),
}

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("failed to start player `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("player IPC failed: {0}")]
    Ipc(#[from] std::io::Error),

    #[error("no track is loaded")]
    NothingLoaded,

    #[error("pause/resume needs an IPC socket, unsupported on this platform")]
    Unsupported,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
