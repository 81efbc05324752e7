// Key-less YouTube search through a yt-dlp subprocess.
// Used when no Data API key is configured.

use async_trait::async_trait;
use std::process::Command;
use tracing::debug;

use crate::error::SearchError;
use crate::youtube::search::{SearchProvider, SearchResult};

pub struct YtDlpSearch {
    max_results: u32,
}

impl YtDlpSearch {
    pub fn new(max_results: u32) -> Self {
        YtDlpSearch { max_results }
    }
}

#[async_trait]
impl SearchProvider for YtDlpSearch {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, SearchError> {
        // yt-dlp blocks for seconds; keep it off the async workers
        let target = format!("ytsearch{}:{}", self.max_results, query);
        let stdout = tokio::task::spawn_blocking(move || {
            let output = Command::new("yt-dlp")
                .arg("--dump-json")
                .arg("--skip-download")
                .arg("--no-playlist")
                .arg(target)
                .output()
                .map_err(|e| SearchError::Process(format!("{}. Is yt-dlp installed?", e)))?;

            if !output.status.success() {
                let error = String::from_utf8_lossy(&output.stderr);
                return Err(SearchError::Process(error.trim().to_string()));
            }

            String::from_utf8(output.stdout).map_err(|e| SearchError::Decode(e.to_string()))
        })
        .await
        .map_err(|e| SearchError::Join(e.to_string()))??;

        let results = parse_dump_lines(&stdout)?;
        debug!(query, count = results.len(), "yt-dlp search finished");
        Ok(results)
    }

    fn name(&self) -> &'static str {
        "yt-dlp"
    }
}

/// One JSON object per line, as printed by `yt-dlp --dump-json`.
pub fn parse_dump_lines(stdout: &str) -> Result<Vec<SearchResult>, SearchError> {
    let mut results = Vec::new();

    for line in stdout.lines() {
        if line.trim().is_empty() {
            continue;
        }

        let json: serde_json::Value =
            serde_json::from_str(line).map_err(|e| SearchError::Decode(e.to_string()))?;

        let Some(id) = json["id"].as_str() else {
            continue;
        };

        results.push(SearchResult {
            id: id.to_string(),
            title: json["title"].as_str().unwrap_or("Unknown").to_string(),
            thumbnail_url: json["thumbnail"].as_str().unwrap_or_default().to_string(),
        });
    }

    Ok(results)
}
