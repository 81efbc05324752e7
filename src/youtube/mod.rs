pub mod extractor;
pub mod fallback;
pub mod search;

use std::sync::Arc;

use crate::config::Config;
use extractor::YtDlpSearch;
use fallback::OfflineCatalog;
use search::{SearchProvider, YouTubeApiSearch};

/// Offline wins, then the Data API when a key is configured, then yt-dlp.
pub fn provider_for(config: &Config) -> Arc<dyn SearchProvider> {
    if config.offline {
        return Arc::new(OfflineCatalog::new());
    }

    match config.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
        Some(key) => Arc::new(YouTubeApiSearch::new(key, config.max_results)),
        None => Arc::new(YtDlpSearch::new(config.max_results)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_provider_from_config() {
        let mut config = Config::default();
        assert_eq!(provider_for(&config).name(), "yt-dlp");

        config.api_key = Some("key".to_string());
        assert_eq!(provider_for(&config).name(), "youtube-data-api");

        config.api_key = Some("   ".to_string());
        assert_eq!(provider_for(&config).name(), "yt-dlp");

        config.offline = true;
        assert_eq!(provider_for(&config).name(), "offline");
    }
}
