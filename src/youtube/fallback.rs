// Built-in sample results.
//
// Shown when a live search fails, and used as the whole catalogue in offline
// ("local") mode.

use async_trait::async_trait;

use crate::error::SearchError;
use crate::youtube::search::{SearchProvider, SearchResult};

const SAMPLES: [(&str, &str); 4] = [
    ("dQw4w9WgXcQ", "Rick Astley - Never Gonna Give You Up"),
    ("9bZkp7q19f0", "PSY - GANGNAM STYLE"),
    ("kJQP7kiw5Fk", "Luis Fonsi - Despacito ft. Daddy Yankee"),
    ("JGwWNGJdvx8", "Ed Sheeran - Shape of You"),
];

/// The static fallback result set.
pub fn sample_results() -> Vec<SearchResult> {
    SAMPLES
        .iter()
        .map(|(id, title)| {
            SearchResult::new(*id, *title, format!("https://i.ytimg.com/vi/{}/mqdefault.jpg", id))
        })
        .collect()
}

/// Search over the sample set only. Never touches the network.
pub struct OfflineCatalog {
    samples: Vec<SearchResult>,
}

impl OfflineCatalog {
    pub fn new() -> Self {
        OfflineCatalog {
            samples: sample_results(),
        }
    }

    /// Case-insensitive title match. No match returns every sample rather
    /// than an empty list.
    pub fn filter(&self, query: &str) -> Vec<SearchResult> {
        let needle = query.to_lowercase();
        let matched: Vec<SearchResult> = self
            .samples
            .iter()
            .filter(|song| song.title.to_lowercase().contains(&needle))
            .cloned()
            .collect();

        if matched.is_empty() {
            self.samples.clone()
        } else {
            matched
        }
    }
}

impl Default for OfflineCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SearchProvider for OfflineCatalog {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, SearchError> {
        Ok(self.filter(query))
    }

    fn name(&self) -> &'static str {
        "offline"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_have_thumbnails() {
        let samples = sample_results();
        assert_eq!(samples.len(), 4);
        assert!(samples
            .iter()
            .all(|s| s.thumbnail_url.ends_with(&format!("{}/mqdefault.jpg", s.id))));
    }

    #[test]
    fn filter_is_case_insensitive() {
        let catalog = OfflineCatalog::new();
        let hits = catalog.filter("gangnam");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "9bZkp7q19f0");
    }

    #[test]
    fn no_match_returns_everything() {
        let catalog = OfflineCatalog::new();
        assert_eq!(catalog.filter("polka"), sample_results());
    }
}
