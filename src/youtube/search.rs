// YouTube search through the public Data API (v3).
//
// The search collaborator is a trait so the session and the debouncer can be
// driven by fakes in tests. `YouTubeApiSearch` is the network implementation;
// `YtDlpSearch` (extractor.rs) and `OfflineCatalog` (fallback.rs) are the others.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SearchError;

const SEARCH_ENDPOINT: &str = "https://www.googleapis.com/youtube/v3/search";

// videoCategoryId 10 = "Music"
const MUSIC_CATEGORY_ID: &str = "10";

/// One search hit. Immutable once built, cloned into the queue as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    pub title: String,
    pub thumbnail_url: String,
}

impl SearchResult {
    pub fn new(id: impl Into<String>, title: impl Into<String>, thumbnail_url: impl Into<String>) -> Self {
        SearchResult {
            id: id.into(),
            title: title.into(),
            thumbnail_url: thumbnail_url.into(),
        }
    }

    /// Page URL handed to the player; mpv resolves the stream itself.
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.id)
    }
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Returns results in relevance order.
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, SearchError>;

    /// Short label for logs and the status line.
    fn name(&self) -> &'static str;
}

pub struct YouTubeApiSearch {
    http: reqwest::Client,
    api_key: String,
    max_results: u32,
}

impl YouTubeApiSearch {
    pub fn new(api_key: impl Into<String>, max_results: u32) -> Self {
        YouTubeApiSearch {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            max_results,
        }
    }
}

#[async_trait]
impl SearchProvider for YouTubeApiSearch {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, SearchError> {
        let max_results = self.max_results.to_string();
        let response = self
            .http
            .get(SEARCH_ENDPOINT)
            .query(&[
                ("part", "snippet"),
                ("type", "video"),
                ("videoCategoryId", MUSIC_CATEGORY_ID),
                ("maxResults", max_results.as_str()),
                ("q", query),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let results = parse_search_response(&body)?;
        debug!(query, count = results.len(), "data api search finished");
        Ok(results)
    }

    fn name(&self) -> &'static str {
        "youtube-data-api"
    }
}

// Wire shapes of the Data API search response. Only the fields we read.

#[derive(Deserialize)]
struct ApiResponse {
    #[serde(default)]
    items: Vec<ApiItem>,
}

#[derive(Deserialize)]
struct ApiItem {
    id: ApiId,
    snippet: ApiSnippet,
}

#[derive(Deserialize)]
struct ApiId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

#[derive(Deserialize)]
struct ApiSnippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    thumbnails: ApiThumbnails,
}

#[derive(Deserialize, Default)]
struct ApiThumbnails {
    medium: Option<ApiThumbnail>,
}

#[derive(Deserialize)]
struct ApiThumbnail {
    url: String,
}

/// Decodes a search response body. Items without a `videoId` (channels,
/// playlists slipping through the filter) are skipped; a missing medium
/// thumbnail becomes an empty string.
pub fn parse_search_response(body: &str) -> Result<Vec<SearchResult>, SearchError> {
    let response: ApiResponse =
        serde_json::from_str(body).map_err(|e| SearchError::Decode(e.to_string()))?;

    Ok(response
        .items
        .into_iter()
        .filter_map(|item| {
            let id = item.id.video_id?;
            let thumbnail_url = item
                .snippet
                .thumbnails
                .medium
                .map(|t| t.url)
                .unwrap_or_default();
            Some(SearchResult {
                id,
                title: item.snippet.title,
                thumbnail_url,
            })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_items_in_order() {
        let body = r#"{
            "kind": "youtube#searchListResponse",
            "items": [
                {
                    "id": { "kind": "youtube#video", "videoId": "abc" },
                    "snippet": {
                        "title": "First",
                        "thumbnails": { "medium": { "url": "https://i.ytimg.com/vi/abc/mqdefault.jpg" } }
                    }
                },
                {
                    "id": { "kind": "youtube#video", "videoId": "def" },
                    "snippet": { "title": "Second", "thumbnails": {} }
                }
            ]
        }"#;

        let results = parse_search_response(body).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, "abc");
        assert_eq!(results[0].thumbnail_url, "https://i.ytimg.com/vi/abc/mqdefault.jpg");
        assert_eq!(results[1].title, "Second");
        assert_eq!(results[1].thumbnail_url, "");
    }

    #[test]
    fn skips_items_without_video_id() {
        let body = r#"{ "items": [
            { "id": { "kind": "youtube#channel", "channelId": "UC1" }, "snippet": { "title": "A channel" } },
            { "id": { "videoId": "v1" }, "snippet": { "title": "A video" } }
        ] }"#;

        let results = parse_search_response(body).unwrap();
        assert_eq!(results, vec![SearchResult::new("v1", "A video", "")]);
    }

    #[test]
    fn missing_items_is_an_empty_result() {
        assert!(parse_search_response("{}").unwrap().is_empty());
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let err = parse_search_response("<html>quota exceeded</html>").unwrap_err();
        assert!(matches!(err, SearchError::Decode(_)));
    }

    #[test]
    fn watch_url_uses_the_video_id() {
        let result = SearchResult::new("dQw4w9WgXcQ", "t", "");
        assert_eq!(result.watch_url(), "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
    }
}
