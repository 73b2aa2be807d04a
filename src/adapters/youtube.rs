//! YouTube Data API v3 catalog source.
//!
//! Walks a channel's uploads playlist page by page. Durations are not part of
//! the playlist listing, so each page is followed by one batched
//! `videos.list` lookup keyed by the page's video ids.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::domain::{CatalogItem, CatalogPage, Cursor};

use super::{CatalogError, CatalogSource};

const API_BASE: &str = "https://www.googleapis.com/youtube/v3";

/// Catalog of one channel's uploads
pub struct YouTubeCatalog {
    /// Data API key
    api_key: String,
    /// Channel whose uploads are listed
    channel_id: String,
    /// Items requested per page (API maximum is 50)
    page_size: u32,
    /// Uploads playlist, resolved on first use
    uploads_playlist: OnceCell<String>,
    /// HTTP client
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelResource {
    content_details: ChannelContentDetails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelContentDetails {
    related_playlists: RelatedPlaylists,
}

#[derive(Debug, Deserialize)]
struct RelatedPlaylists {
    uploads: String,
}

#[derive(Debug, Deserialize)]
struct PlaylistItemResource {
    #[serde(default)]
    snippet: PlaylistSnippet,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistSnippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    published_at: Option<DateTime<Utc>>,
    resource_id: Option<ResourceId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceId {
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoResource {
    id: String,
    content_details: Option<VideoContentDetails>,
}

#[derive(Debug, Deserialize)]
struct VideoContentDetails {
    #[serde(default)]
    duration: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

impl YouTubeCatalog {
    /// Create a catalog for a channel's uploads
    pub fn new(
        api_key: impl Into<String>,
        channel_id: impl Into<String>,
        page_size: u32,
    ) -> Result<Self, CatalogError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            api_key: api_key.into(),
            channel_id: channel_id.into(),
            page_size: page_size.clamp(1, 50),
            uploads_playlist: OnceCell::new(),
            client,
        })
    }

    /// Issue a GET against a Data API resource
    async fn get<T: DeserializeOwned>(
        &self,
        resource: &str,
        params: &[(&str, &str)],
    ) -> Result<T, CatalogError> {
        let url = format!("{}/{}", API_BASE, resource);

        let response = self
            .client
            .get(&url)
            .query(params)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorResponse>(&text)
                .map(|e| e.error.message)
                .unwrap_or(text);
            return Err(CatalogError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }

    /// Resolve (once) the playlist that holds the channel's uploads
    async fn uploads_playlist(&self) -> Result<&str, CatalogError> {
        let playlist = self
            .uploads_playlist
            .get_or_try_init(|| async {
                let response: ListResponse<ChannelResource> = self
                    .get(
                        "channels",
                        &[("part", "contentDetails"), ("id", self.channel_id.as_str())],
                    )
                    .await?;

                let channel = response
                    .items
                    .into_iter()
                    .next()
                    .ok_or_else(|| CatalogError::ChannelNotFound(self.channel_id.clone()))?;

                let uploads = channel.content_details.related_playlists.uploads;
                info!(channel_id = %self.channel_id, playlist = %uploads, "Resolved uploads playlist");
                Ok::<_, CatalogError>(uploads)
            })
            .await?;

        Ok(playlist.as_str())
    }

    /// Look up durations for a batch of video ids
    async fn durations(&self, ids: &[String]) -> Result<HashMap<String, String>, CatalogError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let joined = ids.join(",");
        let response: ListResponse<VideoResource> = self
            .get("videos", &[("part", "contentDetails"), ("id", joined.as_str())])
            .await?;

        Ok(response
            .items
            .into_iter()
            .map(|v| {
                let duration = v.content_details.map(|d| d.duration).unwrap_or_default();
                (v.id, duration)
            })
            .collect())
    }
}

#[async_trait]
impl CatalogSource for YouTubeCatalog {
    fn name(&self) -> &str {
        "youtube"
    }

    async fn fetch_page(&self, cursor: Option<&Cursor>) -> Result<CatalogPage, CatalogError> {
        let playlist = self.uploads_playlist().await?;
        let page_size = self.page_size.to_string();

        let mut params = vec![
            ("part", "snippet"),
            ("playlistId", playlist),
            ("maxResults", page_size.as_str()),
        ];
        if let Some(cursor) = cursor {
            params.push(("pageToken", cursor.as_str()));
        }

        let listing: ListResponse<PlaylistItemResource> =
            self.get("playlistItems", &params).await?;

        let entries = listing_entries(listing.items);
        let ids: Vec<String> = entries.iter().map(|(id, _)| id.clone()).collect();
        let mut durations = self.durations(&ids).await?;

        debug!(
            items = entries.len(),
            with_duration = durations.len(),
            "Fetched playlist page"
        );

        let items = entries
            .into_iter()
            .map(|(id, snippet)| CatalogItem {
                raw_duration: durations.remove(&id).unwrap_or_default(),
                id,
                title: snippet.title,
                description: snippet.description,
                published_at: snippet.published_at,
            })
            .collect();

        Ok(CatalogPage {
            items,
            next_cursor: listing.next_page_token.map(Cursor::new),
        })
    }
}

/// Pair each playlist entry with its video id, dropping entries without one
fn listing_entries(items: Vec<PlaylistItemResource>) -> Vec<(String, PlaylistSnippet)> {
    items
        .into_iter()
        .filter_map(|item| {
            let id = item
                .snippet
                .resource_id
                .as_ref()
                .and_then(|r| r.video_id.clone())?;
            Some((id, item.snippet))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAYLIST_PAGE: &str = r#"{
        "kind": "youtube#playlistItemListResponse",
        "nextPageToken": "EAAaBlBUOkNESQ",
        "items": [
            {
                "snippet": {
                    "publishedAt": "2024-03-02T17:00:01Z",
                    "title": "I Played The Worst Opening",
                    "description": "Today we look at...",
                    "resourceId": {"kind": "youtube#video", "videoId": "abc123def45"}
                }
            },
            {
                "snippet": {
                    "title": "Deleted video",
                    "description": "This video is unavailable.",
                    "resourceId": {"kind": "youtube#video"}
                }
            }
        ]
    }"#;

    #[test]
    fn test_playlist_page_parsing() {
        let listing: ListResponse<PlaylistItemResource> =
            serde_json::from_str(PLAYLIST_PAGE).unwrap();
        assert_eq!(listing.next_page_token.as_deref(), Some("EAAaBlBUOkNESQ"));

        let entries = listing_entries(listing.items);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, "abc123def45");
        assert_eq!(entries[0].1.title, "I Played The Worst Opening");
        assert!(entries[0].1.published_at.is_some());
    }

    #[test]
    fn test_last_page_has_no_token() {
        let listing: ListResponse<PlaylistItemResource> =
            serde_json::from_str(r#"{"items": []}"#).unwrap();
        assert!(listing.next_page_token.is_none());
        assert!(listing.items.is_empty());
    }

    #[test]
    fn test_video_durations_parsing() {
        let json = r#"{"items": [
            {"id": "abc123def45", "contentDetails": {"duration": "PT14M2S"}},
            {"id": "zzz"}
        ]}"#;
        let response: ListResponse<VideoResource> = serde_json::from_str(json).unwrap();

        assert_eq!(response.items.len(), 2);
        assert_eq!(
            response.items[0].content_details.as_ref().unwrap().duration,
            "PT14M2S"
        );
        assert!(response.items[1].content_details.is_none());
    }

    #[test]
    fn test_channel_parsing() {
        let json = r#"{"items": [{"contentDetails": {"relatedPlaylists": {"uploads": "UUQHX6ViZmPsWiYSFAyS0a3Q"}}}]}"#;
        let response: ListResponse<ChannelResource> = serde_json::from_str(json).unwrap();
        assert_eq!(
            response.items[0].content_details.related_playlists.uploads,
            "UUQHX6ViZmPsWiYSFAyS0a3Q"
        );
    }

    #[test]
    fn test_page_size_is_clamped() {
        let catalog = YouTubeCatalog::new("key", "channel", 500).unwrap();
        assert_eq!(catalog.page_size, 50);
        assert_eq!(catalog.name(), "youtube");
    }
}
