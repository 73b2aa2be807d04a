//! Transcript retrieval from YouTube caption tracks.
//!
//! Reads the caption track list embedded in the watch page, picks the track
//! for the preferred language and downloads it in `json3` form. Every failure
//! (no captions, network error, rate limiting) is reported as an absent
//! transcript.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use super::TranscriptSource;

const WATCH_URL: &str = "https://www.youtube.com/watch";
const CAPTION_TRACKS_MARKER: &str = "\"captionTracks\":";

/// Credentials for a rotating proxy endpoint
#[derive(Debug, Clone)]
pub struct ProxyCredentials {
    pub username: String,
    pub password: String,
}

/// Transcript fetcher for YouTube videos
pub struct YouTubeTranscripts {
    /// Preferred caption language code, e.g. `en`
    language: String,
    /// Maximum words kept from a transcript
    word_limit: usize,
    /// HTTP client (proxied when credentials were supplied)
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptionTrack {
    base_url: String,
    language_code: String,
}

#[derive(Debug, Deserialize)]
struct TimedText {
    #[serde(default)]
    events: Vec<TimedTextEvent>,
}

#[derive(Debug, Deserialize)]
struct TimedTextEvent {
    #[serde(default)]
    segs: Vec<TimedTextSegment>,
}

#[derive(Debug, Deserialize)]
struct TimedTextSegment {
    #[serde(default)]
    utf8: String,
}

impl YouTubeTranscripts {
    /// Fetcher using a direct connection
    pub fn new(language: impl Into<String>, word_limit: usize) -> Result<Self> {
        let client = Self::client_builder()
            .build()
            .context("Failed to build transcript HTTP client")?;

        Ok(Self {
            language: language.into(),
            word_limit,
            client,
        })
    }

    /// Fetcher routing every request through an authenticated proxy
    pub fn with_proxy(
        language: impl Into<String>,
        word_limit: usize,
        proxy_url: &str,
        credentials: &ProxyCredentials,
    ) -> Result<Self> {
        let proxy = reqwest::Proxy::all(proxy_url)
            .with_context(|| format!("Invalid proxy URL: {}", proxy_url))?
            .basic_auth(&credentials.username, &credentials.password);

        let client = Self::client_builder()
            .proxy(proxy)
            .build()
            .context("Failed to build proxied transcript HTTP client")?;

        Ok(Self {
            language: language.into(),
            word_limit,
            client,
        })
    }

    fn client_builder() -> reqwest::ClientBuilder {
        reqwest::Client::builder().timeout(Duration::from_secs(30))
    }

    /// Fetch the transcript, distinguishing "no captions" from errors
    async fn try_fetch(&self, video_id: &str) -> Result<Option<String>> {
        let page = self
            .client
            .get(WATCH_URL)
            .query(&[("v", video_id)])
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await
            .context("Failed to load watch page")?
            .error_for_status()
            .context("Watch page request rejected")?
            .text()
            .await
            .context("Failed to read watch page")?;

        let tracks = caption_tracks(&page);
        let Some(track) = select_track(&tracks, &self.language) else {
            debug!(video_id, available = tracks.len(), "No matching caption track");
            return Ok(None);
        };

        let timed: TimedText = self
            .client
            .get(&track.base_url)
            .query(&[("fmt", "json3")])
            .send()
            .await
            .context("Failed to request caption track")?
            .error_for_status()
            .context("Caption track request rejected")?
            .json()
            .await
            .context("Failed to parse caption track")?;

        let text = timed
            .events
            .iter()
            .flat_map(|event| event.segs.iter())
            .map(|seg| seg.utf8.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        let truncated = truncate_words(&text, self.word_limit);
        if truncated.is_empty() {
            return Ok(None);
        }
        Ok(Some(truncated))
    }
}

#[async_trait]
impl TranscriptSource for YouTubeTranscripts {
    async fn fetch(&self, video_id: &str) -> Option<String> {
        match self.try_fetch(video_id).await {
            Ok(transcript) => transcript,
            Err(e) => {
                warn!(video_id, error = %format!("{:#}", e), "Could not get transcript");
                None
            }
        }
    }
}

/// Extract the caption track list embedded in a watch page
fn caption_tracks(page: &str) -> Vec<CaptionTrack> {
    let Some(start) = page.find(CAPTION_TRACKS_MARKER) else {
        return Vec::new();
    };
    let rest = &page[start + CAPTION_TRACKS_MARKER.len()..];

    serde_json::Deserializer::from_str(rest)
        .into_iter::<Vec<CaptionTrack>>()
        .next()
        .and_then(|parsed| parsed.ok())
        .unwrap_or_default()
}

/// Exact language match first, then a regional variant (`en-GB` for `en`)
fn select_track<'a>(tracks: &'a [CaptionTrack], language: &str) -> Option<&'a CaptionTrack> {
    tracks
        .iter()
        .find(|t| t.language_code == language)
        .or_else(|| {
            tracks
                .iter()
                .find(|t| t.language_code.starts_with(&format!("{}-", language)))
        })
}

/// Collapse whitespace and keep at most `limit` words
pub fn truncate_words(text: &str, limit: usize) -> String {
    text.split_whitespace()
        .take(limit)
        .collect::<Vec<_>>()
        .join(" ")
}
