use anyhow::Context;
use async_trait::async_trait;
use yt_transcript_rs::api::YouTubeTranscriptApi;

use super::CaptionSource;
use crate::transcript::CaptionSegment;
use crate::Result;

/// Caption source backed by YouTube's transcript endpoints
#[derive(Clone)]
pub struct YoutubeCaptionSource {
    api: YouTubeTranscriptApi,
}

impl YoutubeCaptionSource {
    pub fn new() -> Result<Self> {
        let api = YouTubeTranscriptApi::new(None, None, None)
            .context("Failed to create transcript client")?;
        Ok(Self { api })
    }
}

#[async_trait]
impl CaptionSource for YoutubeCaptionSource {
    async fn fetch_captions(&self, video_id: &str, language: &str) -> Result<Vec<CaptionSegment>> {
        tracing::debug!("Fetching {} captions for video {}", language, video_id);

        let transcript = self
            .api
            .fetch_transcript(video_id, &[language], false)
            .await
            .map_err(|e| anyhow::anyhow!("No '{}' captions for {}: {}", language, video_id, e))?;

        let segments: Vec<CaptionSegment> = transcript
            .snippets
            .into_iter()
            .map(|snippet| CaptionSegment::new(snippet.start, snippet.duration, snippet.text))
            .collect();

        tracing::debug!("Fetched {} caption segments", segments.len());
        Ok(segments)
    }
}
