use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

pub mod captions;
pub mod youtube;

use crate::transcript::CaptionSegment;
use crate::Result;

pub use captions::YoutubeCaptionSource;
pub use youtube::YtDlpResolver;

/// Information about the resolved video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    /// Platform identifier, used to look up captions
    pub id: String,

    /// Title of the video
    pub title: String,

    /// Duration in seconds if available
    pub duration: Option<f64>,

    /// Channel or uploader name
    pub uploader: Option<String>,

    /// Reference that was resolved
    pub original_url: String,
}

/// Resolves a video reference (URL or id) to its metadata
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MetadataResolver: Send + Sync {
    /// Fetch title and identifier for a video reference
    async fn resolve(&self, reference: &str) -> Result<VideoInfo>;
}

/// Retrieves timed caption segments for a video
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CaptionSource: Send + Sync {
    /// Fetch captions for `video_id` in `language`, in playback order
    async fn fetch_captions(&self, video_id: &str, language: &str) -> Result<Vec<CaptionSegment>>;
}

/// Validate and normalize URLs
pub fn validate_url(url: &str) -> Result<Url> {
    let parsed = Url::parse(url)
        .map_err(|_| anyhow::anyhow!("Invalid URL format: {}", url))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        anyhow::bail!("URL must use HTTP or HTTPS protocol");
    }

    Ok(parsed)
}

/// Whether the reference is a bare 11 character YouTube video id
pub fn is_video_id(reference: &str) -> bool {
    reference.len() == 11
        && reference
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Turn a reference into something yt-dlp accepts.
///
/// URLs must be http(s); bare ids are passed through unchanged.
pub fn normalize_reference(reference: &str) -> Result<String> {
    let reference = reference.trim();
    if is_video_id(reference) {
        return Ok(reference.to_string());
    }
    Ok(validate_url(reference)?.to_string())
}
