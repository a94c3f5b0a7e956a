use anyhow::Context;
use async_trait::async_trait;
use serde_json::Value;
use std::process::Stdio;
use tokio::process::Command;

use super::{normalize_reference, MetadataResolver, VideoInfo};
use crate::utils::{check_command_available, spinner};
use crate::Result;

/// Video metadata resolver using yt-dlp
pub struct YtDlpResolver {
    yt_dlp_path: String,
    show_progress: bool,
}

impl YtDlpResolver {
    pub fn new() -> Self {
        Self::with_path("yt-dlp")
    }

    pub fn with_path(yt_dlp_path: impl Into<String>) -> Self {
        Self {
            yt_dlp_path: yt_dlp_path.into(),
            show_progress: false,
        }
    }

    /// Draw a spinner on stderr while yt-dlp runs
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Check if yt-dlp is available
    pub async fn check_availability(&self) -> bool {
        check_command_available(&self.yt_dlp_path).await
    }

    /// Get video information using yt-dlp
    async fn get_video_info(&self, reference: &str) -> Result<Value> {
        tracing::debug!("Extracting video info for: {}", reference);

        let progress = spinner("Fetching video metadata with yt-dlp...", self.show_progress);
        let output = Command::new(&self.yt_dlp_path)
            .args(["--skip-download", "--dump-json", "--no-playlist", reference])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await;
        progress.finish_and_clear();

        let output = output.with_context(|| format!("Failed to run {}", self.yt_dlp_path))?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(
                "yt-dlp returned {}: {}",
                output.status.code().unwrap_or(-1),
                error.trim()
            );
        }

        let json_str = String::from_utf8(output.stdout)?;
        let info: Value =
            serde_json::from_str(&json_str).context("Failed to parse yt-dlp output")?;

        Ok(info)
    }
}

/// Pick the fields we need out of yt-dlp's JSON document
pub fn parse_video_info(info: &Value, original_url: &str) -> Result<VideoInfo> {
    let id = info["id"]
        .as_str()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| anyhow::anyhow!("yt-dlp output has no video id"))?;
    let title = info["title"]
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("yt-dlp output has no title"))?;

    Ok(VideoInfo {
        id: id.to_string(),
        title: title.to_string(),
        duration: info["duration"].as_f64(),
        uploader: info["uploader"].as_str().map(|s| s.to_string()),
        original_url: original_url.to_string(),
    })
}

#[async_trait]
impl MetadataResolver for YtDlpResolver {
    async fn resolve(&self, reference: &str) -> Result<VideoInfo> {
        let reference = normalize_reference(reference)?;

        if !self.check_availability().await {
            anyhow::bail!(
                "{} is not available. Please install it: https://github.com/yt-dlp/yt-dlp",
                self.yt_dlp_path
            );
        }

        let info = self.get_video_info(&reference).await?;
        parse_video_info(&info, &reference)
    }
}

impl Default for YtDlpResolver {
    fn default() -> Self {
        Self::new()
    }
}
