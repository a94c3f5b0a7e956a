//! ytsum - A Rust CLI tool for summarizing online videos
//!
//! This library fetches the metadata and captions of a single video, condenses the
//! caption text and asks an LLM chat-completions service for a short summary in
//! either prose or markdown bullet points.

pub mod cli;
pub mod config;
pub mod extractors;
pub mod output;
pub mod pipeline;
pub mod prompt;
pub mod summarize;
pub mod transcript;
pub mod utils;

pub use cli::{Cli, CliMode};
pub use config::Config;
pub use extractors::{CaptionSource, MetadataResolver, VideoInfo};
pub use output::{ConsolePresenter, Presenter};
pub use pipeline::{PipelineState, SummaryOptions, SummaryPipeline, SummaryResult, DEFAULT_MAX_TOKENS};
pub use prompt::{build_prompt, BuiltPrompt, PromptBuilder, SummaryMode, SummaryRequest};
pub use summarize::Summarizer;
pub use transcript::{filter_captions, filter_segments, CaptionSegment, FilteredTranscript};

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Error kinds surfaced by the summary pipeline
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SummaryError {
    #[error("Failed to retrieve video metadata: {0}")]
    Retrieval(String),

    #[error("Captions unavailable: {0}")]
    CaptionUnavailable(String),

    #[error("Failed to fetch summary: {0}")]
    Completion(String),

    #[error("Unknown mode selected: {0}. Falling back to standart mode.")]
    InvalidMode(String),
}

impl SummaryError {
    /// Pipeline state in which this error stops a run
    pub fn stage(&self) -> PipelineState {
        match self {
            SummaryError::Retrieval(_) => PipelineState::Start,
            SummaryError::CaptionUnavailable(_) => PipelineState::MetadataFetched,
            SummaryError::Completion(_) => PipelineState::PromptBuilt,
            SummaryError::InvalidMode(_) => PipelineState::Filtered,
        }
    }
}
