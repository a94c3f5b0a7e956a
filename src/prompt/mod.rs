use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::transcript::FilteredTranscript;
use crate::SummaryError;

/// System message sent with every summary prompt
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a helpful assistant whose job is to explain a shortened version of information to the user.";

/// Summary output style
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryMode {
    /// A few sentences of prose
    #[default]
    #[serde(rename = "standart", alias = "standard")]
    Standard,
    /// Markdown bullet points
    Bulletpoint,
}

impl SummaryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SummaryMode::Standard => "standart",
            SummaryMode::Bulletpoint => "bulletpoint",
        }
    }

    /// Capitalized name for headings
    pub fn label(&self) -> &'static str {
        match self {
            SummaryMode::Standard => "Standart",
            SummaryMode::Bulletpoint => "Bulletpoint",
        }
    }

    /// Parse a mode name, falling back to `Standard` for anything unknown.
    ///
    /// The second element carries the `InvalidMode` signal when the fallback was taken.
    pub fn resolve(name: &str) -> (SummaryMode, Option<SummaryError>) {
        match name.parse() {
            Ok(mode) => (mode, None),
            Err(e) => (SummaryMode::Standard, Some(e)),
        }
    }
}

impl FromStr for SummaryMode {
    type Err = SummaryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "standart" | "standard" => Ok(SummaryMode::Standard),
            "bulletpoint" => Ok(SummaryMode::Bulletpoint),
            _ => Err(SummaryError::InvalidMode(s.to_string())),
        }
    }
}

impl fmt::Display for SummaryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the prompt templates need, built once per run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRequest {
    pub video_title: String,
    pub transcript: FilteredTranscript,
    pub mode: SummaryMode,
}

impl SummaryRequest {
    pub fn new(video_title: impl Into<String>, transcript: FilteredTranscript, mode: SummaryMode) -> Self {
        Self {
            video_title: video_title.into(),
            transcript,
            mode,
        }
    }
}

const NO_META_REFERENCES: &str = "ABSOLUTELY NEVER use phrases like 'the video explains', or 'the script argues', or 'the video discusses', \
instead just focus on the raw information, as if you were asked to explain the topic to someone without sounding like you learnt it in a YouTube video. ";

const NO_SPONSORS: &str = "Lastly again, completely ignore anything that seems like a sponsorship or a sponsored segment, \
or anything where someone directly talks about a product. ";

/// Render the prompt for a request. Same request, same bytes.
pub fn build_prompt(request: &SummaryRequest) -> String {
    let title = &request.video_title;
    let script = request.transcript.as_str();

    match request.mode {
        SummaryMode::Standard => format!(
            "Please summarize the following video script in a few sentences. The name of the YouTube Video is {title}. \
Filter out only the information and do not include any possible sponsored segments. \
{NO_META_REFERENCES}{NO_SPONSORS}\
Don't leave out any facts in the video. Simply lay out the explained information for easy digestion. \
Here is the related video script:\n\n{script}\n\nSummary:"
        ),
        SummaryMode::Bulletpoint => format!(
            "Please summarize the following video script in concise bullet points using markdown syntax. The name of the YouTube Video is {title}. \
Filter out only the information and do not include any possible sponsored segments. \
{NO_META_REFERENCES}{NO_SPONSORS}\
Don't leave out any facts in the video. Simply lay out the explained information in bullet points for easy digestion and markdown formatting. \
Here is the related video script:\n\n{script}\n\nSummary in bullet points and markdown syntax:"
        ),
    }
}

/// Prompt text together with the mode that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltPrompt {
    pub text: String,
    pub mode: SummaryMode,
    /// Set when the requested mode was unknown and `Standard` was used instead
    pub fallback: Option<SummaryError>,
}

/// Builds prompts from raw mode names, downgrading unknown ones
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder;

impl PromptBuilder {
    pub fn new() -> Self {
        Self
    }

    pub fn build(&self, video_title: &str, transcript: &FilteredTranscript, mode_name: &str) -> BuiltPrompt {
        let (mode, fallback) = SummaryMode::resolve(mode_name);
        if let Some(warning) = &fallback {
            tracing::debug!("{}", warning);
        }

        let request = SummaryRequest::new(video_title, transcript.clone(), mode);
        BuiltPrompt {
            text: build_prompt(&request),
            mode,
            fallback,
        }
    }
}
