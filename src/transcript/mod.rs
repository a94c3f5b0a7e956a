use serde::{Deserialize, Serialize};
use std::fmt;

/// Individual caption segment with timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionSegment {
    /// Start time in seconds
    pub start: f64,

    /// Duration in seconds
    pub duration: f64,

    /// Caption text
    pub text: String,
}

impl CaptionSegment {
    pub fn new(start: f64, duration: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            duration,
            text: text.into(),
        }
    }

    /// End time in seconds
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// Timestamp-free caption text, ready to be placed into a prompt
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilteredTranscript(String);

impl FilteredTranscript {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of whitespace separated words
    pub fn word_count(&self) -> usize {
        self.0.split_whitespace().count()
    }
}

impl fmt::Display for FilteredTranscript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for FilteredTranscript {
    fn from(text: String) -> Self {
        Self(text)
    }
}

/// Structural problem found in a caption block
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedCaptions {
    #[error("caption block has {0} lines, expected groups of 3")]
    IncompleteGroup(usize),

    #[error("line {line} is not a timing line: {content:?}")]
    MissingTiming { line: usize, content: String },
}

/// Collapse embedded line breaks so a caption always occupies one line
fn single_line(text: &str) -> String {
    text.replace("\r\n", " ").replace(['\n', '\r'], " ")
}

/// Render segments as the three-line-per-entry caption block
/// (`timing`, `text`, blank).
pub fn render_caption_block(segments: &[CaptionSegment]) -> String {
    let mut block = String::new();
    for segment in segments {
        block.push_str(&format!(
            "{} --> {}\n{}\n\n",
            segment.start,
            segment.end(),
            single_line(&segment.text)
        ));
    }
    block
}

/// Keep the text line of every three-line group and join them with a space.
///
/// Selection is purely positional: line `i` (0-based) is kept when `i % 3 == 1`.
/// Inputs whose length is not a multiple of three are not rejected.
pub fn filter_caption_lines<I, S>(lines: I) -> FilteredTranscript
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let text_lines: Vec<S> = lines
        .into_iter()
        .enumerate()
        .filter(|(i, _)| i % 3 == 1)
        .map(|(_, line)| line)
        .collect();

    let joined = text_lines
        .iter()
        .map(|line| line.as_ref())
        .collect::<Vec<_>>()
        .join(" ");

    FilteredTranscript(joined)
}

/// Filter a rendered caption block down to its text lines
pub fn filter_captions(block: &str) -> FilteredTranscript {
    let trimmed = block.trim();
    if trimmed.is_empty() {
        return FilteredTranscript::default();
    }
    filter_caption_lines(trimmed.split('\n'))
}

/// Render and filter in one step
pub fn filter_segments(segments: &[CaptionSegment]) -> FilteredTranscript {
    filter_captions(&render_caption_block(segments))
}

/// Check that a caption block has the shape `filter_captions` expects.
///
/// The trailing blank line of the last group is trimmed away before filtering,
/// so a well-formed block has `3n - 1` lines.
pub fn check_caption_block(block: &str) -> Result<(), MalformedCaptions> {
    let trimmed = block.trim();
    if trimmed.is_empty() {
        return Ok(());
    }

    let lines: Vec<&str> = trimmed.split('\n').collect();
    if lines.len() % 3 != 2 {
        return Err(MalformedCaptions::IncompleteGroup(lines.len()));
    }

    for (i, line) in lines.iter().enumerate().step_by(3) {
        if !line.contains("-->") {
            return Err(MalformedCaptions::MissingTiming {
                line: i,
                content: line.to_string(),
            });
        }
    }

    Ok(())
}
