use clap::{Parser, ValueEnum};

use crate::prompt::SummaryMode;

#[derive(Parser, Debug)]
#[command(
    name = "ytsum",
    about = "Summarize a YouTube video from its captions using an LLM",
    version,
    long_about = "Fetches the metadata and captions of a YouTube video, condenses the caption text and asks an OpenAI-compatible chat completions service for a short summary, either as prose or as markdown bullet points."
)]
pub struct Cli {
    /// URL or id of the video to summarize
    #[arg(value_name = "VIDEO", required_unless_present = "show_config")]
    pub video: Option<String>,

    /// Caption language code (defaults to app.default_language, "en")
    #[arg(long, value_name = "LANG")]
    pub lang: Option<String>,

    /// Output mode (defaults to app.default_mode, "standart")
    #[arg(short, long, value_enum)]
    pub mode: Option<CliMode>,

    /// Automatically copy the summary to the clipboard
    #[arg(short, long)]
    pub copy: bool,

    /// Maximum tokens for the summary (defaults to llm.max_tokens, 4069)
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub max_tokens: Option<u32>,

    /// Model to use instead of llm.model
    #[arg(long, value_name = "MODEL")]
    pub model: Option<String>,

    /// API key for the completion service
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Output format for the summary
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Disable progress output
    #[arg(short, long)]
    pub quiet: bool,

    /// Show current configuration and exit
    #[arg(long)]
    pub show_config: bool,
}

/// Summary mode as accepted on the command line
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum CliMode {
    /// A few sentences of prose
    #[value(name = "standart", alias = "standard")]
    Standart,
    /// Markdown bullet points
    Bulletpoint,
}

impl From<CliMode> for SummaryMode {
    fn from(mode: CliMode) -> Self {
        match mode {
            CliMode::Standart => SummaryMode::Standard,
            CliMode::Bulletpoint => SummaryMode::Bulletpoint,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Framed, colored text
    Text,
    /// JSON with video metadata
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}
