use console::style;

use crate::cli::OutputFormat;
use crate::pipeline::{PipelineState, SummaryResult};

pub mod clipboard;
pub mod formatters;

pub use clipboard::Clipboard;
pub use formatters::*;

// Nerd Font icons
const ICON_INFO: &str = "\u{F05A}";
const ICON_DOWNLOAD: &str = "\u{F019}";
const ICON_FILTER: &str = "\u{F0B0}";
const ICON_LLM: &str = "\u{EE9C}";
const ICON_CHECK: &str = "\u{F00C}";
const ICON_ERROR: &str = "\u{F00D}";
const ICON_VIDEO: &str = "\u{F03D}";
const ICON_CLIPBOARD: &str = "\u{F0EA}";

/// Renders pipeline progress and the final summary
#[cfg_attr(test, mockall::automock)]
pub trait Presenter: Send + Sync {
    /// Called on every pipeline state transition
    fn stage(&self, state: PipelineState, detail: &str);

    /// Non-fatal condition the user should know about
    fn warn(&self, message: &str);

    /// Show the summary and copy it if requested
    fn present(&self, result: &SummaryResult, copy_to_clipboard: bool);
}

/// Terminal presenter: summary on stdout, everything else on stderr
pub struct ConsolePresenter {
    format: OutputFormat,
    quiet: bool,
    clipboard: Clipboard,
}

impl ConsolePresenter {
    pub fn new(format: OutputFormat, quiet: bool) -> Self {
        Self {
            format,
            quiet,
            clipboard: Clipboard::new(),
        }
    }

    fn print_summary(&self, result: &SummaryResult) {
        match self.format {
            OutputFormat::Text => {
                let sep = style(separator()).cyan();
                println!("\n{}", sep);
                println!(
                    "{} {}\n",
                    style(ICON_CHECK).green(),
                    style(summary_heading(result.mode)).green().bold()
                );
                println!("{}", format_summary_body(result));
                println!("{}\n", sep);
            }
            OutputFormat::Json => match format_as_json(result) {
                Ok(json) => println!("{}", json),
                Err(e) => eprintln!("{} {}", style(ICON_ERROR).red().for_stderr(), e),
            },
        }
    }

    fn copy(&self, text: &str) {
        match self.clipboard.copy(text) {
            Ok(_) => eprintln!(
                "{}",
                style(format!("{} Summary copied to clipboard", ICON_CLIPBOARD))
                    .blue()
                    .for_stderr()
            ),
            Err(e) => eprintln!(
                "{}",
                style(format!("{} Clipboard copy requested but unavailable: {:#}", ICON_INFO, e))
                    .yellow()
                    .for_stderr()
            ),
        }
    }
}

impl Presenter for ConsolePresenter {
    fn stage(&self, state: PipelineState, detail: &str) {
        if state == PipelineState::Aborted {
            eprintln!("{}", style(format!("{} {}", ICON_ERROR, detail)).red().for_stderr());
            return;
        }
        if self.quiet {
            return;
        }

        let line = match state {
            PipelineState::Start => style(format!("{} {}", ICON_VIDEO, detail)).cyan(),
            PipelineState::MetadataFetched => {
                style(format!("{} Downloading Captions for: {}", ICON_DOWNLOAD, detail)).blue()
            }
            PipelineState::CaptionsFetched => {
                style(format!("{} Filtering Captions... ({})", ICON_FILTER, detail)).yellow()
            }
            PipelineState::Filtered => style(format!("{} Transcript ready: {}", ICON_INFO, detail)).dim(),
            PipelineState::PromptBuilt => {
                style(format!("{} Fetching {} summary...", ICON_LLM, detail)).magenta()
            }
            PipelineState::SummaryFetched => style(format!("{} Summary received", ICON_CHECK)).green(),
            PipelineState::Done | PipelineState::Aborted => return,
        };
        eprintln!("{}", line.for_stderr());
    }

    fn warn(&self, message: &str) {
        eprintln!("{}", style(format!("{} {}", ICON_ERROR, message)).red().for_stderr());
    }

    fn present(&self, result: &SummaryResult, copy_to_clipboard: bool) {
        self.print_summary(result);
        if copy_to_clipboard {
            self.copy(&result.text);
        }
    }
}
