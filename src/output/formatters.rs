use anyhow::Result;

use crate::pipeline::SummaryResult;
use crate::prompt::SummaryMode;

/// Width of the line framing a summary
pub const SEPARATOR_WIDTH: usize = 50;

pub fn separator() -> String {
    "-".repeat(SEPARATOR_WIDTH)
}

/// Heading shown above a summary
pub fn summary_heading(mode: SummaryMode) -> String {
    format!("Summary ({} Mode):", mode.label())
}

/// Indent every line by two spaces
pub fn indent_lines(text: &str) -> String {
    text.lines()
        .map(|line| format!("  {}", line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Summary body as it should appear on the terminal
pub fn format_summary_body(result: &SummaryResult) -> String {
    match result.mode {
        SummaryMode::Bulletpoint => indent_lines(&result.text),
        SummaryMode::Standard => format!("{}\n", result.text),
    }
}

/// JSON rendering of the whole result
pub fn format_as_json(result: &SummaryResult) -> Result<String> {
    Ok(serde_json::to_string_pretty(result)?)
}
