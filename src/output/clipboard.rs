use anyhow::{Context, Result};
use std::io::{ErrorKind, Write};
use std::process::{Command, Stdio};

/// Clipboard programs tried in order
const CLIPBOARD_TOOLS: &[(&str, &[&str])] = &[
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
    ("xsel", &["--clipboard", "--input"]),
    ("pbcopy", &[]),
    ("clip.exe", &[]),
];

/// System clipboard reached through whichever copy tool is installed
#[derive(Debug, Clone, Default)]
pub struct Clipboard;

impl Clipboard {
    pub fn new() -> Self {
        Self
    }

    /// Copy `text`, returning the name of the tool that accepted it
    pub fn copy(&self, text: &str) -> Result<&'static str> {
        for &(program, args) in CLIPBOARD_TOOLS {
            match pipe_into(program, args, text) {
                Ok(()) => {
                    tracing::debug!("Copied {} bytes with {}", text.len(), program);
                    return Ok(program);
                }
                Err(e) if is_not_found(&e) => continue,
                Err(e) => return Err(e).with_context(|| format!("{} failed", program)),
            }
        }

        anyhow::bail!("no clipboard tool found (install wl-copy, xclip, xsel or pbcopy)")
    }
}

fn is_not_found(error: &anyhow::Error) -> bool {
    error
        .downcast_ref::<std::io::Error>()
        .map(|e| e.kind() == ErrorKind::NotFound)
        .unwrap_or(false)
}

/// Feed `text` to a copy tool and wait for it to exit.
///
/// Tools such as xclip and wl-copy fork a process that keeps serving the
/// selection, so only the exit status is awaited and no pipe is read to EOF.
fn pipe_into(program: &str, args: &[&str], text: &str) -> Result<()> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(text.as_bytes())?;
    }

    let status = child.wait()?;
    if !status.success() {
        anyhow::bail!("exited with {}", status);
    }

    Ok(())
}
