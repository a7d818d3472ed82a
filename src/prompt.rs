//! Interactive fallbacks for settings missing from flags, env and config.
//!
//! Prompts only appear when stdin is a terminal. Under a service manager or
//! a pipe a missing value is reported as [`PromptError::NotInteractive`].

use std::io::{self, BufRead, IsTerminal, Write};
use std::time::Duration;

use thiserror::Error;

use crate::config::parse_duration;

/// Errors from interactive prompts.
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("prompt I/O error: {0}")]
    Io(#[from] io::Error),

    /// Stdin is not a terminal, so the named value must be supplied up front.
    #[error("{0} is required (pass it as a flag, env var or config entry)")]
    NotInteractive(String),

    #[error("invalid input: {0}")]
    Invalid(String),
}

fn ensure_interactive(what: &str) -> Result<(), PromptError> {
    if io::stdin().is_terminal() {
        Ok(())
    } else {
        Err(PromptError::NotInteractive(what.to_string()))
    }
}

/// Read one trimmed line from `reader` after writing `label` to `writer`.
///
/// Returns `None` for a blank answer.
pub fn read_optional_from<R: BufRead, W: Write>(
    reader: &mut R,
    writer: &mut W,
    label: &str,
) -> Result<Option<String>, PromptError> {
    write!(writer, "{}", label)?;
    writer.flush()?;

    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Err(PromptError::Invalid("unexpected end of input".to_string()));
    }
    let value = line.trim();
    Ok((!value.is_empty()).then(|| value.to_string()))
}

/// Read one non-empty line from `reader` after writing `label` to `writer`.
pub fn read_line_from<R: BufRead, W: Write>(
    reader: &mut R,
    writer: &mut W,
    label: &str,
) -> Result<String, PromptError> {
    read_optional_from(reader, writer, label)?
        .ok_or_else(|| PromptError::Invalid(format!("empty answer to '{}'", label.trim())))
}

/// Prompt on the terminal for a line of text.
///
/// `what` names the value in the error when stdin is not a terminal.
pub fn line(what: &str, label: &str) -> Result<String, PromptError> {
    ensure_interactive(what)?;
    read_line_from(&mut io::stdin().lock(), &mut io::stderr(), label)
}

/// Prompt on the terminal for a value that may be left blank.
///
/// Without a terminal the value is simply absent.
pub fn optional_line(label: &str) -> Result<Option<String>, PromptError> {
    if !io::stdin().is_terminal() {
        return Ok(None);
    }
    read_optional_from(&mut io::stdin().lock(), &mut io::stderr(), label)
}

/// Prompt on the terminal for a password without echoing it.
pub fn password(label: &str) -> Result<String, PromptError> {
    ensure_interactive("password")?;
    let value = rpassword::prompt_password(label)?;
    if value.is_empty() {
        return Err(PromptError::Invalid("empty password".to_string()));
    }
    Ok(value)
}

/// Prompt on the terminal for a sweep interval (`3600` or `1h`).
pub fn interval(label: &str) -> Result<Duration, PromptError> {
    let answer = line("interval", label)?;
    parse_duration(&answer).map_err(PromptError::Invalid)
}
