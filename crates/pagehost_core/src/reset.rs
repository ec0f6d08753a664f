//! Confirmed full reset of persisted host state.

use crate::prefs::{PreferenceError, PreferenceStore};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::{BufRead, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetOutcome {
    Reset,
    Aborted,
}

#[derive(Debug)]
pub enum ResetError {
    Io(std::io::Error),
    Prefs(PreferenceError),
}

impl Display for ResetError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "reset prompt failed: {err}"),
            Self::Prefs(err) => write!(f, "reset failed: {err}"),
        }
    }
}

impl Error for ResetError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Prefs(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for ResetError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<PreferenceError> for ResetError {
    fn from(value: PreferenceError) -> Self {
        Self::Prefs(value)
    }
}

/// Warning shown before asking for the confirmation phrase.
pub fn reset_prompt(phrase: &str) -> String {
    format!(
        "Resetting will erase all of your personal content and settings, which cannot be undone.\n\n\
         To continue, enter \"{phrase}\" below."
    )
}

/// Case-insensitive comparison of the typed answer against the phrase.
pub fn is_reset_confirmed(answer: &str, phrase: &str) -> bool {
    let answer = answer.trim();
    !answer.is_empty() && answer.to_lowercase() == phrase.trim().to_lowercase()
}

/// Prompts on `output`, reads one line from `input`, and wipes `store` only
/// when the answer matches `phrase`.
pub fn confirm_and_reset(
    input: &mut impl BufRead,
    output: &mut impl Write,
    phrase: &str,
    store: &mut PreferenceStore,
) -> Result<ResetOutcome, ResetError> {
    writeln!(output, "{}", reset_prompt(phrase))?;
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;

    if !is_reset_confirmed(&answer, phrase) {
        writeln!(output, "Reset aborted.")?;
        info!("event=reset module=reset status=aborted");
        return Ok(ResetOutcome::Aborted);
    }

    writeln!(output, "Resetting...")?;
    store.reset()?;
    info!("event=reset module=reset status=ok");
    Ok(ResetOutcome::Reset)
}
