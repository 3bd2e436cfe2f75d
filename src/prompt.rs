//! Operator confirmation prompts

use std::io::{self, BufRead, Write};

/// Ask the operator a yes/no question
pub trait Confirm {
    fn confirm(&self, question: &str) -> bool;
}

/// Asks on stderr and reads the answer from stdin
///
/// Anything other than `y`/`yes` (including EOF) counts as no.
pub struct TerminalConfirm;

impl TerminalConfirm {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TerminalConfirm {
    fn default() -> Self {
        Self::new()
    }
}

impl Confirm for TerminalConfirm {
    fn confirm(&self, question: &str) -> bool {
        let mut stderr = io::stderr();
        let _ = write!(stderr, "{} [y/N]: ", question);
        let _ = stderr.flush();

        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(0) | Err(_) => false,
            Ok(_) => is_yes(&answer),
        }
    }
}

/// Answers yes to everything, for unattended use
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&self, question: &str) -> bool {
        tracing::info!("{} [assumed yes]", question);
        true
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
