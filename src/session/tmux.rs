//! tmux backend

use super::{run_program, tail_lines, Multiplexer, SessionError, SessionName};
use crate::config::SessionKind;
use std::path::Path;
use tracing::debug;

pub struct TmuxMultiplexer {
    program: String,
}

impl TmuxMultiplexer {
    pub fn new() -> Self {
        Self::with_program("tmux")
    }

    /// Use a different tmux binary
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for TmuxMultiplexer {
    fn default() -> Self {
        Self::new()
    }
}

fn list_args() -> Vec<String> {
    vec![
        "list-sessions".to_string(),
        "-F".to_string(),
        "#{session_name}".to_string(),
    ]
}

/// `=` makes tmux match the session name exactly instead of by prefix
fn exact_target(name: &SessionName) -> String {
    format!("={}", name)
}

fn kill_args(name: &SessionName) -> Vec<String> {
    vec![
        "kill-session".to_string(),
        "-t".to_string(),
        exact_target(name),
    ]
}

fn launch_args(name: &SessionName, cwd: &Path, command: &[String]) -> Vec<String> {
    let mut args = vec![
        "new-session".to_string(),
        "-d".to_string(),
        "-s".to_string(),
        name.to_string(),
        "-c".to_string(),
        cwd.to_string_lossy().to_string(),
    ];
    args.extend(command.iter().cloned());
    args
}

fn capture_args(name: &SessionName) -> Vec<String> {
    vec![
        "capture-pane".to_string(),
        "-p".to_string(),
        "-t".to_string(),
        format!("{}:", exact_target(name)),
    ]
}

fn session_listed(stdout: &str, name: &SessionName) -> bool {
    stdout.lines().any(|line| line.trim() == name.as_str())
}

impl Multiplexer for TmuxMultiplexer {
    fn kind(&self) -> SessionKind {
        SessionKind::Tmux
    }

    fn exists(&self, name: &SessionName) -> bool {
        match run_program(&self.program, &list_args(), None) {
            // No server running also exits non-zero
            Ok(output) if output.status.success() => {
                session_listed(&String::from_utf8_lossy(&output.stdout), name)
            }
            Ok(_) => false,
            Err(e) => {
                debug!("Session query failed: {}", e);
                false
            }
        }
    }

    fn terminate(&self, name: &SessionName) -> bool {
        run_program(&self.program, &kill_args(name), None)
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    fn launch(&self, name: &SessionName, cwd: &Path, command: &[String]) -> Result<(), SessionError> {
        let output = run_program(&self.program, &launch_args(name, cwd, command), Some(cwd))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SessionError::LaunchError {
                session: name.to_string(),
                message: stderr.trim().to_string(),
            });
        }
        Ok(())
    }

    fn capture(&self, name: &SessionName, lines: usize) -> Option<Vec<String>> {
        run_program(&self.program, &capture_args(name), None)
            .ok()
            .filter(|output| output.status.success())
            .map(|output| tail_lines(&String::from_utf8_lossy(&output.stdout), lines))
    }
}
