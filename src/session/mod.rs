//! Terminal multiplexer sessions hosting VPN clients
//!
//! Each profile maps to one deterministically named session. Existence is
//! never cached: every check is a live query, since sessions can be created
//! or killed by anyone.

pub mod screen;
pub mod tmux;

use crate::config::{PROFILE_PLACEHOLDER, SessionConfig, SessionKind};
use std::path::Path;
use std::process::{Command, Output};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Failed to run {program}: {source}")]
    SpawnError {
        program: String,
        source: std::io::Error,
    },
    #[error("Failed to start session {session}: {message}")]
    LaunchError { session: String, message: String },
}

/// Name of a session inside the multiplexer
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(transparent)]
pub struct SessionName(String);

impl SessionName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

/// Replace every character outside `[A-Za-z0-9_-]` with `_`
pub fn sanitize(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Derives session names from `(location, network)`
#[derive(Debug, Clone)]
pub struct SessionNamer {
    template: String,
}

impl SessionNamer {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.name_template.clone())
    }

    pub fn name(&self, location: &str, network: &str) -> SessionName {
        let token = sanitize(&format!("{}_{}", location, network));
        SessionName(self.template.replace(PROFILE_PLACEHOLDER, &token))
    }
}

/// Backend-agnostic session operations
pub trait Multiplexer {
    fn kind(&self) -> SessionKind;

    /// Whether a session with exactly this name is running
    ///
    /// A failed query reports `false`.
    fn exists(&self, name: &SessionName) -> bool;

    /// Kill the session; `true` only if the multiplexer reports success
    fn terminate(&self, name: &SessionName) -> bool;

    /// Start a detached session running `command` in `cwd`
    ///
    /// Success means the multiplexer accepted the session, not that the
    /// command inside it is healthy.
    fn launch(&self, name: &SessionName, cwd: &Path, command: &[String]) -> Result<(), SessionError>;

    /// Last `lines` non-empty lines of the session's screen, if obtainable
    fn capture(&self, name: &SessionName, lines: usize) -> Option<Vec<String>>;
}

/// Get the multiplexer backend for the configured session type
pub fn backend(config: &SessionConfig) -> Box<dyn Multiplexer> {
    match config.kind {
        SessionKind::Screen => Box::new(screen::ScreenMultiplexer::new(config.daemon_mode)),
        SessionKind::Tmux => Box::new(tmux::TmuxMultiplexer::new()),
    }
}

/// Run a multiplexer command to completion, collecting its output
pub(crate) fn run_program(
    program: &str,
    args: &[String],
    cwd: Option<&Path>,
) -> Result<Output, SessionError> {
    debug!("Running {} {:?}", program, args);
    let mut command = Command::new(program);
    command.args(args);
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }
    command.output().map_err(|e| SessionError::SpawnError {
        program: program.to_string(),
        source: e,
    })
}

/// Keep the last `count` non-blank lines, trimmed
pub(crate) fn tail_lines(output: &str, count: usize) -> Vec<String> {
    let lines: Vec<String> = output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();
    let skip = lines.len().saturating_sub(count);
    lines.into_iter().skip(skip).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sanitize_replaces_punctuation() {
        assert_eq!(sanitize("hq_prod"), "hq_prod");
        assert_eq!(sanitize("branch_guest wifi"), "branch_guest_wifi");
        assert_eq!(sanitize("a.b/c:d-e"), "a_b_c_d-e");
        assert_eq!(sanitize("café"), "caf_");
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        for raw in ["hq prod", "x/y.z", "ünï côdé", "", "already_safe-1"] {
            let once = sanitize(raw);
            assert_eq!(sanitize(&once), once);
        }
    }

    #[test]
    fn test_namer_applies_template() {
        let namer = SessionNamer::new("vpn_{profile_safe}");
        assert_eq!(namer.name("hq", "prod").as_str(), "vpn_hq_prod");
        assert_eq!(namer.name("branch", "guest wifi").as_str(), "vpn_branch_guest_wifi");
    }

    #[test]
    fn test_namer_is_deterministic() {
        let namer = SessionNamer::new("{profile_safe}-ovpn");
        assert_eq!(namer.name("hq", "dev"), namer.name("hq", "dev"));
        assert_ne!(namer.name("hq", "dev"), namer.name("hq", "prod"));
    }

    #[test]
    fn test_run_program_collects_output() {
        let temp_dir = TempDir::new().unwrap();
        let output = run_program("pwd", &[], Some(temp_dir.path())).unwrap();
        assert!(output.status.success());

        let printed = String::from_utf8_lossy(&output.stdout);
        let printed = std::fs::canonicalize(printed.trim()).unwrap();
        assert_eq!(printed, std::fs::canonicalize(temp_dir.path()).unwrap());
    }

    #[test]
    fn test_run_program_missing_binary() {
        let result = run_program("vpnmux-test-no-such-program", &["-ls".to_string()], None);
        match result {
            Err(SessionError::SpawnError { program, .. }) => {
                assert_eq!(program, "vpnmux-test-no-such-program");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_tail_lines() {
        let output = "one\n\n  two  \nthree\n   \nfour\n";
        assert_eq!(tail_lines(output, 3), vec!["two", "three", "four"]);
        assert_eq!(tail_lines(output, 10).len(), 4);
        assert!(tail_lines("", 3).is_empty());
    }

    #[test]
    fn test_backend_selection() {
        let mut config = SessionConfig {
            kind: SessionKind::Screen,
            name_template: "{profile_safe}".to_string(),
            daemon_mode: true,
            startup_delay: 0,
        };
        assert_eq!(backend(&config).kind(), SessionKind::Screen);

        config.kind = SessionKind::Tmux;
        assert_eq!(backend(&config).kind(), SessionKind::Tmux);
    }

    #[test]
    fn test_session_error_display() {
        let err = SessionError::LaunchError {
            session: "vpn_hq_prod".to_string(),
            message: "exit status 1".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to start session vpn_hq_prod: exit status 1"
        );
    }
}
