//! GNU screen backend

use super::{run_program, tail_lines, Multiplexer, SessionError, SessionName};
use crate::config::SessionKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// How long to wait for screen to write a hardcopy
const HARDCOPY_ATTEMPTS: u32 = 10;
const HARDCOPY_INTERVAL: Duration = Duration::from_millis(50);

pub struct ScreenMultiplexer {
    program: String,
    /// Start sessions detached (`-d -m`)
    detached: bool,
}

impl ScreenMultiplexer {
    pub fn new(detached: bool) -> Self {
        Self::with_program("screen", detached)
    }

    /// Use a different screen binary
    pub fn with_program(program: impl Into<String>, detached: bool) -> Self {
        Self {
            program: program.into(),
            detached,
        }
    }

    fn launch_args(&self, name: &SessionName, command: &[String]) -> Vec<String> {
        let mut args = Vec::new();
        if self.detached {
            args.push("-d".to_string());
            args.push("-m".to_string());
        }
        args.push("-S".to_string());
        args.push(name.to_string());
        args.extend(command.iter().cloned());
        args
    }
}

impl Default for ScreenMultiplexer {
    fn default() -> Self {
        Self::new(true)
    }
}

fn kill_args(name: &SessionName) -> Vec<String> {
    vec![
        "-S".to_string(),
        name.to_string(),
        "-X".to_string(),
        "quit".to_string(),
    ]
}

fn hardcopy_args(name: &SessionName, path: &Path) -> Vec<String> {
    vec![
        "-S".to_string(),
        name.to_string(),
        "-X".to_string(),
        "hardcopy".to_string(),
        "-h".to_string(),
        path.to_string_lossy().to_string(),
    ]
}

fn hardcopy_path(name: &SessionName) -> PathBuf {
    std::env::temp_dir().join(format!("vpnmux-{}.hardcopy", name))
}

/// Read a hardcopy once screen has written it
///
/// `-X hardcopy` returns before the session writes the file, so this polls
/// until the file has content. Best-effort: `None` if it never appears.
fn read_hardcopy(path: &Path, attempts: u32, interval: Duration) -> Option<String> {
    for attempt in 0..attempts {
        if attempt > 0 {
            std::thread::sleep(interval);
        }
        match std::fs::read_to_string(path) {
            Ok(text) if !text.is_empty() => return Some(text),
            Ok(_) => {}
            Err(e) => debug!("Hardcopy {} not ready: {}", path.display(), e),
        }
    }
    None
}

/// Session names from `screen -ls` output
///
/// Sessions are listed as `<pid>.<name>` followed by their state, e.g.
/// `\t12345.vpn_hq_prod\t(Detached)`.
fn parse_sessions(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .filter_map(|token| token.split_once('.'))
        .filter(|(pid, name)| !pid.is_empty() && pid.chars().all(|c| c.is_ascii_digit()) && !name.is_empty())
        .map(|(_, name)| name.to_string())
        .collect()
}

impl Multiplexer for ScreenMultiplexer {
    fn kind(&self) -> SessionKind {
        SessionKind::Screen
    }

    fn exists(&self, name: &SessionName) -> bool {
        // screen -ls exits non-zero even when it lists sessions
        match run_program(&self.program, &["-ls".to_string()], None) {
            Ok(output) => parse_sessions(&String::from_utf8_lossy(&output.stdout))
                .iter()
                .any(|listed| listed == name.as_str()),
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
        let output = run_program(&self.program, &self.launch_args(name, command), Some(cwd))?;
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
        let path = hardcopy_path(name);
        let output = run_program(&self.program, &hardcopy_args(name, &path), None).ok()?;
        if !output.status.success() {
            return None;
        }
        let content = read_hardcopy(&path, HARDCOPY_ATTEMPTS, HARDCOPY_INTERVAL);
        let _ = std::fs::remove_file(&path);
        content.map(|text| tail_lines(&text, lines))
    }
}
