//! Lifecycle hooks
//!
//! Hooks are user-defined shell commands run before and after connecting
//! and disconnecting. Within a phase they run one at a time, in order.
//!
//! # Failure semantics
//!
//! A hook fails when it exits non-zero, exceeds the timeout, or cannot be
//! started. A failing `required` hook aborts its phase and the hooks after
//! it never run. A failing optional hook is reported and the phase carries
//! on; it never changes the phase result.

use crate::config::{Hook, HooksConfig};
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::{error, info, warn};

/// Per-hook time limit
pub const HOOK_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookPhase {
    PreConnect,
    PostConnect,
    PreDisconnect,
    PostDisconnect,
}

impl HookPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            HookPhase::PreConnect => "pre_connect",
            HookPhase::PostConnect => "post_connect",
            HookPhase::PreDisconnect => "pre_disconnect",
            HookPhase::PostDisconnect => "post_disconnect",
        }
    }
}

impl std::fmt::Display for HookPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum HookError {
    #[error("Hook {name} failed ({status}): {stderr}")]
    Failed {
        name: String,
        status: String,
        stderr: String,
    },
    #[error("Hook {name} timed out after {}s", .timeout.as_secs())]
    TimedOut { name: String, timeout: Duration },
    #[error("Hook {name} error: {source}")]
    SpawnError {
        name: String,
        source: std::io::Error,
    },
}

pub struct HookRunner {
    hooks: HooksConfig,
    timeout: Duration,
}

impl HookRunner {
    pub fn new(hooks: HooksConfig) -> Self {
        Self::with_timeout(hooks, HOOK_TIMEOUT)
    }

    pub fn with_timeout(hooks: HooksConfig, timeout: Duration) -> Self {
        Self { hooks, timeout }
    }

    fn hooks_for(&self, phase: HookPhase) -> &[Hook] {
        match phase {
            HookPhase::PreConnect => &self.hooks.pre_connect,
            HookPhase::PostConnect => &self.hooks.post_connect,
            HookPhase::PreDisconnect => &self.hooks.pre_disconnect,
            HookPhase::PostDisconnect => &self.hooks.post_disconnect,
        }
    }

    /// Run every hook of a phase
    ///
    /// Returns the first required-hook failure; optional failures are only
    /// reported.
    pub async fn run_phase(&self, phase: HookPhase) -> Result<(), HookError> {
        for hook in self.hooks_for(phase) {
            info!("Running {} hook: {} - {}", phase, hook.name, hook.description);

            match self.run_hook(hook).await {
                Ok(()) => info!("Hook {} completed successfully", hook.name),
                Err(e) if hook.required => {
                    error!("{}", e);
                    eprintln!("Required hook failed: {}", e);
                    return Err(e);
                }
                Err(e) => {
                    warn!("{}", e);
                    eprintln!("Optional hook failed: {}", e);
                }
            }
        }
        Ok(())
    }

    async fn run_hook(&self, hook: &Hook) -> Result<(), HookError> {
        let mut command = Command::new("sh");
        command
            .arg("-c")
            .arg(&hook.command)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Err(_) => {
                return Err(HookError::TimedOut {
                    name: hook.name.clone(),
                    timeout: self.timeout,
                })
            }
            Ok(result) => result.map_err(|e| HookError::SpawnError {
                name: hook.name.clone(),
                source: e,
            })?,
        };

        if !output.status.success() {
            return Err(HookError::Failed {
                name: hook.name.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}
