//! External VPN client process
//!
//! The client runs inside a multiplexer session and is otherwise opaque:
//! nothing here watches its output or verifies the tunnel.

use crate::config::ClientConfig;
use std::path::Path;
use std::process::Command;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Failed to stop {program} processes: {source}")]
    KillError {
        program: String,
        source: std::io::Error,
    },
}

pub struct VpnClient {
    program: String,
    sudo: bool,
}

impl VpnClient {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            program: config.program.clone(),
            sudo: config.sudo,
        }
    }

    fn with_privilege(&self, mut argv: Vec<String>) -> Vec<String> {
        if self.sudo {
            argv.insert(0, "sudo".to_string());
        }
        argv
    }

    /// Command line that runs the client against one config file
    pub fn launch_argv(&self, config_file: &Path) -> Vec<String> {
        self.with_privilege(vec![
            self.program.clone(),
            "--config".to_string(),
            config_file.to_string_lossy().to_string(),
        ])
    }

    /// Process name `pkill` matches against
    ///
    /// pkill compares process names, never paths, so a configured
    /// `/usr/sbin/openvpn` has to be reduced to `openvpn`.
    fn process_name(&self) -> String {
        Path::new(&self.program)
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.clone())
    }

    /// Command line that signals every client process on the machine
    pub fn kill_all_argv(&self) -> Vec<String> {
        self.with_privilege(vec!["pkill".to_string(), self.process_name()])
    }

    /// Stop every client process, including ones vpnmux did not start
    ///
    /// Finding no process to kill is not an error.
    pub fn kill_all(&self) -> Result<(), ClientError> {
        let argv = self.kill_all_argv();
        debug!("Running {:?}", argv);

        let status = Command::new(&argv[0])
            .args(&argv[1..])
            .status()
            .map_err(|e| ClientError::KillError {
                program: self.program.clone(),
                source: e,
            })?;

        info!("{} exited with {}", argv.join(" "), status);
        Ok(())
    }
}
