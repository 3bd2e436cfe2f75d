//! Connection orchestration
//!
//! `VpnManager` sequences the other components for each CLI operation:
//!
//! - connect: resolve → check config file → simultaneity → `pre_connect` →
//!   launch → stabilization delay → `post_connect`
//! - disconnect: resolve → require live session → `pre_disconnect` →
//!   terminate → `post_disconnect`; without a profile every client process
//!   on the machine is stopped instead
//! - status / list: read-only
//!
//! Every failure ends the operation with a [`ManagerError`]. Post-phase hook
//! failures are reported but never undo a connect or disconnect that already
//! happened.

use crate::client::{ClientError, VpnClient};
use crate::config::Config;
use crate::hooks::{HookError, HookPhase, HookRunner};
use crate::profile::{self, LocationSummary, ProfileKey, ProfileResolver, ResolvedProfile};
use crate::prompt::Confirm;
use crate::session::{self, Multiplexer, SessionError, SessionName, SessionNamer};
use crate::simultaneity::{SimultaneityController, SimultaneityError};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};

/// Output lines shown per live session in `status`
const STATUS_TAIL_LINES: usize = 3;

#[derive(Error, Debug)]
pub enum ManagerError {
    #[error("Profile '{input}' not found.")]
    ProfileNotFound {
        input: String,
        suggestions: Vec<String>,
    },
    #[error("VPN config file not found: {}", .0.display())]
    FileMissing(PathBuf),
    #[error(transparent)]
    Simultaneity(#[from] SimultaneityError),
    #[error("{phase} hooks failed: {source}")]
    HookFailed {
        phase: HookPhase,
        source: HookError,
    },
    #[error("Failed to start VPN connection: {0}")]
    Launch(#[from] SessionError),
    #[error("No active connection found for: {0}")]
    NotConnected(ProfileKey),
    #[error("Failed to disconnect: {0}")]
    TerminateFailed(ProfileKey),
    #[error(transparent)]
    Client(#[from] ClientError),
}

/// A profile whose session is currently running
#[derive(Debug, Clone, Serialize)]
pub struct ActiveConnection {
    pub location: String,
    pub network: String,
    pub session: SessionName,
    /// Last lines of the session's output, when they could be captured
    pub output: Vec<String>,
}

pub struct VpnManager {
    config: Config,
    namer: SessionNamer,
    mux: Box<dyn Multiplexer>,
    prompt: Box<dyn Confirm>,
    hooks: HookRunner,
    client: VpnClient,
}

impl VpnManager {
    pub fn new(config: Config, mux: Box<dyn Multiplexer>, prompt: Box<dyn Confirm>) -> Self {
        let namer = SessionNamer::from_config(&config.session);
        let hooks = HookRunner::new(config.hooks.clone());
        let client = VpnClient::new(&config.client);
        Self {
            config,
            namer,
            mux,
            prompt,
            hooks,
            client,
        }
    }

    /// Build a manager using the multiplexer named in the configuration
    pub fn from_config(config: Config, prompt: Box<dyn Confirm>) -> Self {
        let mux = session::backend(&config.session);
        info!("Using {} sessions", mux.kind());
        Self::new(config, mux, prompt)
    }

    /// Replace the per-hook timeout
    pub fn with_hook_timeout(mut self, timeout: Duration) -> Self {
        self.hooks = HookRunner::with_timeout(self.config.hooks.clone(), timeout);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn resolve(&self, input: &str) -> Result<ResolvedProfile, ManagerError> {
        ProfileResolver::new(&self.config)
            .resolve(input)
            .ok_or_else(|| ManagerError::ProfileNotFound {
                input: input.to_string(),
                suggestions: profile::suggest(
                    &self.config,
                    input,
                    self.config.fuzzy_matching.max_suggestions,
                ),
            })
    }

    async fn run_hooks(&self, phase: HookPhase) -> Result<(), ManagerError> {
        self.hooks
            .run_phase(phase)
            .await
            .map_err(|source| ManagerError::HookFailed { phase, source })
    }

    /// Run a phase whose failure should not undo what already happened
    async fn run_hooks_reporting(&self, phase: HookPhase) {
        if let Err(e) = self.run_hooks(phase).await {
            warn!("{}", e);
        }
    }

    /// Start a session for the profile matching `input`
    pub async fn connect(&self, input: &str) -> Result<SessionName, ManagerError> {
        let profile = self.resolve(input)?;
        info!(
            "Connecting {} {} using {}",
            profile.location,
            profile.network,
            profile.file_path.display()
        );

        if !profile.file_path.exists() {
            return Err(ManagerError::FileMissing(profile.file_path));
        }

        SimultaneityController::new(
            &self.config,
            &self.namer,
            self.mux.as_ref(),
            self.prompt.as_ref(),
        )
        .authorize(&profile)?;

        self.run_hooks(HookPhase::PreConnect).await?;

        let session = self.namer.name(&profile.location, &profile.network);
        let command = self.client.launch_argv(&profile.file_path);
        if let Err(e) = self.mux.launch(&session, &self.config.base_dir, &command) {
            error!("Launch of {} failed: {}", session, e);
            return Err(e.into());
        }

        println!(
            "Started VPN connection: {} {}",
            profile.location, profile.network
        );
        println!("Session: {}", session);
        info!("Started session {}", session);

        let delay = self.config.session.startup_delay;
        if delay > 0 {
            println!("Waiting {}s for connection to stabilize...", delay);
            tokio::time::sleep(Duration::from_secs(delay)).await;
        }

        self.run_hooks_reporting(HookPhase::PostConnect).await;
        Ok(session)
    }

    /// Stop one profile's session, or every VPN client when `input` is `None`
    pub async fn disconnect(&self, input: Option<&str>) -> Result<(), ManagerError> {
        let Some(input) = input else {
            return self.disconnect_all().await;
        };

        info!("Attempting to disconnect profile: '{}'", input);
        let profile = self.resolve(input)?;
        let key = profile.key();
        let session = self.namer.name(&profile.location, &profile.network);

        if !self.mux.exists(&session) {
            return Err(ManagerError::NotConnected(key));
        }

        self.run_hooks(HookPhase::PreDisconnect).await?;

        if !self.mux.terminate(&session) {
            error!("Failed to terminate session {}", session);
            return Err(ManagerError::TerminateFailed(key));
        }
        println!("Disconnected: {}", key);
        info!("Terminated session {}", session);

        self.run_hooks_reporting(HookPhase::PostDisconnect).await;
        Ok(())
    }

    async fn disconnect_all(&self) -> Result<(), ManagerError> {
        info!("Disconnecting all VPN connections");
        self.run_hooks(HookPhase::PreDisconnect).await?;

        self.client.kill_all()?;
        println!("Disconnected all VPN connections");

        self.run_hooks_reporting(HookPhase::PostDisconnect).await;
        Ok(())
    }

    /// Every configured profile with a live session, in configuration order
    pub fn status(&self) -> Vec<ActiveConnection> {
        profile::all_keys(&self.config)
            .into_iter()
            .filter_map(|key| {
                let session = self.namer.name(&key.location, &key.network);
                if !self.mux.exists(&session) {
                    return None;
                }
                let output = self
                    .mux
                    .capture(&session, STATUS_TAIL_LINES)
                    .unwrap_or_default();
                Some(ActiveConnection {
                    location: key.location,
                    network: key.network,
                    session,
                    output,
                })
            })
            .collect()
    }

    /// All configured profiles; no sessions are queried
    pub fn list_profiles(&self) -> Vec<LocationSummary> {
        profile::catalog(&self.config)
    }
}
