//! vpnmux - named OpenVPN connections hosted in screen/tmux sessions
//!
//! Each configured profile (a network within a location) is connected by
//! running the VPN client inside a deterministically named multiplexer
//! session. vpnmux keeps no state of its own: the multiplexer's session
//! table is the only record of what is connected.
//!
//! # Architecture
//!
//! - `config`: Configuration file handling (TOML)
//! - `profile`: Profile lookup and "did you mean" suggestions
//! - `session`: Session naming and the screen/tmux backends
//! - `hooks`: Lifecycle hook execution
//! - `simultaneity`: Exclusivity rules checked before connecting
//! - `client`: The external VPN client command
//! - `manager`: Orchestration of connect, disconnect, status and list
//!
//! # Usage
//!
//! ```bash
//! vpnmux connect prod
//! vpnmux connect hq guest wifi
//! vpnmux status
//! vpnmux disconnect prod
//! ```

pub mod client;
pub mod config;
pub mod hooks;
pub mod logging;
pub mod manager;
pub mod profile;
pub mod prompt;
pub mod session;
pub mod simultaneity;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::Config;
pub use manager::{ManagerError, VpnManager};
