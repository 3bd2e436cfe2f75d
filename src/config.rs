//! Configuration handling for vpnmux
//!
//! The configuration is a TOML document loaded once at startup and passed
//! by value to the components that need it. Locations and networks are kept
//! in document order so that first-match lookups are deterministic.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Placeholder substituted with the sanitized profile token in session names
pub const PROFILE_PLACEHOLDER: &str = "{profile_safe}";

const LOCAL_CONFIG: &str = "vpnmux.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),
    #[error("Invalid session name template '{0}': must contain {{profile_safe}}")]
    InvalidTemplate(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub base_dir: PathBuf,
    pub session: SessionConfig,
    #[serde(default)]
    pub fuzzy_matching: FuzzyConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub hooks: HooksConfig,
    #[serde(default)]
    pub profiles: IndexMap<String, LocationConfig>,
}

/// Which terminal multiplexer hosts the VPN client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    Screen,
    Tmux,
}

impl std::fmt::Display for SessionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionKind::Screen => write!(f, "screen"),
            SessionKind::Tmux => write!(f, "tmux"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(rename = "type")]
    pub kind: SessionKind,
    pub name_template: String,
    /// Start screen sessions detached (`-d -m`)
    #[serde(default = "default_true")]
    pub daemon_mode: bool,
    /// Seconds to wait after launch before running post-connect hooks
    #[serde(default = "default_startup_delay")]
    pub startup_delay: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuzzyConfig {
    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,
}

impl Default for FuzzyConfig {
    fn default() -> Self {
        Self {
            max_suggestions: default_max_suggestions(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_file")]
    pub file: Option<PathBuf>,
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: default_log_file(),
            level: default_log_level(),
        }
    }
}

/// External VPN client launched inside each session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_client_program")]
    pub program: String,
    #[serde(default = "default_true")]
    pub sudo: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            program: default_client_program(),
            sudo: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HooksConfig {
    #[serde(default)]
    pub pre_connect: Vec<Hook>,
    #[serde(default)]
    pub post_connect: Vec<Hook>,
    #[serde(default)]
    pub pre_disconnect: Vec<Hook>,
    #[serde(default)]
    pub post_disconnect: Vec<Hook>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hook {
    pub name: String,
    /// Shell command, run through `sh -c`
    pub command: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    /// Directory under `base_dir` holding this location's client configs
    pub directory: PathBuf,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub allow_simultaneous: bool,
    #[serde(default)]
    pub networks: IndexMap<String, NetworkConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub file: PathBuf,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub allow_multiple: bool,
}

fn default_true() -> bool {
    true
}

fn default_startup_delay() -> u64 {
    10
}

fn default_max_suggestions() -> usize {
    3
}

fn default_log_file() -> Option<PathBuf> {
    Some(PathBuf::from("/tmp/vpnmux.log"))
}

fn default_log_level() -> String {
    "INFO".to_string()
}

fn default_client_program() -> String {
    "openvpn".to_string()
}

impl Default for Config {
    fn default() -> Self {
        let mut networks = IndexMap::new();
        networks.insert(
            "prod".to_string(),
            NetworkConfig {
                file: PathBuf::from("prod.ovpn"),
                description: "Production network".to_string(),
                aliases: vec!["production".to_string()],
                allow_multiple: false,
            },
        );
        networks.insert(
            "dev".to_string(),
            NetworkConfig {
                file: PathBuf::from("dev.ovpn"),
                description: "Development network".to_string(),
                aliases: vec!["development".to_string()],
                allow_multiple: false,
            },
        );

        let mut profiles = IndexMap::new();
        profiles.insert(
            "hq".to_string(),
            LocationConfig {
                directory: PathBuf::from("hq"),
                description: "Headquarters".to_string(),
                allow_simultaneous: false,
                networks,
            },
        );

        let base_dir = dirs::home_dir()
            .map(|home| home.join("ovpn"))
            .unwrap_or_else(|| PathBuf::from("/etc/openvpn"));

        Self {
            base_dir,
            session: SessionConfig {
                kind: SessionKind::Tmux,
                name_template: format!("vpn_{PROFILE_PLACEHOLDER}"),
                daemon_mode: true,
                startup_delay: default_startup_delay(),
            },
            fuzzy_matching: FuzzyConfig::default(),
            logging: LoggingConfig::default(),
            client: ClientConfig::default(),
            hooks: HooksConfig::default(),
            profiles,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse and validate a configuration document
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.session.name_template.contains(PROFILE_PLACEHOLDER) {
            return Err(ConfigError::InvalidTemplate(
                self.session.name_template.clone(),
            ));
        }
        Ok(())
    }

    /// Find the config file to use
    ///
    /// An explicit path always wins, even when it does not exist. Otherwise
    /// `./vpnmux.toml` is tried, then `<config dir>/vpnmux/config.toml`.
    pub fn locate(explicit: Option<&Path>) -> Result<PathBuf, ConfigError> {
        if let Some(path) = explicit {
            return Ok(path.to_path_buf());
        }

        let local = PathBuf::from(LOCAL_CONFIG);
        if local.exists() {
            return Ok(local);
        }

        let user = Self::user_config_path();
        match user {
            Some(path) if path.exists() => Ok(path),
            Some(path) => Err(ConfigError::NotFound(path)),
            None => Err(ConfigError::NotFound(local)),
        }
    }

    /// `<config dir>/vpnmux/config.toml`, if the platform has a config dir
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("vpnmux").join("config.toml"))
    }
}
