//! Profile identity, resolution and suggestions
//!
//! A profile is a `(location, network)` pair from the configuration.
//! Connecting requires an exact match (optionally in compound
//! `"<location> <network>"` form); fuzzy scoring is only used to suggest
//! alternatives after a lookup fails.

pub mod resolve;
pub mod suggest;

pub use resolve::ProfileResolver;
pub use suggest::{ratio, suggest};

use crate::config::Config;
use serde::Serialize;
use std::path::PathBuf;

/// Primary identifier of a configured profile
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProfileKey {
    pub location: String,
    pub network: String,
}

impl std::fmt::Display for ProfileKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.location, self.network)
    }
}

/// A successfully resolved profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedProfile {
    pub location: String,
    pub network: String,
    /// `base_dir / location.directory / network.file`
    pub file_path: PathBuf,
}

impl ResolvedProfile {
    pub fn key(&self) -> ProfileKey {
        ProfileKey {
            location: self.location.clone(),
            network: self.network.clone(),
        }
    }
}

/// One location as shown by `list`
#[derive(Debug, Clone, Serialize)]
pub struct LocationSummary {
    pub location: String,
    pub description: String,
    pub allow_simultaneous: bool,
    pub networks: Vec<NetworkSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NetworkSummary {
    pub network: String,
    pub description: String,
    pub aliases: Vec<String>,
    pub allow_multiple: bool,
}

/// Every configured profile key, in configuration order
pub fn all_keys(config: &Config) -> Vec<ProfileKey> {
    config
        .profiles
        .iter()
        .flat_map(|(location, loc)| {
            loc.networks.keys().map(move |network| ProfileKey {
                location: location.clone(),
                network: network.clone(),
            })
        })
        .collect()
}

/// Enumerate the configuration without touching any session
pub fn catalog(config: &Config) -> Vec<LocationSummary> {
    config
        .profiles
        .iter()
        .map(|(location, loc)| LocationSummary {
            location: location.clone(),
            description: loc.description.clone(),
            allow_simultaneous: loc.allow_simultaneous,
            networks: loc
                .networks
                .iter()
                .map(|(network, net)| NetworkSummary {
                    network: network.clone(),
                    description: net.description.clone(),
                    aliases: net.aliases.clone(),
                    allow_multiple: net.allow_multiple,
                })
                .collect(),
        })
        .collect()
}
