//! Exact and compound profile lookup

use super::ResolvedProfile;
use crate::config::{Config, LocationConfig, NetworkConfig};
use tracing::debug;

/// Maps a typed identifier to a configured profile
///
/// Lookup order, first match wins:
///
/// 1. a network name, across all locations
/// 2. a network alias, across all locations
/// 3. `"<location> <network or alias>"` within that location only
///
/// Duplicate names across locations resolve to whichever comes first in
/// the configuration.
pub struct ProfileResolver<'a> {
    config: &'a Config,
}

impl<'a> ProfileResolver<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    pub fn resolve(&self, input: &str) -> Option<ResolvedProfile> {
        let found = self
            .by_network_name(input)
            .or_else(|| self.by_alias(input))
            .or_else(|| self.by_location_and_network(input));

        match &found {
            Some(profile) => debug!(
                "Resolved '{}' -> {} {}",
                input, profile.location, profile.network
            ),
            None => debug!("No profile matches '{}'", input),
        }
        found
    }

    fn by_network_name(&self, input: &str) -> Option<ResolvedProfile> {
        self.networks()
            .find(|(_, _, network, _)| *network == input)
            .map(|(location, loc, network, net)| self.resolved(location, loc, network, net))
    }

    fn by_alias(&self, input: &str) -> Option<ResolvedProfile> {
        self.networks()
            .find(|(_, _, _, net)| net.aliases.iter().any(|alias| alias == input))
            .map(|(location, loc, network, net)| self.resolved(location, loc, network, net))
    }

    fn by_location_and_network(&self, input: &str) -> Option<ResolvedProfile> {
        let mut parts = input.split_whitespace();
        let location = parts.next()?;
        let remainder = parts.collect::<Vec<_>>().join(" ");
        if remainder.is_empty() {
            return None;
        }

        let (location, loc) = self.config.profiles.get_key_value(location)?;
        loc.networks
            .iter()
            .find(|(network, net)| {
                **network == remainder || net.aliases.iter().any(|alias| *alias == remainder)
            })
            .map(|(network, net)| self.resolved(location, loc, network, net))
    }

    fn networks(&self) -> impl Iterator<Item = (&'a str, &'a LocationConfig, &'a str, &'a NetworkConfig)> {
        self.config.profiles.iter().flat_map(|(location, loc)| {
            loc.networks
                .iter()
                .map(move |(network, net)| (location.as_str(), loc, network.as_str(), net))
        })
    }

    fn resolved(
        &self,
        location: &str,
        loc: &LocationConfig,
        network: &str,
        net: &NetworkConfig,
    ) -> ResolvedProfile {
        ResolvedProfile {
            location: location.to_string(),
            network: network.to_string(),
            file_path: self.config.base_dir.join(&loc.directory).join(&net.file),
        }
    }
}
