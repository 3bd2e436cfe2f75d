//! Exclusivity rules checked before every connect
//!
//! Two rules apply, in order:
//!
//! 1. A profile without `allow_multiple` may not already be running. The
//!    operator can have the existing session killed or abort.
//! 2. A location without `allow_simultaneous` may only have one live
//!    session. The operator can have all of them killed or abort.
//!
//! This is a point-in-time check, not a lock: sessions started by someone
//! else between the check and the launch are not prevented.

use crate::config::Config;
use crate::profile::ResolvedProfile;
use crate::prompt::Confirm;
use crate::session::{Multiplexer, SessionName, SessionNamer};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SimultaneityError {
    #[error("Connection cancelled")]
    Declined,
    #[error("Failed to kill existing session {0}")]
    TerminateFailed(SessionName),
}

pub struct SimultaneityController<'a> {
    config: &'a Config,
    namer: &'a SessionNamer,
    mux: &'a dyn Multiplexer,
    prompt: &'a dyn Confirm,
}

impl<'a> SimultaneityController<'a> {
    pub fn new(
        config: &'a Config,
        namer: &'a SessionNamer,
        mux: &'a dyn Multiplexer,
        prompt: &'a dyn Confirm,
    ) -> Self {
        Self {
            config,
            namer,
            mux,
            prompt,
        }
    }

    /// Clear the way for `profile` to be launched
    pub fn authorize(&self, profile: &ResolvedProfile) -> Result<(), SimultaneityError> {
        let Some(loc) = self.config.profiles.get(&profile.location) else {
            return Ok(());
        };
        let allow_multiple = loc
            .networks
            .get(&profile.network)
            .is_some_and(|net| net.allow_multiple);

        let session = self.namer.name(&profile.location, &profile.network);
        if !allow_multiple && self.mux.exists(&session) {
            println!(
                "Connection already exists: {} {}",
                profile.location, profile.network
            );
            if !self.prompt.confirm("Kill existing connection and reconnect?") {
                info!("Operator kept existing session {}", session);
                return Err(SimultaneityError::Declined);
            }
            if !self.mux.terminate(&session) {
                eprintln!("Failed to kill existing session");
                return Err(SimultaneityError::TerminateFailed(session));
            }
            info!("Killed existing session {}", session);
        }

        if !loc.allow_simultaneous {
            let existing = self.location_sessions(&profile.location);
            if !existing.is_empty() {
                println!(
                    "Location '{}' does not allow simultaneous connections.",
                    profile.location
                );
                println!("Existing connections:");
                for name in &existing {
                    println!("  {}", name);
                }
                if !self
                    .prompt
                    .confirm("Kill all existing connections from this location?")
                {
                    return Err(SimultaneityError::Declined);
                }
                for name in &existing {
                    if self.mux.terminate(name) {
                        info!("Killed session {}", name);
                    } else {
                        warn!("Failed to kill session {}", name);
                    }
                }
            }
        }

        Ok(())
    }

    /// Live sessions of every network under `location`
    pub fn location_sessions(&self, location: &str) -> Vec<SessionName> {
        let Some(loc) = self.config.profiles.get(location) else {
            return Vec::new();
        };
        loc.networks
            .keys()
            .map(|network| self.namer.name(location, network))
            .filter(|name| self.mux.exists(name))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::tests::fixture;
    use crate::profile::ProfileResolver;
    use crate::test_support::{FakeMultiplexer, ScriptedConfirm};

    fn authorize(
        input: &str,
        mux: &FakeMultiplexer,
        prompt: &ScriptedConfirm,
    ) -> Result<(), SimultaneityError> {
        let config = fixture();
        let namer = SessionNamer::from_config(&config.session);
        let profile = ProfileResolver::new(&config).resolve(input).unwrap();
        SimultaneityController::new(&config, &namer, mux, prompt).authorize(&profile)
    }

    #[test]
    fn test_no_sessions_authorizes_without_asking() {
        let mux = FakeMultiplexer::default();
        let prompt = ScriptedConfirm::answering(&[]);

        assert!(authorize("prod", &mux, &prompt).is_ok());
        assert!(prompt.questions().is_empty());
    }

    #[test]
    fn test_existing_session_declined_is_left_alone() {
        let mux = FakeMultiplexer::with_live(&["vpn_hq_prod"]);
        let prompt = ScriptedConfirm::answering(&[false]);

        assert_eq!(
            authorize("prod", &mux, &prompt),
            Err(SimultaneityError::Declined)
        );
        assert_eq!(mux.live(), vec!["vpn_hq_prod"]);
        assert!(mux.terminated().is_empty());
        assert_eq!(prompt.questions().len(), 1);
    }

    #[test]
    fn test_existing_session_confirmed_is_killed() {
        let mux = FakeMultiplexer::with_live(&["vpn_hq_prod"]);
        let prompt = ScriptedConfirm::answering(&[true]);

        assert!(authorize("prod", &mux, &prompt).is_ok());
        assert!(mux.live().is_empty());
        // The location check found nothing left to ask about
        assert_eq!(prompt.questions().len(), 1);
    }

    #[test]
    fn test_existing_session_kill_failure_aborts() {
        let mux = FakeMultiplexer::with_live(&["vpn_hq_prod"]);
        mux.state
            .borrow_mut()
            .refuse_terminate
            .insert("vpn_hq_prod".to_string());
        let prompt = ScriptedConfirm::answering(&[true]);

        assert_eq!(
            authorize("prod", &mux, &prompt),
            Err(SimultaneityError::TerminateFailed(SessionName::from("vpn_hq_prod")))
        );
    }

    #[test]
    fn test_allow_multiple_skips_own_session_check() {
        // branch allows simultaneous sessions and its prod allows multiple
        let mux = FakeMultiplexer::with_live(&["vpn_branch_prod"]);
        let prompt = ScriptedConfirm::answering(&[]);

        assert!(authorize("branch prod", &mux, &prompt).is_ok());
        assert!(prompt.questions().is_empty());
        assert_eq!(mux.live(), vec!["vpn_branch_prod"]);
    }

    #[test]
    fn test_exclusive_location_declined() {
        let mux = FakeMultiplexer::with_live(&["vpn_hq_dev"]);
        let prompt = ScriptedConfirm::answering(&[false]);

        assert_eq!(
            authorize("prod", &mux, &prompt),
            Err(SimultaneityError::Declined)
        );
        assert_eq!(mux.live(), vec!["vpn_hq_dev"]);
        assert_eq!(
            prompt.questions(),
            vec!["Kill all existing connections from this location?"]
        );
    }

    #[test]
    fn test_exclusive_location_confirmed_kills_all() {
        let mux = FakeMultiplexer::with_live(&["vpn_hq_dev", "vpn_branch_prod"]);
        let prompt = ScriptedConfirm::answering(&[true]);

        assert!(authorize("prod", &mux, &prompt).is_ok());
        assert_eq!(mux.terminated(), vec!["vpn_hq_dev"]);
        // Other locations are untouched
        assert_eq!(mux.live(), vec!["vpn_branch_prod"]);
    }

    #[test]
    fn test_exclusive_location_kill_failures_are_best_effort() {
        let mux = FakeMultiplexer::with_live(&["vpn_hq_dev"]);
        mux.state
            .borrow_mut()
            .refuse_terminate
            .insert("vpn_hq_dev".to_string());
        let prompt = ScriptedConfirm::answering(&[true]);

        assert!(authorize("prod", &mux, &prompt).is_ok());
        assert_eq!(mux.live(), vec!["vpn_hq_dev"]);
    }

    #[test]
    fn test_simultaneous_location_ignores_siblings() {
        let mux = FakeMultiplexer::with_live(&["vpn_branch_prod"]);
        let prompt = ScriptedConfirm::answering(&[]);

        assert!(authorize("guest", &mux, &prompt).is_ok());
        assert!(prompt.questions().is_empty());
    }

    #[test]
    fn test_location_sessions() {
        let config = fixture();
        let namer = SessionNamer::from_config(&config.session);
        let mux = FakeMultiplexer::with_live(&["vpn_hq_dev", "vpn_hq_prod", "vpn_branch_prod"]);
        let prompt = ScriptedConfirm::default();
        let controller = SimultaneityController::new(&config, &namer, &mux, &prompt);

        // Config order, not session table order
        assert_eq!(
            controller.location_sessions("hq"),
            vec![SessionName::from("vpn_hq_prod"), SessionName::from("vpn_hq_dev")]
        );
        assert!(controller.location_sessions("nowhere").is_empty());
    }
}
