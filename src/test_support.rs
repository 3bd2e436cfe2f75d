//! Test doubles for the multiplexer and operator prompts

use crate::config::SessionKind;
use crate::prompt::Confirm;
use crate::session::{Multiplexer, SessionError, SessionName};
use std::cell::RefCell;
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::rc::Rc;

#[derive(Default)]
pub struct FakeState {
    pub live: Vec<String>,
    pub launched: Vec<(String, PathBuf, Vec<String>)>,
    pub terminated: Vec<String>,
    pub refuse_terminate: HashSet<String>,
    pub refuse_launch: bool,
}

/// In-memory session table; clones share state
#[derive(Clone, Default)]
pub struct FakeMultiplexer {
    pub state: Rc<RefCell<FakeState>>,
}

impl FakeMultiplexer {
    pub fn with_live(names: &[&str]) -> Self {
        let mux = Self::default();
        mux.state.borrow_mut().live = names.iter().map(|n| n.to_string()).collect();
        mux
    }

    pub fn live(&self) -> Vec<String> {
        self.state.borrow().live.clone()
    }

    pub fn terminated(&self) -> Vec<String> {
        self.state.borrow().terminated.clone()
    }

    pub fn launched(&self) -> Vec<(String, PathBuf, Vec<String>)> {
        self.state.borrow().launched.clone()
    }
}

impl Multiplexer for FakeMultiplexer {
    fn kind(&self) -> SessionKind {
        SessionKind::Tmux
    }

    fn exists(&self, name: &SessionName) -> bool {
        self.state.borrow().live.iter().any(|live| live == name.as_str())
    }

    fn terminate(&self, name: &SessionName) -> bool {
        let mut state = self.state.borrow_mut();
        if state.refuse_terminate.contains(name.as_str()) {
            return false;
        }
        let before = state.live.len();
        state.live.retain(|live| live != name.as_str());
        let killed = state.live.len() < before;
        if killed {
            state.terminated.push(name.to_string());
        }
        killed
    }

    fn launch(&self, name: &SessionName, cwd: &Path, command: &[String]) -> Result<(), SessionError> {
        let mut state = self.state.borrow_mut();
        if state.refuse_launch || state.live.iter().any(|live| live == name.as_str()) {
            return Err(SessionError::LaunchError {
                session: name.to_string(),
                message: "duplicate session".to_string(),
            });
        }
        state.live.push(name.to_string());
        state
            .launched
            .push((name.to_string(), cwd.to_path_buf(), command.to_vec()));
        Ok(())
    }

    fn capture(&self, name: &SessionName, _lines: usize) -> Option<Vec<String>> {
        if self.exists(name) {
            Some(vec![format!("{} Initialization Sequence Completed", name)])
        } else {
            None
        }
    }
}

/// Answers prompts from a fixed script; runs out to "no"
#[derive(Clone, Default)]
pub struct ScriptedConfirm {
    answers: Rc<RefCell<VecDeque<bool>>>,
    pub asked: Rc<RefCell<Vec<String>>>,
}

impl ScriptedConfirm {
    pub fn answering(answers: &[bool]) -> Self {
        Self {
            answers: Rc::new(RefCell::new(answers.iter().copied().collect())),
            asked: Rc::default(),
        }
    }

    pub fn questions(&self) -> Vec<String> {
        self.asked.borrow().clone()
    }
}

impl Confirm for ScriptedConfirm {
    fn confirm(&self, question: &str) -> bool {
        self.asked.borrow_mut().push(question.to_string());
        self.answers.borrow_mut().pop_front().unwrap_or(false)
    }
}

/// Whether `pkill` can be run on this machine
pub fn pkill_available() -> bool {
    std::process::Command::new("pkill")
        .arg("-V")
        .output()
        .is_ok()
}
