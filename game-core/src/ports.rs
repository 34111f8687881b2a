//! Collaborators the controller talks to without knowing how they work: a
//! best-effort store for the last roster and a one-second countdown source.

use crate::session::validate_names;
use crate::{MAX_PLAYERS, MIN_PLAYERS};

/// Key-value store for the last committed roster.
///
/// Loading never fails: a missing or unreadable store is reported as `None`.
/// Saving is best effort and swallows its own failures.
pub trait NameCache {
    fn load(&self) -> Option<Vec<String>>;
    fn save(&mut self, names: &[String]);
}

/// Countdown source for the Playing phase.
///
/// After `cancel` returns, no tick from the cancelled run may reach the controller.
pub trait RoundTimer {
    fn start(&mut self);
    fn cancel(&mut self);
    fn is_running(&self) -> bool;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryNameCache {
    names: Option<Vec<String>>,
}

impl MemoryNameCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_names(names: Vec<String>) -> Self {
        Self { names: Some(names) }
    }
}

impl NameCache for MemoryNameCache {
    fn load(&self) -> Option<Vec<String>> {
        self.names.clone()
    }

    fn save(&mut self, names: &[String]) {
        self.names = Some(names.to_vec());
    }
}

/// Timer for callers that feed `TimerTick` themselves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ManualTimer {
    running: bool,
    starts: usize,
    cancels: usize,
}

impl ManualTimer {
    pub fn starts(&self) -> usize {
        self.starts
    }

    pub fn cancels(&self) -> usize {
        self.cancels
    }
}

impl RoundTimer for ManualTimer {
    fn start(&mut self) {
        self.running = true;
        self.starts += 1;
    }

    fn cancel(&mut self) {
        self.running = false;
        self.cancels += 1;
    }

    fn is_running(&self) -> bool {
        self.running
    }
}

/// A cached roster is usable only if it could have been committed by `SubmitNames`.
/// Returns the names as `SubmitNames` would store them, trimmed.
pub fn usable_roster(names: Option<Vec<String>>) -> Option<Vec<String>> {
    let names = names?;
    let count = names.len();
    if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&count) {
        return None;
    }
    validate_names(names, count).ok()
}
