//! Process availability state.
//!
//! # States
//! - Readiness: AcceptingTraffic / RefusingTraffic (initially accepting)
//! - Liveness: Correct / Broken (initially correct)
//!
//! # Design Decisions
//! - Each holder is a single atomic; every write overwrites, last write wins
//! - Readers may observe a slightly stale value; no ordering with the
//!   health response is needed
//! - State is in-memory only and resets on restart

use std::sync::atomic::{AtomicU8, Ordering};

/// Whether the process should receive new traffic.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessState {
    AcceptingTraffic = 0,
    RefusingTraffic = 1,
}

impl From<u8> for ReadinessState {
    fn from(val: u8) -> Self {
        match val {
            0 => ReadinessState::AcceptingTraffic,
            _ => ReadinessState::RefusingTraffic,
        }
    }
}

/// Whether the process is in a working state.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LivenessState {
    Correct = 0,
    Broken = 1,
}

impl From<u8> for LivenessState {
    fn from(val: u8) -> Self {
        match val {
            0 => LivenessState::Correct,
            _ => LivenessState::Broken,
        }
    }
}

/// Current readiness, shared by the health endpoint and the event source.
#[derive(Debug)]
pub struct Readiness {
    state: AtomicU8,
}

impl Readiness {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(ReadinessState::AcceptingTraffic as u8),
        }
    }

    /// Overwrite the current state.
    pub fn apply(&self, state: ReadinessState) {
        self.state.store(state as u8, Ordering::Relaxed);
    }

    pub fn current(&self) -> ReadinessState {
        ReadinessState::from(self.state.load(Ordering::Relaxed))
    }
}

impl Default for Readiness {
    fn default() -> Self {
        Self::new()
    }
}

/// Current liveness.
#[derive(Debug)]
pub struct Liveness {
    state: AtomicU8,
}

impl Liveness {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(LivenessState::Correct as u8),
        }
    }

    pub fn apply(&self, state: LivenessState) {
        self.state.store(state as u8, Ordering::Relaxed);
    }

    pub fn current(&self) -> LivenessState {
        LivenessState::from(self.state.load(Ordering::Relaxed))
    }
}

impl Default for Liveness {
    fn default() -> Self {
        Self::new()
    }
}
