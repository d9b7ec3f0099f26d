//! Availability change feed.
//!
//! # Responsibilities
//! - Accept availability transitions from the process (startup, shutdown,
//!   operator hooks)
//! - Apply each transition to the shared holders
//! - Rebroadcast transitions to any other interested task

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::health::state::{Liveness, LivenessState, Readiness, ReadinessState};

/// A single availability transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvailabilityChange {
    Liveness(LivenessState),
    Readiness(ReadinessState),
}

/// Publisher side of the availability feed. Cheap to clone.
#[derive(Debug, Clone)]
pub struct AvailabilityEvents {
    readiness: Arc<Readiness>,
    liveness: Arc<Liveness>,
    tx: broadcast::Sender<AvailabilityChange>,
}

impl AvailabilityEvents {
    pub fn new(readiness: Arc<Readiness>, liveness: Arc<Liveness>) -> Self {
        let (tx, _) = broadcast::channel(16);
        Self {
            readiness,
            liveness,
            tx,
        }
    }

    /// Apply `change` to its holder, then notify subscribers.
    pub fn publish(&self, change: AvailabilityChange) {
        match change {
            AvailabilityChange::Readiness(state) => self.readiness.apply(state),
            AvailabilityChange::Liveness(state) => self.liveness.apply(state),
        }
        tracing::info!(change = ?change, "availability_changed");

        // No subscribers is fine; the holders are already updated.
        let _ = self.tx.send(change);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AvailabilityChange> {
        self.tx.subscribe()
    }

    pub fn readiness(&self) -> &Arc<Readiness> {
        &self.readiness
    }

    pub fn liveness(&self) -> &Arc<Liveness> {
        &self.liveness
    }
}

impl Default for AvailabilityEvents {
    fn default() -> Self {
        Self::new(Arc::new(Readiness::new()), Arc::new(Liveness::new()))
    }
}
