//! Server lifecycle state machine.
//!
//! # States
//! ```text
//! Uninitialized → Starting → Serving → Stopping → Stopped
//!                    │                               ▲
//!                    └───── engine start failed ─────┘
//! ```

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;

use crate::observability::metrics;

/// Where the server is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Uninitialized,
    Starting,
    Serving,
    Stopping,
    Stopped,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Uninitialized => "uninitialized",
            Phase::Starting => "starting",
            Phase::Serving => "serving",
            Phase::Stopping => "stopping",
            Phase::Stopped => "stopped",
        }
    }

    /// Whether `self → next` is an edge of the state machine.
    pub fn can_advance_to(self, next: Phase) -> bool {
        matches!(
            (self, next),
            (Phase::Uninitialized, Phase::Starting)
                | (Phase::Starting, Phase::Serving)
                | (Phase::Starting, Phase::Stopped)
                | (Phase::Serving, Phase::Stopping)
                | (Phase::Stopping, Phase::Stopped)
        )
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared, observable lifecycle phase.
///
/// Cloning is cheap; every clone observes the same state.
#[derive(Debug, Clone)]
pub struct PhaseTracker {
    tx: Arc<watch::Sender<Phase>>,
}

impl PhaseTracker {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(Phase::Uninitialized);
        Self { tx: Arc::new(tx) }
    }

    /// Current phase.
    pub fn current(&self) -> Phase {
        *self.tx.borrow()
    }

    /// Move to `next` if the transition is legal. Returns whether it happened.
    pub fn advance(&self, next: Phase) -> bool {
        let mut from = next;
        let moved = self.tx.send_if_modified(|phase| {
            from = *phase;
            if phase.can_advance_to(next) {
                *phase = next;
                true
            } else {
                false
            }
        });

        if moved {
            tracing::info!(from = %from, to = %next, "Lifecycle transition");
            metrics::record_transition(next);
        } else {
            tracing::error!(from = %from, to = %next, "Rejected lifecycle transition");
        }
        moved
    }

    /// Receiver that observes every transition.
    pub fn subscribe(&self) -> watch::Receiver<Phase> {
        self.tx.subscribe()
    }

    /// Wait until the phase equals `target`.
    ///
    /// Returns `false` if the phase can no longer reach `target`.
    pub async fn wait_for(&self, target: Phase) -> bool {
        let mut rx = self.subscribe();
        let reached = match rx
            .wait_for(|phase| *phase == target || *phase == Phase::Stopped)
            .await
        {
            Ok(phase) => *phase == target,
            Err(_) => false,
        };
        reached
    }
}

impl Default for PhaseTracker {
    fn default() -> Self {
        Self::new()
    }
}
