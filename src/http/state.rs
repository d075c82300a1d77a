//! Application context injected into every handler.

use std::sync::Arc;

use arc_swap::ArcSwapOption;

use crate::engine::EngineConnector;
use crate::lifecycle::{Phase, PhaseTracker};

/// Slot content for the published connector.
///
/// `ArcSwapOption` needs a sized pointee, so the trait object is wrapped once more.
struct Published(Arc<dyn EngineConnector>);

/// State shared by all request handlers.
///
/// Cheap to clone: every clone refers to the same connector slot and phase.
/// The connector is only visible while the server is serving.
#[derive(Clone)]
pub struct AppContext {
    connector: Arc<ArcSwapOption<Published>>,
    phase: PhaseTracker,
}

impl AppContext {
    pub fn new() -> Self {
        Self {
            connector: Arc::new(ArcSwapOption::empty()),
            phase: PhaseTracker::new(),
        }
    }

    /// The running engine, if one is published.
    pub fn connector(&self) -> Option<Arc<dyn EngineConnector>> {
        self.connector
            .load_full()
            .map(|published| Arc::clone(&published.0))
    }

    /// Make a started connector visible to handlers.
    pub fn publish(&self, connector: Arc<dyn EngineConnector>) {
        self.connector.store(Some(Arc::new(Published(connector))));
    }

    /// Hide the connector from handlers; returns what was published.
    pub fn retract(&self) -> Option<Arc<dyn EngineConnector>> {
        self.connector
            .swap(None)
            .map(|published| Arc::clone(&published.0))
    }

    pub fn phase(&self) -> &PhaseTracker {
        &self.phase
    }

    /// Shorthand for the current lifecycle phase.
    pub fn current_phase(&self) -> Phase {
        self.phase.current()
    }
}

impl Default for AppContext {
    fn default() -> Self {
        Self::new()
    }
}
