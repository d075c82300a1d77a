//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (lifespan.rs):
//!     Engine start → publish connector → accept traffic
//!
//! Shutdown (shutdown.rs, signals.rs):
//!     Signal received → stop accepting → drain requests → engine stop
//!
//! Phase (phase.rs):
//!     Uninitialized → Starting → Serving → Stopping → Stopped
//! ```
//!
//! # Design Decisions
//! - Fail fast: an engine start error is fatal, nothing is served
//! - The engine stop runs on every exit path after a successful start
//! - Engine stop has an optional deadline: overrun is reported as an error

pub mod lifespan;
pub mod phase;
pub mod shutdown;
pub mod signals;

pub use lifespan::{Lifespan, LifecycleError};
pub use phase::{Phase, PhaseTracker};
pub use shutdown::Shutdown;
