//! Engine integration.
//!
//! The server only knows engines through [`EngineConnector`]. The bundled
//! [`EchoConnector`] is a stand-in used by the default binary and by tests.

pub mod connector;
pub mod echo;

pub use connector::{EngineConnector, EngineError, FinishReason, GenerationOutput, GenerationRequest};
pub use echo::EchoConnector;
