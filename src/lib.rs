//! HTTP front-end for an inference engine.
//!
//! [`create_app`] composes a server around an [`EngineConnector`] and a route
//! table; [`App::serve`] runs the engine lifecycle around the serving loop.

pub mod api;
pub mod config;
pub mod engine;
pub mod errors;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::ServeConfig;
pub use engine::EngineConnector;
pub use errors::TokenValidationError;
pub use http::{create_app, App, AppContext, ServeError};
pub use lifecycle::Shutdown;
