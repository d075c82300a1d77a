//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → cors.rs (preflight answered here, headers added on the way out)
//!     → request.rs (request ID assigned and echoed)
//!     → server.rs (trace span, timeout, metrics)
//!     → mounted routes, handed an AppContext (state.rs)
//!     → response.rs (handler errors mapped to responses)
//!     → Send to client
//! ```

pub mod cors;
pub mod request;
pub mod response;
pub mod server;
pub mod state;

pub use request::{RequestIdExt, X_REQUEST_ID};
pub use response::{ApiError, ErrorHandlers, ErrorKind};
pub use server::{create_app, App, ServeError};
pub use state::AppContext;
