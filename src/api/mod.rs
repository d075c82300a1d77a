//! Reference route table.
//!
//! An OpenAI-style surface over whatever engine the server was built with.
//! Handlers find the engine through the [`AppContext`] they are given.

pub mod handlers;
pub mod protocol;

use axum::{
    routing::{get, post},
    Router,
};

use crate::http::AppContext;
use self::handlers::*;

pub fn router() -> Router<AppContext> {
    Router::new()
        .route("/health", get(health))
        .route("/v1/models", get(list_models))
        .route("/v1/completions", post(create_completion))
}
