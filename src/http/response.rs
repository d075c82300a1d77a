//! Error to response mapping.
//!
//! Handlers return [`ApiError`]. Its default rendering is a JSON error
//! envelope; the rendered response also carries the error itself as an
//! extension. The [`map_errors`] middleware looks the error's [`ErrorKind`] up
//! in an [`ErrorHandlers`] table and, when a responder is registered, replaces
//! the default response with the responder's output.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::engine::EngineError;
use crate::errors::TokenValidationError;

/// Errors surfaced by request handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    TokenValidation(#[from] TokenValidationError),

    #[error("the engine is not available")]
    EngineUnavailable,

    #[error("the model `{0}` does not exist")]
    ModelNotFound(String),

    #[error(transparent)]
    Engine(EngineError),
}

/// Discriminant of [`ApiError`] used as the mapping table key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    TokenValidation,
    EngineUnavailable,
    ModelNotFound,
    Engine,
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::TokenValidation(e) => ApiError::TokenValidation(e),
            EngineError::NotRunning => ApiError::EngineUnavailable,
            other => ApiError::Engine(other),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Serialize)]
struct ErrorDetail {
    message: String,
    #[serde(rename = "type")]
    kind: &'static str,
    code: &'static str,
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::TokenValidation(_) => ErrorKind::TokenValidation,
            ApiError::EngineUnavailable => ErrorKind::EngineUnavailable,
            ApiError::ModelNotFound(_) => ErrorKind::ModelNotFound,
            ApiError::Engine(_) => ErrorKind::Engine,
        }
    }

    /// Rendering used when no responder is registered for the error's kind.
    ///
    /// Token validation errors are not expected to reach this point, so they
    /// fall back to an opaque internal error like any other unhandled fault.
    pub fn default_response(&self) -> Response {
        let (status, kind, code, message) = match self {
            ApiError::EngineUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "server_error",
                "engine_unavailable",
                self.to_string(),
            ),
            ApiError::ModelNotFound(_) => (
                StatusCode::NOT_FOUND,
                "invalid_request_error",
                "model_not_found",
                self.to_string(),
            ),
            ApiError::TokenValidation(_) | ApiError::Engine(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "server_error",
                "internal_error",
                "internal server error".to_string(),
            ),
        };

        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "Request failed");
        }

        let body = ErrorEnvelope {
            error: ErrorDetail { message, kind, code },
        };
        (status, Json(body)).into_response()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = self.default_response();
        response.extensions_mut().insert(Arc::new(self));
        response
    }
}

/// Builds a response for an error of a registered kind.
pub type ErrorResponder = fn(&ApiError) -> Response;

/// Mapping table from error kind to response construction.
#[derive(Clone, Default)]
pub struct ErrorHandlers {
    responders: HashMap<ErrorKind, ErrorResponder>,
}

impl ErrorHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the responder for `kind`.
    pub fn register(mut self, kind: ErrorKind, responder: ErrorResponder) -> Self {
        self.responders.insert(kind, responder);
        self
    }

    pub fn get(&self, kind: ErrorKind) -> Option<ErrorResponder> {
        self.responders.get(&kind).copied()
    }

    /// Render `err` with its registered responder, if any.
    pub fn render(&self, err: &ApiError) -> Option<Response> {
        self.get(err.kind()).map(|responder| responder(err))
    }
}

/// Responder that lets a token validation error shape its own response.
pub fn token_validation_response(err: &ApiError) -> Response {
    match err {
        ApiError::TokenValidation(e) => e.to_response(),
        other => other.default_response(),
    }
}

/// Middleware applying the [`ErrorHandlers`] table to handler errors.
pub async fn map_errors(
    State(handlers): State<Arc<ErrorHandlers>>,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;
    let Some(err) = response.extensions().get::<Arc<ApiError>>().cloned() else {
        return response;
    };

    match handlers.render(&err) {
        Some(mapped) => {
            tracing::debug!(kind = ?err.kind(), error = %err, "Mapped handler error");
            mapped
        }
        None => response,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, middleware, routing::get, Router};
    use tower::ServiceExt;

    fn too_long() -> TokenValidationError {
        TokenValidationError::PromptTooLong {
            prompt_tokens: 10,
            context_length: 8,
        }
    }

    fn app(handlers: ErrorHandlers) -> Router {
        Router::new()
            .route(
                "/reject",
                get(|| async { Err::<(), _>(ApiError::from(too_long())) }),
            )
            .route(
                "/missing",
                get(|| async { Err::<(), _>(ApiError::ModelNotFound("gpt-x".into())) }),
            )
            .layer(middleware::from_fn_with_state(Arc::new(handlers), map_errors))
    }

    async fn call(app: Router, uri: &str) -> (StatusCode, axum::body::Bytes) {
        let response = app
            .oneshot(axum::http::Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body)
    }

    #[tokio::test]
    async fn registered_kind_uses_its_responder() {
        let handlers =
            ErrorHandlers::new().register(ErrorKind::TokenValidation, token_validation_response);
        let (status, body) = call(app(handlers), "/reject").await;

        let expected = too_long().to_response();
        assert_eq!(status, expected.status());
        let expected_body = axum::body::to_bytes(expected.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body, expected_body);
    }

    #[tokio::test]
    async fn unregistered_kind_falls_through_to_default() {
        let (status, body) = call(app(ErrorHandlers::new()), "/reject").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"]["code"], "internal_error");
    }

    #[tokio::test]
    async fn other_kinds_keep_default_rendering() {
        let handlers =
            ErrorHandlers::new().register(ErrorKind::TokenValidation, token_validation_response);
        let (status, body) = call(app(handlers), "/missing").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"]["code"], "model_not_found");
        assert_eq!(body["error"]["message"], "the model `gpt-x` does not exist");
    }

    #[test]
    fn engine_errors_classify() {
        assert_eq!(
            ApiError::from(EngineError::TokenValidation(too_long())).kind(),
            ErrorKind::TokenValidation
        );
        assert_eq!(ApiError::from(EngineError::NotRunning).kind(), ErrorKind::EngineUnavailable);
        assert_eq!(
            ApiError::from(EngineError::Generation("oom".into())).kind(),
            ErrorKind::Engine
        );
    }
}
