//! The contract between the HTTP front-end and an inference engine.

use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::errors::TokenValidationError;

/// Errors reported by an engine connector.
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// The engine could not be brought up.
    #[error("engine failed to start: {0}")]
    Start(String),

    /// The engine did not release its resources cleanly.
    #[error("engine failed to stop: {0}")]
    Stop(String),

    /// A generation call arrived while the engine was not running.
    #[error("engine is not running")]
    NotRunning,

    /// The request does not fit the model's context window.
    #[error(transparent)]
    TokenValidation(#[from] TokenValidationError),

    /// Any other generation failure.
    #[error("generation failed: {0}")]
    Generation(String),
}

/// A single text generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    /// Upper bound on completion tokens.
    pub max_tokens: usize,
}

/// Why a generation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// The engine produced a natural end of sequence.
    Stop,
    /// `max_tokens` was reached.
    Length,
}

/// The result of a generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationOutput {
    pub text: String,
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub finish_reason: FinishReason,
}

/// Lifecycle and generation surface of an engine.
///
/// `start` and `stop` may suspend and may fail. The server calls `start` once
/// before accepting traffic and `stop` once after traffic has drained.
/// Implementations are shared between request handlers, so every method takes
/// `&self`.
pub trait EngineConnector: Send + Sync + 'static {
    /// Bring the engine up.
    fn start(&self) -> BoxFuture<'_, Result<(), EngineError>>;

    /// Release the engine's resources.
    fn stop(&self) -> BoxFuture<'_, Result<(), EngineError>>;

    /// Identifier of the model this engine serves.
    fn model_id(&self) -> &str;

    /// Run a single generation request to completion.
    fn generate(
        &self,
        request: GenerationRequest,
    ) -> BoxFuture<'_, Result<GenerationOutput, EngineError>>;
}
