//! Reference engine that echoes the prompt back.
//!
//! Tokens are whitespace separated words. Useful for smoke testing a deployment
//! and for exercising the HTTP surface without model weights.

use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::future::{BoxFuture, FutureExt};

use crate::config::EngineConfig;
use crate::engine::connector::{
    EngineConnector, EngineError, FinishReason, GenerationOutput, GenerationRequest,
};
use crate::errors::TokenValidationError;

/// Echo engine bounded by a fixed context window.
#[derive(Debug)]
pub struct EchoConnector {
    model_id: String,
    max_context_length: usize,
    running: AtomicBool,
}

impl EchoConnector {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            model_id: config.model_id.clone(),
            max_context_length: config.max_context_length,
            running: AtomicBool::new(false),
        }
    }

    /// Whether `start` has completed and `stop` has not.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn echo(&self, request: &GenerationRequest) -> Result<GenerationOutput, EngineError> {
        if !self.is_running() {
            return Err(EngineError::NotRunning);
        }

        let words: Vec<&str> = request.prompt.split_whitespace().collect();
        TokenValidationError::check(words.len(), request.max_tokens, self.max_context_length)?;

        let completion_tokens = words.len().min(request.max_tokens);
        let finish_reason = if completion_tokens < words.len() {
            FinishReason::Length
        } else {
            FinishReason::Stop
        };

        Ok(GenerationOutput {
            text: words[..completion_tokens].join(" "),
            prompt_tokens: words.len(),
            completion_tokens,
            finish_reason,
        })
    }
}

impl EngineConnector for EchoConnector {
    fn start(&self) -> BoxFuture<'_, Result<(), EngineError>> {
        async move {
            if self.running.swap(true, Ordering::SeqCst) {
                return Err(EngineError::Start("engine already running".into()));
            }
            tracing::info!(
                model = %self.model_id,
                max_context_length = self.max_context_length,
                "Echo engine started"
            );
            Ok(())
        }
        .boxed()
    }

    fn stop(&self) -> BoxFuture<'_, Result<(), EngineError>> {
        async move {
            if !self.running.swap(false, Ordering::SeqCst) {
                return Err(EngineError::Stop("engine was not running".into()));
            }
            tracing::info!(model = %self.model_id, "Echo engine stopped");
            Ok(())
        }
        .boxed()
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn generate(
        &self,
        request: GenerationRequest,
    ) -> BoxFuture<'_, Result<GenerationOutput, EngineError>> {
        async move { self.echo(&request) }.boxed()
    }
}
