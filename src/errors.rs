//! Token budget validation errors.
//!
//! A [`TokenValidationError`] is raised by an engine when a request does not
//! fit the model's context window. It owns its wire representation: callers
//! render it with [`TokenValidationError::to_response`] and never reshape it.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// A request whose tokens do not fit the model's context window.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenValidationError {
    #[error("the prompt must contain at least one token")]
    EmptyPrompt,

    #[error(
        "this model's maximum context length is {context_length} tokens, \
         but the prompt has {prompt_tokens} tokens"
    )]
    PromptTooLong {
        prompt_tokens: usize,
        context_length: usize,
    },

    #[error(
        "this model's maximum context length is {context_length} tokens, but \
         {prompt_tokens} prompt tokens plus {max_tokens} requested completion tokens exceed it"
    )]
    MaxTokensTooLarge {
        prompt_tokens: usize,
        max_tokens: usize,
        context_length: usize,
    },
}

/// OpenAI-compatible error envelope.
#[derive(Debug, Serialize)]
struct ErrorEnvelope<'a> {
    error: ErrorDetail<'a>,
}

#[derive(Debug, Serialize)]
struct ErrorDetail<'a> {
    message: String,
    #[serde(rename = "type")]
    kind: &'a str,
    param: Option<&'a str>,
    code: &'a str,
}

impl TokenValidationError {
    /// Check a prompt/completion budget against a context window.
    pub fn check(
        prompt_tokens: usize,
        max_tokens: usize,
        context_length: usize,
    ) -> Result<(), Self> {
        if prompt_tokens == 0 {
            return Err(Self::EmptyPrompt);
        }
        if prompt_tokens > context_length {
            return Err(Self::PromptTooLong {
                prompt_tokens,
                context_length,
            });
        }
        if max_tokens > context_length - prompt_tokens {
            return Err(Self::MaxTokensTooLarge {
                prompt_tokens,
                max_tokens,
                context_length,
            });
        }
        Ok(())
    }

    /// HTTP status this error is reported with.
    pub fn status(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }

    /// Machine readable code placed in the response body.
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyPrompt => "empty_prompt",
            Self::PromptTooLong { .. } | Self::MaxTokensTooLarge { .. } => {
                "context_length_exceeded"
            }
        }
    }

    fn param(&self) -> Option<&'static str> {
        match self {
            Self::EmptyPrompt | Self::PromptTooLong { .. } => Some("prompt"),
            Self::MaxTokensTooLarge { .. } => Some("max_tokens"),
        }
    }

    /// Build the complete HTTP response for this error.
    pub fn to_response(&self) -> Response {
        let body = ErrorEnvelope {
            error: ErrorDetail {
                message: self.to_string(),
                kind: "invalid_request_error",
                param: self.param(),
                code: self.code(),
            },
        };
        (self.status(), Json(body)).into_response()
    }
}
