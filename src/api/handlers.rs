use std::time::{SystemTime, UNIX_EPOCH};

use axum::{extract::State, Json};
use uuid::Uuid;

use crate::api::protocol::{
    CompletionChoice, CompletionRequest, CompletionResponse, HealthStatus, ModelCard, ModelList,
    Usage, DEFAULT_MAX_TOKENS,
};
use crate::engine::GenerationRequest;
use crate::http::{ApiError, AppContext};

pub async fn health(State(context): State<AppContext>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        phase: context.current_phase(),
        model: context.connector().map(|c| c.model_id().to_string()),
    })
}

pub async fn list_models(State(context): State<AppContext>) -> Result<Json<ModelList>, ApiError> {
    let connector = context.connector().ok_or(ApiError::EngineUnavailable)?;

    Ok(Json(ModelList {
        object: "list".to_string(),
        data: vec![ModelCard {
            id: connector.model_id().to_string(),
            object: "model".to_string(),
            owned_by: "mlc-serve".to_string(),
        }],
    }))
}

pub async fn create_completion(
    State(context): State<AppContext>,
    Json(request): Json<CompletionRequest>,
) -> Result<Json<CompletionResponse>, ApiError> {
    let connector = context.connector().ok_or(ApiError::EngineUnavailable)?;
    if request.model != connector.model_id() {
        return Err(ApiError::ModelNotFound(request.model));
    }

    let output = connector
        .generate(GenerationRequest {
            prompt: request.prompt,
            max_tokens: request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        })
        .await?;

    tracing::debug!(
        model = %request.model,
        prompt_tokens = output.prompt_tokens,
        completion_tokens = output.completion_tokens,
        "Completion generated"
    );

    let created = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();

    Ok(Json(CompletionResponse {
        id: format!("cmpl-{}", Uuid::new_v4().simple()),
        object: "text_completion".to_string(),
        created,
        model: request.model,
        choices: vec![CompletionChoice {
            index: 0,
            text: output.text,
            finish_reason: output.finish_reason,
        }],
        usage: Usage {
            prompt_tokens: output.prompt_tokens,
            completion_tokens: output.completion_tokens,
            total_tokens: output.prompt_tokens + output.completion_tokens,
        },
    }))
}
