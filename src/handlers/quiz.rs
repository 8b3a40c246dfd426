// src/handlers/quiz.rs

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    response::IntoResponse,
};

use crate::{
    error::AppError,
    models::quiz::{GenerateQuizRequest, QuizResponse},
    state::AppState,
};

pub const NOT_CONFIGURED_MESSAGE: &str = "OpenAI API key is not configured";

/// Generates a multiple-choice quiz with the configured LLM.
///
/// * Fails with 500 before reading the body if no API key is configured.
/// * Validates the payload (400 on missing or invalid fields, no upstream call).
/// * Runs the batched orchestrator and returns `{ "questions": [...] }`.
pub async fn generate_quiz(
    State(state): State<AppState>,
    payload: Result<Json<GenerateQuizRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let generator = state
        .generator
        .as_ref()
        .ok_or_else(|| AppError::NotConfigured(NOT_CONFIGURED_MESSAGE.to_string()))?;

    let Json(payload) = payload.map_err(|rejection| {
        tracing::debug!("Rejected quiz request body: {}", rejection);
        AppError::BadRequest(rejection.body_text())
    })?;

    let request = payload.into_quiz_request()?;

    let questions = generator.generate(&request).await.map_err(|e| {
        tracing::error!("Error generating quiz: {}", e);
        AppError::from(e)
    })?;

    tracing::info!(
        "Generated {} questions about {:?}",
        questions.len(),
        request.topic
    );

    Ok(Json(QuizResponse { questions }))
}
