use axum::{extract::State, http::HeaderMap, Json};
use service_core::error::AppError;
use service_core::observability::extract_request_id;
use validator::Validate;

use crate::models::{AskRequest, AskResponse};
use crate::startup::AppState;

/// Answer one tutoring question. Served on both `/ask` and `/chat`.
#[tracing::instrument(skip(state, headers, request), fields(request_id))]
pub async fn ask(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>, AppError> {
    if let Some(request_id) = extract_request_id(&headers) {
        tracing::Span::current().record("request_id", request_id.as_str());
    }

    request.validate()?;

    let response = state.tutor.ask(&request).await?;

    tracing::info!(
        mode = response.mode.as_str(),
        phase = response.phase.as_str(),
        answer_len = response.answer.len(),
        "Question answered"
    );

    Ok(Json(response))
}
