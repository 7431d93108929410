use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use std::sync::Arc;
use tracing::{info, Instrument};
use uuid::Uuid;

use super::error::ApiError;
use super::server::AppState;
use super::types::{ReadinessResponse, SummarizeRequest, SummarizeResponse};

/// Shortest accepted passage, counted in characters after trimming
pub const MIN_TEXT_CHARS: usize = 10;

/// Checks that the request carries a passage worth summarizing.
pub fn validate_text(text: Option<&str>) -> Result<&str, ApiError> {
    match text {
        Some(text) if text.trim().chars().count() >= MIN_TEXT_CHARS => Ok(text),
        _ => Err(ApiError::BadRequest(format!(
            "Text must be at least {} characters long",
            MIN_TEXT_CHARS
        ))),
    }
}

/// Reports readiness and the models currently registered
pub async fn readiness(State(state): State<Arc<AppState>>) -> Json<ReadinessResponse> {
    let models = state.dispatcher.registry().names();
    info!("Readiness endpoint called, {} model(s) registered", models.len());
    Json(ReadinessResponse {
        message: "Text Summarizer API Ready".to_string(),
        models,
    })
}

/// Summarizes the passage with every registered model
pub async fn summarize(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SummarizeRequest>, JsonRejection>,
) -> Result<Json<SummarizeResponse>, ApiError> {
    let Json(request) = payload?;
    let text = validate_text(request.text.as_deref())?;

    let span = tracing::info_span!(
        "summarize",
        request_id = %Uuid::new_v4(),
        chars = text.chars().count()
    );

    async move {
        info!("Summarize endpoint called");
        let summaries = state.dispatcher.summarize(text).await;
        let failed = summaries.iter().filter(|s| !s.is_success()).count();
        info!("Returning {} summaries ({} failed)", summaries.len(), failed);
        Ok(Json(SummarizeResponse { summaries }))
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_missing_text() {
        assert!(validate_text(None).is_err());
    }

    #[test]
    fn test_rejects_short_trimmed_text() {
        let err = validate_text(Some("   hi   ")).unwrap_err();
        assert_eq!(err.to_string(), "Text must be at least 10 characters long");
    }

    #[test]
    fn test_accepts_exactly_ten_chars() {
        assert_eq!(validate_text(Some("1234567890")).unwrap(), "1234567890");
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        // 9 characters, 18 bytes
        assert!(validate_text(Some("ééééééééé")).is_err());
        assert!(validate_text(Some("éééééééééé")).is_ok());
    }

    #[test]
    fn test_keeps_surrounding_whitespace() {
        assert_eq!(validate_text(Some("  1234567890  ")).unwrap(), "  1234567890  ");
    }
}
