use serde::{Deserialize, Serialize};
use crate::dispatch::ModelResult;

/// Request body for `POST /api/summarize`
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct SummarizeRequest {
    #[serde(default)]
    pub text: Option<String>,
}

/// Response body for `POST /api/summarize`
#[derive(Debug, Serialize, Deserialize)]
pub struct SummarizeResponse {
    pub summaries: Vec<ModelResult>,
}

/// Response body for `GET /api/`
#[derive(Debug, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub message: String,
    pub models: Vec<String>,
}

/// Body returned with client errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}
