//! # Fan-Out Dispatcher
//!
//! Runs one inference task per registered model, concurrently, and collects
//! exactly one [`ModelResult`] per model in registry order. A task's failure
//! (error, panic or timeout) is captured in its own result and never touches
//! its siblings or the request as a whole.

use std::sync::Arc;
use std::time::Duration;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::registry::{ModelEntry, ModelRegistry};
use crate::summarizer::{GenerationParams, SummarizeError};

/// Outcome of one model's inference for one request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelResult {
    pub model_name: String,
    pub summary: String,
    #[serde(default)]
    pub error: Option<String>,
}

impl ModelResult {
    pub fn success(model_name: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            summary: summary.into(),
            error: None,
        }
    }

    /// A failed result always carries non-empty error text.
    pub fn failure(model_name: impl Into<String>, error: impl ToString) -> Self {
        let mut message = error.to_string();
        if message.trim().is_empty() {
            message = "unknown error".to_string();
        }
        Self {
            model_name: model_name.into(),
            summary: String::new(),
            error: Some(message),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Fans a passage out to every model in the registry
pub struct Dispatcher {
    registry: Arc<ModelRegistry>,
    params: GenerationParams,
    timeout: Option<Duration>,
}

impl Dispatcher {
    pub fn new(registry: Arc<ModelRegistry>, params: GenerationParams) -> Self {
        Self {
            registry,
            params,
            timeout: None,
        }
    }

    /// Bounds how long each model may take. A model over the limit is
    /// reported as failed; the others are unaffected.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Summarizes `text` with every registered model. Always returns one
    /// result per registry entry, in registry order.
    pub async fn summarize(&self, text: &str) -> Vec<ModelResult> {
        let text: Arc<str> = Arc::from(text);
        let tasks = self
            .registry
            .entries()
            .iter()
            .map(|entry| self.run_model(entry, Arc::clone(&text)));

        join_all(tasks).await
    }

    async fn run_model(&self, entry: &ModelEntry, text: Arc<str>) -> ModelResult {
        let summarizer = Arc::clone(&entry.summarizer);
        let params = self.params.clone();
        let handle = tokio::task::spawn_blocking(move || summarizer.summarize(&text, &params));

        let joined = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, handle).await {
                Ok(joined) => joined,
                Err(_) => {
                    // The blocking call cannot be interrupted; its output is discarded.
                    let e = SummarizeError::TimedOut {
                        model: entry.name.clone(),
                        after: limit,
                    };
                    error!(model = %entry.name, "Error with {}: {}", entry.name, e);
                    return ModelResult::failure(&entry.name, e);
                }
            },
            None => handle.await,
        };

        let outcome = joined.unwrap_or_else(|join_error| {
            Err(SummarizeError::TaskFailed(if join_error.is_panic() {
                "inference panicked".to_string()
            } else {
                join_error.to_string()
            }))
        });

        match outcome {
            Ok(summary) => {
                debug!(model = %entry.name, chars = summary.len(), "Summary generated");
                ModelResult::success(&entry.name, summary)
            }
            Err(e) => {
                error!(model = %entry.name, "Error with {}: {}", entry.name, e);
                ModelResult::failure(&entry.name, e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_never_has_empty_error() {
        let result = ModelResult::failure("T5", SummarizeError::Inference(String::new()));
        assert_eq!(result.error.as_deref(), Some("unknown error"));
        assert!(result.summary.is_empty());
        assert!(!result.is_success());
    }

    #[test]
    fn test_serialized_shape() {
        let ok = serde_json::to_value(ModelResult::success("BART", "short")).unwrap();
        assert_eq!(ok, serde_json::json!({"model_name": "BART", "summary": "short", "error": null}));

        let failed = serde_json::to_value(ModelResult::failure("T5", "boom")).unwrap();
        assert_eq!(failed, serde_json::json!({"model_name": "T5", "summary": "", "error": "boom"}));
    }

    #[tokio::test]
    async fn test_empty_registry_yields_no_results() {
        let dispatcher = Dispatcher::new(Arc::new(ModelRegistry::default()), GenerationParams::default());
        assert!(dispatcher.summarize("a passage long enough").await.is_empty());
    }
}
