//! # Summarizer Module
//!
//! The inference callable behind every registry entry. A [`Summarizer`] maps a
//! passage to a summary under a set of [`GenerationParams`]; how it does so
//! (tokenization, decoding, weights) is the backend's business.
//!
//! Loading is abstracted by [`ModelLoader`] so the registry can be populated
//! from real model files at startup or from in-memory fakes in tests.

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::{InferenceConfig, ModelSpec, TEXT_PLACEHOLDER};

pub mod llama;

pub use llama::{LlamaLoader, LlamaSummarizer};

/// Prompt used when a model entry does not configure its own template
pub const DEFAULT_PROMPT: &str = "Summarize the following text.\n\n{text}\n\nSummary:";

/// Errors raised while loading or running a summarization model
#[derive(Debug, Error)]
pub enum SummarizeError {
    #[error("Failed to load model {model}: {reason}")]
    Load { model: String, reason: String },

    #[error("{0}")]
    Inference(String),

    #[error("Model {model} did not finish within {after:?}")]
    TimedOut { model: String, after: Duration },

    #[error("Inference task failed: {0}")]
    TaskFailed(String),
}

/// Generation constraints applied to every inference call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationParams {
    /// Upper bound on generated tokens
    pub max_length: usize,
    /// Requested lower bound on generated tokens. The llama.cpp backend cannot
    /// suppress end-of-sequence, so a shorter generation is accepted and only
    /// logged.
    pub min_length: usize,
    /// Sample from the distribution instead of decoding greedily
    pub do_sample: bool,
    /// Truncate the passage when it does not fit the model's input window
    pub truncation: bool,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_length: 150,
            min_length: 50,
            do_sample: false,
            truncation: true,
        }
    }
}

impl From<&InferenceConfig> for GenerationParams {
    fn from(config: &InferenceConfig) -> Self {
        Self {
            max_length: config.max_length,
            min_length: config.min_length,
            ..Self::default()
        }
    }
}

/// A loaded model that turns a passage into a summary.
///
/// Implementations block the calling thread for the duration of inference;
/// the dispatcher moves each call onto the blocking pool.
pub trait Summarizer: Send + Sync {
    fn summarize(&self, text: &str, params: &GenerationParams) -> Result<String, SummarizeError>;
}

impl<F> Summarizer for F
where
    F: Fn(&str, &GenerationParams) -> Result<String, SummarizeError> + Send + Sync,
{
    fn summarize(&self, text: &str, params: &GenerationParams) -> Result<String, SummarizeError> {
        self(text, params)
    }
}

/// Produces a [`Summarizer`] for a configured model.
pub trait ModelLoader {
    fn load(&self, spec: &ModelSpec) -> Result<Arc<dyn Summarizer>, SummarizeError>;
}

/// Tokens left for the passage once the prompt template and the generated
/// summary are reserved. Fails when nothing is left, since the model would
/// otherwise summarize an empty prompt.
pub fn input_budget(context_size: usize, max_length: usize, overhead: usize) -> Result<usize, SummarizeError> {
    match context_size.checked_sub(max_length.saturating_add(overhead)) {
        Some(budget) if budget > 0 => Ok(budget),
        _ => Err(SummarizeError::Inference(format!(
            "Context window of {} tokens leaves no room for input after a {} token prompt and {} generated tokens",
            context_size, overhead, max_length
        ))),
    }
}

/// Keeps at most `budget` input tokens. Without truncation an oversized input
/// is an error.
pub fn fit_tokens<T>(tokens: Vec<T>, budget: usize, truncation: bool) -> Result<Vec<T>, SummarizeError> {
    if tokens.len() <= budget {
        return Ok(tokens);
    }
    if !truncation {
        return Err(SummarizeError::Inference(format!(
            "Input is {} tokens but at most {} fit the context window",
            tokens.len(), budget
        )));
    }
    let mut tokens = tokens;
    tokens.truncate(budget);
    Ok(tokens)
}

/// Joins generated pieces, stopping after `max_length` of them. Returns the
/// text and how many pieces were used.
pub fn collect_generated<I>(pieces: I, max_length: usize) -> (String, usize)
where
    I: IntoIterator<Item = String>,
{
    let mut text = String::new();
    let mut generated = 0;
    for piece in pieces.into_iter().take(max_length) {
        text.push_str(&piece);
        generated += 1;
    }
    (text, generated)
}

/// Fills a prompt template with the passage
pub fn render_prompt(template: Option<&str>, text: &str) -> String {
    template.unwrap_or(DEFAULT_PROMPT).replace(TEXT_PLACEHOLDER, text)
}
