use std::path::{Path, PathBuf};
use std::sync::Arc;
use llama_cpp::{LlamaModel, LlamaParams, SessionParams};
use llama_cpp::standard_sampler::StandardSampler;
use tracing::{debug, info};

use crate::config::{InferenceConfig, ModelSpec};
use super::{
    collect_generated, fit_tokens, input_budget, render_prompt, GenerationParams, ModelLoader,
    SummarizeError, Summarizer,
};

/// Summarization model backed by llama.cpp.
///
/// Every call opens a fresh session on the shared model, so calls never see
/// each other's context.
pub struct LlamaSummarizer {
    name: String,
    model: Arc<LlamaModel>,
    prompt: Option<String>,
    context_size: usize,
}

impl LlamaSummarizer {
    /// Loads the weights named by `spec` from `models_dir`.
    pub fn load(spec: &ModelSpec, models_dir: &Path, inference: &InferenceConfig) -> Result<Self, SummarizeError> {
        let model_path = models_dir.join(&spec.file);
        if !model_path.exists() {
            return Err(SummarizeError::Load {
                model: spec.name.clone(),
                reason: format!("model file not found at {}", model_path.display()),
            });
        }

        let n_gpu_layers = inference.n_gpu_layers;
        let use_mmap = inference.use_mmap;
        let use_mlock = inference.use_mlock;
        let llama_params = LlamaParams { n_gpu_layers, use_mmap, use_mlock, ..Default::default() };
        info!(model = %spec.name, n_gpu_layers, use_mmap, use_mlock, "Loading model via llama_cpp: {}", model_path.display());

        let model = LlamaModel::load_from_file(&model_path, llama_params)
            .map_err(|e| SummarizeError::Load {
                model: spec.name.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            name: spec.name.clone(),
            model: Arc::new(model),
            prompt: spec.prompt.clone(),
            context_size: inference.context_size,
        })
    }

    /// Cuts the passage down so prompt and generation fit in the context window.
    fn fit_passage(&self, text: &str, params: &GenerationParams) -> Result<String, SummarizeError> {
        let overhead = self.model
            .tokenize_bytes(render_prompt(self.prompt.as_deref(), ""), true, false)
            .map_err(tokenize_error)?
            .len();
        let budget = input_budget(self.context_size, params.max_length, overhead)?;

        let tokens = self.model.tokenize_bytes(text, false, false).map_err(tokenize_error)?;
        let total = tokens.len();
        if total <= budget {
            return Ok(text.to_string());
        }

        let kept = fit_tokens(tokens, budget, params.truncation)
            .map_err(|e| SummarizeError::Inference(format!("{}: {}", self.name, e)))?;
        debug!(model = %self.name, from = total, to = budget, "Truncating input");
        Ok(kept
            .into_iter()
            .map(|token| self.model.token_to_piece(token))
            .collect())
    }
}

impl Summarizer for LlamaSummarizer {
    fn summarize(&self, text: &str, params: &GenerationParams) -> Result<String, SummarizeError> {
        let passage = self.fit_passage(text, params)?;
        let prompt = render_prompt(self.prompt.as_deref(), &passage);

        let n_ctx = u32::try_from(self.context_size).map_err(|_| {
            SummarizeError::Inference(format!("context_size {} does not fit llama.cpp's u32 limit", self.context_size))
        })?;
        let session_params = SessionParams {
            n_ctx,
            n_batch: 512,
            ..Default::default()
        };
        let mut session = self.model.create_session(session_params)
            .map_err(|e| SummarizeError::Inference(format!("Failed to create LlamaSession: {}", e)))?;

        session.advance_context(&prompt)
            .map_err(|e| SummarizeError::Inference(format!("Failed to advance context: {}", e)))?;

        let sampler = if params.do_sample {
            StandardSampler::default()
        } else {
            StandardSampler::new_greedy()
        };
        let completions = session.start_completing_with(sampler, params.max_length)
            .map_err(|e| SummarizeError::Inference(format!("Failed to start completion: {}", e)))?;

        let pieces = completions.map(|token| self.model.token_to_piece(token));
        let (summary, generated) = collect_generated(pieces, params.max_length);

        if generated < params.min_length {
            debug!(model = %self.name, generated, min_length = params.min_length, "Generation ended before min_length");
        }

        Ok(summary.trim().to_string())
    }
}

fn tokenize_error(e: impl std::fmt::Display) -> SummarizeError {
    SummarizeError::Inference(format!("Failed to tokenize input: {}", e))
}

/// Loads every configured model from a directory of weight files
pub struct LlamaLoader {
    models_dir: PathBuf,
    inference: InferenceConfig,
}

impl LlamaLoader {
    pub fn new(models_dir: PathBuf, inference: InferenceConfig) -> Self {
        Self { models_dir, inference }
    }
}

impl ModelLoader for LlamaLoader {
    fn load(&self, spec: &ModelSpec) -> Result<Arc<dyn Summarizer>, SummarizeError> {
        let summarizer = LlamaSummarizer::load(spec, &self.models_dir, &self.inference)?;
        Ok(Arc::new(summarizer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inference() -> InferenceConfig {
        InferenceConfig {
            max_length: 150,
            min_length: 50,
            context_size: 2048,
            n_gpu_layers: 0,
            use_mmap: true,
            use_mlock: false,
            timeout_secs: None,
        }
    }

    #[test]
    fn test_missing_weights_is_a_load_error() {
        let spec = ModelSpec {
            name: "BART".to_string(),
            file: PathBuf::from("no-such-model.gguf"),
            prompt: None,
        };
        let loader = LlamaLoader::new(std::env::temp_dir(), inference());
        match loader.load(&spec) {
            Err(SummarizeError::Load { model, reason }) => {
                assert_eq!(model, "BART");
                assert!(reason.contains("not found"));
            }
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("expected load failure"),
        }
    }
}
