//! # Model Registry
//!
//! The startup-populated, read-only set of summarization models. Loading is
//! attempt-all: every configured model is tried, failures are logged, and the
//! registry keeps whatever loaded. Consumers must cope with a partial or empty
//! registry.

use std::fmt;
use std::sync::Arc;
use tracing::{error, info};

use crate::config::ModelSpec;
use crate::summarizer::{ModelLoader, Summarizer};

/// A loaded model and the identifier it is reported under
#[derive(Clone)]
pub struct ModelEntry {
    /// Identifier reported in responses
    pub name: String,
    /// Inference callable for this model
    pub summarizer: Arc<dyn Summarizer>,
}

impl fmt::Debug for ModelEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelEntry").field("name", &self.name).finish_non_exhaustive()
    }
}

/// Immutable, ordered collection of loaded models
#[derive(Debug, Default)]
pub struct ModelRegistry {
    entries: Vec<ModelEntry>,
}

impl ModelRegistry {
    /// Builds a registry from already-loaded entries, keeping their order.
    pub fn new(entries: Vec<ModelEntry>) -> Self {
        Self { entries }
    }

    /// Loads every configured model in order. A model that fails to load is
    /// logged and left out; this never fails as a whole.
    pub fn load<L: ModelLoader + ?Sized>(specs: &[ModelSpec], loader: &L) -> Self {
        info!("Loading {} summarization model(s)...", specs.len());

        let mut entries = Vec::with_capacity(specs.len());
        for spec in specs {
            match loader.load(spec) {
                Ok(summarizer) => {
                    info!(model = %spec.name, "Model loaded");
                    entries.push(ModelEntry {
                        name: spec.name.clone(),
                        summarizer,
                    });
                }
                Err(e) => {
                    error!(model = %spec.name, "Failed to load model: {}", e);
                }
            }
        }

        info!("Loaded {} of {} models", entries.len(), specs.len());
        Self { entries }
    }

    /// Entries in registry order
    pub fn entries(&self) -> &[ModelEntry] {
        &self.entries
    }

    /// Identifiers of the loaded models, in registry order
    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|entry| entry.name.clone()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&ModelEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Releases the registry at shutdown. Models free their resources on drop,
    /// so there is nothing to do beyond recording it.
    pub fn teardown(&self) {
        info!("Releasing {} model(s)", self.entries.len());
    }
}
