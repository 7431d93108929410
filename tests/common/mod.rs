#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::time::Duration;

use multisum::{GenerationParams, ModelEntry, ModelRegistry, SummarizeError, Summarizer};

/// What a fake model does when asked for a summary
pub enum Behavior {
    /// Returns "<name>: <first word of the text>"
    Echo,
    Fail(String),
    Panic,
    Sleep(Duration),
    /// Waits until every model sharing the barrier has been called
    Rendezvous(Arc<Barrier>),
}

pub struct FakeModel {
    name: String,
    behavior: Behavior,
    calls: Arc<AtomicUsize>,
}

impl FakeModel {
    pub fn new(name: &str, behavior: Behavior) -> Self {
        Self {
            name: name.to_string(),
            behavior,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    fn echo(&self, text: &str) -> String {
        format!("{}: {}", self.name, text.split_whitespace().next().unwrap_or(""))
    }
}

impl Summarizer for FakeModel {
    fn summarize(&self, text: &str, params: &GenerationParams) -> Result<String, SummarizeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert!(!params.do_sample);
        match &self.behavior {
            Behavior::Echo => Ok(self.echo(text)),
            Behavior::Fail(message) => Err(SummarizeError::Inference(message.clone())),
            Behavior::Panic => panic!("{} blew up", self.name),
            Behavior::Sleep(duration) => {
                std::thread::sleep(*duration);
                Ok(self.echo(text))
            }
            Behavior::Rendezvous(barrier) => {
                barrier.wait();
                Ok(self.echo(text))
            }
        }
    }
}

pub fn entry(model: FakeModel) -> ModelEntry {
    ModelEntry {
        name: model.name.clone(),
        summarizer: Arc::new(model),
    }
}

pub fn registry(models: Vec<FakeModel>) -> Arc<ModelRegistry> {
    Arc::new(ModelRegistry::new(models.into_iter().map(entry).collect()))
}

pub fn total_calls(counters: &[Arc<AtomicUsize>]) -> usize {
    counters.iter().map(|c| c.load(Ordering::SeqCst)).sum()
}
