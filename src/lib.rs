//! # multisum
//!
//! An HTTP service that summarizes a passage with several models at once.
//! Every registered model runs concurrently on each request and reports
//! either its summary or its own error; one model failing never fails the
//! request.

pub mod client;
pub mod config;
pub mod dispatch;
pub mod logging;
pub mod registry;
pub mod server;
pub mod summarizer;

pub use config::Settings;
pub use dispatch::{Dispatcher, ModelResult};
pub use registry::{ModelEntry, ModelRegistry};
pub use summarizer::{GenerationParams, ModelLoader, SummarizeError, Summarizer};
