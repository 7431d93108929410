//! Command-line client for a running service.

mod display;

use std::path::Path;
use std::time::Duration;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::{Client, StatusCode};
use thiserror::Error;

use crate::config::Settings;
use crate::server::types::{ErrorResponse, ReadinessResponse, SummarizeRequest, SummarizeResponse};
use crate::server::validate_text;

pub use display::{display_readiness, display_summaries, render_summaries, word_count};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{0}")]
    Rejected(String),

    #[error("Failed to send HTTP request: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to read input: {0}")]
    Input(#[from] std::io::Error),

    #[error("Server returned {status}: {body}")]
    Unexpected { status: StatusCode, body: String },
}

/// Port assumed when no settings can be read
pub const DEFAULT_PORT: u16 = 8000;

/// Picks the service URL: an explicit `--url`, else the local port from the
/// settings if they loaded, else the default port.
pub fn resolve_base_url(url: Option<String>, settings: Option<&Settings>) -> String {
    url.unwrap_or_else(|| {
        let port = settings.map_or(DEFAULT_PORT, |s| s.server.port);
        format!("http://127.0.0.1:{}", port)
    })
}

/// Reads the passage from the argument, a file, or stdin, in that order.
pub fn read_text(text: Option<String>, file: Option<&Path>) -> Result<String, ClientError> {
    if let Some(text) = text {
        return Ok(text);
    }
    if let Some(path) = file {
        return Ok(std::fs::read_to_string(path)?);
    }
    Ok(std::io::read_to_string(std::io::stdin())?)
}

/// HTTP client for the summarization API
pub struct SummarizeClient {
    client: Client,
    base_url: String,
}

impl SummarizeClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub async fn readiness(&self) -> Result<ReadinessResponse, ClientError> {
        let response = self.client.get(format!("{}/api/", self.base_url)).send().await?;
        if !response.status().is_success() {
            return Err(unexpected(response).await);
        }
        Ok(response.json().await?)
    }

    /// Submits the passage. Text the server would reject is refused locally.
    pub async fn summarize(&self, text: &str) -> Result<SummarizeResponse, ClientError> {
        validate_text(Some(text)).map_err(|e| ClientError::Rejected(e.to_string()))?;

        let request = SummarizeRequest { text: Some(text.to_string()) };
        let response = self.client
            .post(format!("{}/api/summarize", self.base_url))
            .json(&request)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(response.json().await?),
            StatusCode::BAD_REQUEST => {
                let body: ErrorResponse = response.json().await?;
                Err(ClientError::Rejected(body.detail))
            }
            _ => Err(unexpected(response).await),
        }
    }
}

async fn unexpected(response: reqwest::Response) -> ClientError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    ClientError::Unexpected { status, body }
}

/// `multisum summarize`
pub async fn run_summarize(base_url: &str, text: Option<String>, file: Option<&Path>) -> Result<(), ClientError> {
    let text = read_text(text, file)?;
    let client = SummarizeClient::new(base_url);

    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner} {wide_msg}") {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_message("Summarizing...");

    let result = client.summarize(&text).await;
    pb.finish_and_clear();

    let response = result?;
    display_summaries(&response.summaries);
    Ok(())
}

/// `multisum models`
pub async fn run_models(base_url: &str) -> Result<(), ClientError> {
    let readiness = SummarizeClient::new(base_url).readiness().await?;
    display_readiness(&readiness);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SETTINGS: &str = r#"
        [server]
        host = "0.0.0.0"
        port = 9100

        [models]
        directory = "models"

        [inference]
        max_length = 150
        min_length = 50
        context_size = 2048

        [logging]
        level = "info"
    "#;

    #[test]
    fn test_explicit_url_needs_no_settings() {
        let url = resolve_base_url(Some("http://10.0.0.5:8000".to_string()), None);
        assert_eq!(url, "http://10.0.0.5:8000");
    }

    #[test]
    fn test_url_from_settings_port() {
        let settings = Settings::from_toml_str(SETTINGS).unwrap();
        assert_eq!(resolve_base_url(None, Some(&settings)), "http://127.0.0.1:9100");
        assert_eq!(
            resolve_base_url(Some("http://example.com".to_string()), Some(&settings)),
            "http://example.com"
        );
    }

    #[test]
    fn test_url_falls_back_to_default_port() {
        assert_eq!(resolve_base_url(None, None), "http://127.0.0.1:8000");
    }

    #[test]
    fn test_argument_wins_over_file() {
        let text = read_text(Some("inline text".to_string()), Some(Path::new("/no/such/file"))).unwrap();
        assert_eq!(text, "inline text");
    }

    #[test]
    fn test_missing_file_is_input_error() {
        let err = read_text(None, Some(Path::new("/no/such/file"))).unwrap_err();
        assert!(matches!(err, ClientError::Input(_)));
    }

    #[tokio::test]
    async fn test_short_text_is_refused_before_sending() {
        // Nothing listens on port 9; a request attempt would surface as Http.
        let client = SummarizeClient::new("http://127.0.0.1:9/");
        let err = client.summarize("   hi   ").await.unwrap_err();
        assert!(matches!(err, ClientError::Rejected(_)));
    }
}
