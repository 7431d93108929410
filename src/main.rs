use std::path::{Path, PathBuf};
use std::sync::Arc;
use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use config::ConfigError;
use tracing::info;

use multisum::config::Settings;
use multisum::dispatch::Dispatcher;
use multisum::registry::ModelRegistry;
use multisum::server::ApiServer;
use multisum::summarizer::{GenerationParams, LlamaLoader};
use multisum::{client, logging};

/// Multi-model text summarization service
#[derive(Parser)]
#[command(name = "multisum", version, about)]
struct Cli {
    /// Directory holding default.toml and an optional local.toml [default: ./config]
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Load the models and serve the HTTP API (default)
    Serve,
    /// Send text to a running service and print each model's summary
    Summarize {
        /// Text to summarize; read from --file or stdin when omitted
        text: Option<String>,
        /// Read the text from a file
        #[arg(long, short)]
        file: Option<PathBuf>,
        /// Base URL of the service
        #[arg(long)]
        url: Option<String>,
    },
    /// List the models a running service has loaded
    Models {
        /// Base URL of the service
        #[arg(long)]
        url: Option<String>,
    },
}

fn load_settings(config_dir: Option<&Path>) -> Result<Settings, ConfigError> {
    match config_dir {
        Some(dir) => Settings::from_dir(dir),
        None => Settings::new(),
    }
}

/// Client commands only need settings for the default port; a missing
/// config directory is not an error when `--url` is given or 8000 will do.
fn client_url(url: Option<String>, config_dir: Option<&Path>) -> String {
    let settings = match url {
        Some(_) => None,
        None => load_settings(config_dir).ok(),
    };
    client::resolve_base_url(url, settings.as_ref())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config_dir = cli.config_dir.as_deref();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let settings = load_settings(config_dir).with_context(|| {
                format!(
                    "Failed to load settings from {}",
                    config_dir.unwrap_or(Path::new("config")).display()
                )
            })?;
            serve(settings).await
        }
        Command::Summarize { text, file, url } => {
            let base_url = client_url(url, config_dir);
            client::run_summarize(&base_url, text, file.as_deref()).await?;
            Ok(())
        }
        Command::Models { url } => {
            let base_url = client_url(url, config_dir);
            client::run_models(&base_url).await?;
            Ok(())
        }
    }
}

async fn serve(settings: Settings) -> anyhow::Result<()> {
    // Keep the guard alive so buffered log lines are flushed on exit
    let _guard = logging::init(&settings.logging)
        .map_err(|e| anyhow!("Failed to initialise logging: {}", e))?;

    info!("multisum starting up...");
    info!("Models directory: {}", settings.models.directory.display());

    let loader = LlamaLoader::new(settings.models.directory.clone(), settings.inference.clone());
    let specs = settings.models.entries.clone();
    let registry = tokio::task::spawn_blocking(move || ModelRegistry::load(&specs, &loader))
        .await
        .context("Model loading task failed")?;

    let dispatcher = Dispatcher::new(Arc::new(registry), GenerationParams::from(&settings.inference))
        .with_timeout(settings.timeout());

    let server = ApiServer::new(dispatcher, settings.server.host.clone(), settings.server.port);
    server
        .start()
        .await
        .map_err(|e| anyhow!("Server error: {}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_url_ignores_missing_config_dir() {
        let missing = Path::new("/definitely/not/a/config/dir");
        assert_eq!(
            client_url(Some("http://127.0.0.1:1".to_string()), Some(missing)),
            "http://127.0.0.1:1"
        );
        assert_eq!(client_url(None, Some(missing)), "http://127.0.0.1:8000");
    }
}
