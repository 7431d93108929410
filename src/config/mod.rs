// Required external crates for configuration management and serialization
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use config::{Config, ConfigError, Environment, File, FileFormat};

/// Placeholder replaced by the passage inside a prompt template
pub const TEXT_PLACEHOLDER: &str = "{text}";

/// One summarization model to load at startup
#[derive(Debug, Deserialize, Clone)]
pub struct ModelSpec {
    /// Identifier reported in responses (e.g. "BART")
    pub name: String,
    /// Weights file, relative to the models directory
    pub file: PathBuf,
    /// Optional prompt template containing `{text}`
    #[serde(default)]
    pub prompt: Option<String>,
}

/// Configuration for model loading
#[derive(Debug, Deserialize, Clone)]
pub struct ModelConfig {
    /// Directory where model files are stored
    pub directory: PathBuf,
    /// Models in registry order
    #[serde(default)]
    pub entries: Vec<ModelSpec>,
}

/// Configuration for model inference parameters
#[derive(Debug, Deserialize, Clone)]
pub struct InferenceConfig {
    /// Maximum number of generated tokens per summary
    pub max_length: usize,
    /// Minimum number of generated tokens per summary
    pub min_length: usize,
    /// Size of the context window for inference
    pub context_size: usize,
    /// Layers offloaded to an accelerator
    #[serde(default)]
    pub n_gpu_layers: u32,
    #[serde(default = "default_true")]
    pub use_mmap: bool,
    #[serde(default)]
    pub use_mlock: bool,
    /// Per-model wait limit; unbounded when absent
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Configuration for the HTTP server
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,
    /// Port number to listen on
    pub port: u16,
}

/// Configuration for application logging
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Log level (debug, info, warn, error)
    pub level: String,
    /// Optional directory for daily-rolling log files
    #[serde(default)]
    pub file: Option<PathBuf>,
}

/// Main settings struct that contains all configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    /// Model-related settings
    pub models: ModelConfig,
    /// Inference-related settings
    pub inference: InferenceConfig,
    /// Server-related settings
    pub server: ServerConfig,
    /// Logging-related settings
    pub logging: LoggingConfig,
}

fn default_true() -> bool {
    true
}

/// Implementation for loading and parsing configuration
impl Settings {
    /// Loads settings from `./config`.
    pub fn new() -> Result<Self, ConfigError> {
        let config_dir = std::env::current_dir()
            .map_err(|e| ConfigError::Message(
                format!("Failed to get current directory: {}", e)
            ))?
            .join("config");
        Self::from_dir(&config_dir)
    }

    /// Creates a new Settings instance by loading config from multiple sources
    /// in the following order of precedence (highest to lowest):
    /// 1. Environment variables prefixed with MULTISUM__
    /// 2. Local config file (local.toml) if present
    /// 3. Default config file (default.toml)
    pub fn from_dir(config_dir: &Path) -> Result<Self, ConfigError> {
        if !config_dir.exists() {
            return Err(ConfigError::Message(
                format!("Config directory not found at: {}", config_dir.display())
            ));
        }

        let default_config = config_dir.join("default.toml");
        if !default_config.exists() {
            return Err(ConfigError::Message(
                format!("Default configuration file not found at: {}", default_config.display())
            ));
        }

        let local_config = config_dir.join("local.toml");

        let settings = Config::builder()
            .add_source(File::from(default_config))
            .add_source(File::from(local_config).required(false))
            .add_source(Environment::with_prefix("MULTISUM").prefix_separator("__").separator("__"))
            .build()?
            .try_deserialize::<Settings>()?;

        settings.validate()?;

        Ok(settings)
    }

    /// Builds settings from a TOML document without touching the filesystem
    /// or the environment.
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize::<Settings>()?;

        settings.validate()?;

        Ok(settings)
    }

    /// Per-model wait limit, if one is configured
    pub fn timeout(&self) -> Option<std::time::Duration> {
        self.inference.timeout_secs.map(std::time::Duration::from_secs)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Message(
                "Port must be between 1 and 65535, got: 0".to_string()
            ));
        }

        if self.inference.max_length == 0 {
            return Err(ConfigError::Message(
                "max_length must be greater than 0".to_string()
            ));
        }

        if self.inference.min_length > self.inference.max_length {
            return Err(ConfigError::Message(format!(
                "min_length ({}) must not exceed max_length ({})",
                self.inference.min_length, self.inference.max_length
            )));
        }

        if self.inference.context_size <= self.inference.max_length {
            return Err(ConfigError::Message(format!(
                "context_size ({}) must be larger than max_length ({})",
                self.inference.context_size, self.inference.max_length
            )));
        }

        if u32::try_from(self.inference.context_size).is_err() {
            return Err(ConfigError::Message(format!(
                "context_size must be at most {}, got: {}",
                u32::MAX, self.inference.context_size
            )));
        }

        if self.inference.timeout_secs == Some(0) {
            return Err(ConfigError::Message(
                "timeout_secs must be greater than 0 when set".to_string()
            ));
        }

        let mut seen = HashSet::new();
        for spec in &self.models.entries {
            if spec.name.trim().is_empty() {
                return Err(ConfigError::Message(
                    "Model names must not be empty".to_string()
                ));
            }
            if !seen.insert(spec.name.as_str()) {
                return Err(ConfigError::Message(
                    format!("Duplicate model name: {}", spec.name)
                ));
            }
            if let Some(prompt) = &spec.prompt {
                if !prompt.contains(TEXT_PLACEHOLDER) {
                    return Err(ConfigError::Message(format!(
                        "Prompt for model {} must contain the {} placeholder",
                        spec.name, TEXT_PLACEHOLDER
                    )));
                }
            }
        }

        match self.logging.level.to_lowercase().as_str() {
            "error" | "warn" | "info" | "debug" | "trace" => Ok(()),
            _ => Err(ConfigError::Message(
                format!("Invalid logging level: {}. Must be one of: error, warn, info, debug, trace",
                    self.logging.level)
            )),
        }?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = r#"
        [server]
        host = "0.0.0.0"
        port = 8000

        [models]
        directory = "models"

        [[models.entries]]
        name = "BART"
        file = "bart.gguf"

        [[models.entries]]
        name = "PEGASUS"
        file = "pegasus.gguf"
        prompt = "Summarize: {text}"

        [[models.entries]]
        name = "T5"
        file = "t5.gguf"

        [inference]
        max_length = 150
        min_length = 50
        context_size = 2048

        [logging]
        level = "info"
    "#;

    #[test]
    fn test_parses_models_in_order() {
        let settings = Settings::from_toml_str(BASE).unwrap();
        let names: Vec<&str> = settings.models.entries.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["BART", "PEGASUS", "T5"]);
        assert_eq!(settings.models.entries[1].prompt.as_deref(), Some("Summarize: {text}"));
        assert!(settings.inference.use_mmap);
        assert!(settings.timeout().is_none());
    }

    #[test]
    fn test_rejects_duplicate_model_names() {
        let toml = BASE.replace("name = \"T5\"", "name = \"BART\"");
        let err = Settings::from_toml_str(&toml).unwrap_err();
        assert!(err.to_string().contains("Duplicate model name"));
    }

    #[test]
    fn test_rejects_inverted_lengths() {
        let toml = BASE.replace("min_length = 50", "min_length = 200");
        assert!(Settings::from_toml_str(&toml).is_err());
    }

    #[test]
    fn test_rejects_prompt_without_placeholder() {
        let toml = BASE.replace("Summarize: {text}", "Summarize this");
        let err = Settings::from_toml_str(&toml).unwrap_err();
        assert!(err.to_string().contains("placeholder"));
    }

    #[test]
    fn test_rejects_unknown_log_level() {
        let toml = BASE.replace("level = \"info\"", "level = \"loud\"");
        assert!(Settings::from_toml_str(&toml).is_err());
    }

    #[test]
    fn test_timeout_is_optional() {
        let toml = BASE.replace("context_size = 2048", "context_size = 2048\ntimeout_secs = 30");
        let settings = Settings::from_toml_str(&toml).unwrap();
        assert_eq!(settings.timeout(), Some(std::time::Duration::from_secs(30)));

        let toml = BASE.replace("context_size = 2048", "context_size = 2048\ntimeout_secs = 0");
        assert!(Settings::from_toml_str(&toml).is_err());
    }

    #[test]
    fn test_rejects_context_size_beyond_u32() {
        let toml = BASE.replace("context_size = 2048", "context_size = 4294967296");
        let err = Settings::from_toml_str(&toml).unwrap_err();
        assert!(err.to_string().contains("context_size must be at most"));
    }

    #[test]
    fn test_missing_config_dir() {
        let err = Settings::from_dir(Path::new("/definitely/not/here")).unwrap_err();
        assert!(err.to_string().contains("Config directory not found"));
    }
}
