use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

use crate::pipeline::DEFAULT_MAX_TOKENS;
use crate::prompt::DEFAULT_SYSTEM_PROMPT;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Completion service configuration
    #[serde(default)]
    pub llm: LlmConfig,

    /// Application settings
    #[serde(default)]
    pub app: AppConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// OpenAI-compatible chat completions endpoint
    pub api_url: String,

    /// Model used for summaries
    pub model: String,

    /// Environment variable holding the API key
    pub api_key_env: String,

    /// Token budget for the summary
    pub max_tokens: u32,

    /// System message sent before the prompt
    pub system_prompt: String,

    /// HTTP request timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Caption language used when `--lang` is not given
    pub default_language: String,

    /// Summary mode used when `--mode` is not given
    pub default_mode: String,

    /// yt-dlp executable
    pub yt_dlp_path: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "chatgpt-4o-latest".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            timeout_secs: 120,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_language: "en".to_string(),
            default_mode: "standart".to_string(),
            yt_dlp_path: "yt-dlp".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file or create default
    pub async fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = fs_err::read_to_string(&config_path)
                .context("Failed to read config file")?;

            let config = Self::from_yaml(&content)?;
            tracing::debug!("Loaded configuration from {}", config_path.display());
            Ok(config)
        } else {
            let config = Self::default();
            config.save().await?;
            tracing::info!("Wrote default configuration to {}", config_path.display());
            Ok(config)
        }
    }

    /// Parse and validate a YAML document
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(content)
            .context("Failed to parse config file")?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs_err::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self)
            .context("Failed to serialize config")?;

        fs_err::write(&config_path, content)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Get configuration file path
    pub fn config_path() -> Result<PathBuf> {
        // First try current directory for easy testing
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?;

        Ok(config_dir.join("ytsum").join("config.yaml"))
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        Url::parse(&self.llm.api_url)
            .with_context(|| format!("Invalid llm.api_url: {}", self.llm.api_url))?;

        if self.llm.model.trim().is_empty() {
            anyhow::bail!("llm.model must be configured");
        }

        if self.llm.max_tokens == 0 {
            anyhow::bail!("llm.max_tokens must be greater than zero");
        }

        Ok(())
    }

    /// Read the API key from the configured environment variable
    pub fn api_key_from_env(&self) -> Option<String> {
        std::env::var(&self.llm.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  API URL: {}", self.llm.api_url);
        println!("  Model: {}", self.llm.model);
        println!("  API Key Variable: {}", self.llm.api_key_env);
        println!("  Max Tokens: {}", self.llm.max_tokens);
        println!("  Timeout: {}s", self.llm.timeout_secs);
        println!("  Default Language: {}", self.app.default_language);
        println!("  Default Mode: {}", self.app.default_mode);
        println!("  yt-dlp: {}", self.app.yt_dlp_path);
        if let Ok(path) = Self::config_path() {
            println!("  Config File: {}", path.display());
        }
    }
}
