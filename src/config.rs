use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::env;
use tracing::{info, warn};

use crate::llm_providers::LLMProviderType;
use crate::speech_service::{DEFAULT_SPEECH_BASE_URL, DEFAULT_SPEECH_MODEL};

use crate::{log_system_event, log_validation};

const PLACEHOLDER_API_KEY: &str = "your-api-key";

/// Complete application configuration loaded from environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub llm: LLMConfig,
    pub speech: SpeechConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

/// Generative text/image model configuration. A missing key switches the
/// generation endpoints to their canned responses.
#[derive(Debug, Clone, Deserialize)]
pub struct LLMConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub provider: LLMProviderType,
    pub model: Option<String>,
    pub image_model: Option<String>,
}

/// Text-to-speech voice service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SpeechConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub voice_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_enabled: bool,
    pub console_enabled: bool,
    pub log_directory: String,
}

/// Reads one setting by name; `env::var` in production, a map in tests.
pub trait ConfigSource {
    fn get(&self, name: &str) -> Option<String>;

    /// Like `get`, but treats blank values and the placeholder key as unset.
    fn secret(&self, name: &str) -> Option<String> {
        self.get(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty() && v != PLACEHOLDER_API_KEY)
    }
}

pub struct EnvSource;

impl ConfigSource for EnvSource {
    fn get(&self, name: &str) -> Option<String> {
        env::var(name).ok()
    }
}

impl<F> ConfigSource for F
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, name: &str) -> Option<String> {
        self(name)
    }
}

impl Config {
    /// Load configuration from environment variables with sensible defaults
    pub fn from_env() -> Result<Self> {
        Self::load(&EnvSource)
    }

    pub fn load(source: &impl ConfigSource) -> Result<Self> {
        log_system_event!(config, "Loading application configuration");

        let config = Config {
            database: DatabaseConfig::load(source),
            llm: LLMConfig::load(source),
            speech: SpeechConfig::load(source),
            server: ServerConfig::load(source)?,
            logging: LoggingConfig::load(source),
        };

        log_system_event!(config, "Configuration loaded successfully");
        Ok(config)
    }

    /// Log a summary of loaded configuration (without sensitive data)
    pub fn log_configuration_summary(&self) {
        info!(
            database_url_masked = %mask_sensitive_data(&self.database.url),
            llm_provider = ?self.llm.provider,
            llm_model = ?self.llm.model,
            llm_key = %self.llm.api_key.as_deref().map(mask_sensitive_data).unwrap_or_else(|| "<unset>".to_string()),
            speech_key = %self.speech.api_key.as_deref().map(mask_sensitive_data).unwrap_or_else(|| "<unset>".to_string()),
            server_address = %format!("{}:{}", self.server.host, self.server.port),
            log_level = %self.logging.level,
            "Configuration summary"
        );
    }

    pub fn validate(&self) -> Result<()> {
        if !self.database.url.starts_with("sqlite:") {
            return Err(anyhow!("DATABASE_URL must start with 'sqlite:'"));
        }

        if self.server.port == 0 {
            return Err(anyhow!("Server port must be greater than 0"));
        }

        if self.llm.api_key.is_none() {
            warn!("No generative AI key configured - lesson, quiz and chat endpoints will serve canned responses");
        }

        if self.speech.api_key.is_none() {
            warn!("No ElevenLabs key configured - speech synthesis is disabled");
        }

        log_validation!(success, "configuration", "Configuration validation completed successfully");
        Ok(())
    }
}

impl DatabaseConfig {
    fn load(source: &impl ConfigSource) -> Self {
        let url = source
            .get("DATABASE_URL")
            .unwrap_or_else(|| "sqlite:smart_tutor.db".to_string());

        DatabaseConfig { url }
    }
}

impl LLMConfig {
    fn load(source: &impl ConfigSource) -> Self {
        let api_key = source
            .secret("GEMINI_API_KEY")
            .or_else(|| source.secret("GOOGLE_API_KEY"))
            .or_else(|| source.secret("LLM_API_KEY"));

        let provider_str = source.get("LLM_PROVIDER").unwrap_or_else(|| "gemini".to_string());
        let provider = LLMProviderType::parse(&provider_str).unwrap_or_else(|| {
            info!("Unknown LLM provider '{}', defaulting to Gemini", provider_str);
            LLMProviderType::Gemini
        });

        LLMConfig {
            api_key,
            base_url: source.get("LLM_BASE_URL"),
            provider,
            model: source.get("LLM_MODEL"),
            image_model: source.get("LLM_IMAGE_MODEL"),
        }
    }
}

impl SpeechConfig {
    fn load(source: &impl ConfigSource) -> Self {
        SpeechConfig {
            api_key: source.secret("ELEVENLABS_API_KEY"),
            base_url: source
                .get("ELEVENLABS_BASE_URL")
                .unwrap_or_else(|| DEFAULT_SPEECH_BASE_URL.to_string()),
            model: source
                .get("ELEVENLABS_MODEL")
                .unwrap_or_else(|| DEFAULT_SPEECH_MODEL.to_string()),
            voice_id: source.secret("ELEVENLABS_VOICE_ID"),
        }
    }
}

impl ServerConfig {
    fn load(source: &impl ConfigSource) -> Result<Self> {
        let port_str = source.get("PORT").unwrap_or_else(|| "8000".to_string());

        let port = port_str.parse::<u16>().map_err(|_| {
            anyhow!("Invalid PORT value: '{}'. Must be a number between 1-65535", port_str)
        })?;

        let host = source.get("HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        Ok(ServerConfig { port, host })
    }
}

impl LoggingConfig {
    fn load(source: &impl ConfigSource) -> Self {
        let flag = |name: &str| {
            source
                .get(name)
                .and_then(|v| v.parse::<bool>().ok())
                .unwrap_or(true)
        };

        LoggingConfig {
            level: source
                .get("RUST_LOG")
                .unwrap_or_else(|| "info,smart_tutor=debug".to_string()),
            file_enabled: flag("LOG_FILE_ENABLED"),
            console_enabled: flag("LOG_CONSOLE_ENABLED"),
            log_directory: source.get("LOG_DIRECTORY").unwrap_or_else(|| "logs".to_string()),
        }
    }
}

/// Mask sensitive data in configuration for safe logging
pub fn mask_sensitive_data(data: &str) -> String {
    let chars: Vec<char> = data.chars().collect();
    if chars.len() <= 8 {
        "*".repeat(chars.len())
    } else {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}***{}", head, tail)
    }
}
