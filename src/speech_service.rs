use anyhow::{anyhow, Result};
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::{info, warn};

use crate::config::SpeechConfig;

use crate::log_speech_operation;

pub const DEFAULT_SPEECH_BASE_URL: &str = "https://api.elevenlabs.io";
pub const DEFAULT_SPEECH_MODEL: &str = "eleven_multilingual_v2";
pub const DEFAULT_VOICE_ID: &str = "21m00Tcm4TlvDq8ikWAM";

static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```[^\n]*\n?").expect("code fence pattern"));
static IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[([^\]]*)\]\([^)]*\)").expect("image pattern"));
static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\([^)]*\)").expect("link pattern"));
static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]{0,3}#{1,6}[ \t]*").expect("heading pattern"));
static BULLET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*(?:[-*+]|>)[ \t]+").expect("bullet pattern"));
static EMPHASIS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[*_~`]+").expect("emphasis pattern"));
static BLANK_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]+").expect("whitespace pattern"));

/// Strip markdown markup so the voice does not read symbols aloud.
pub fn clean_text_for_speech(text: &str) -> String {
    let text = CODE_FENCE.replace_all(text, "");
    let text = IMAGE.replace_all(&text, "$1");
    let text = LINK.replace_all(&text, "$1");
    let text = HEADING.replace_all(&text, "");
    let text = BULLET.replace_all(&text, "");
    let text = EMPHASIS.replace_all(&text, "");
    let text = BLANK_RUNS.replace_all(&text, " ");

    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Voice {
    pub voice_id: String,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VoicesResponse {
    #[serde(default)]
    voices: Vec<Voice>,
}

#[derive(Debug, Serialize)]
struct SynthesisRequest<'a> {
    text: &'a str,
    model_id: &'a str,
}

/// ElevenLabs text-to-speech client
#[derive(Debug, Clone)]
pub struct SpeechService {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    default_voice_id: String,
}

impl SpeechService {
    pub fn new(api_key: String, base_url: String, model: String, voice_id: Option<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            default_voice_id: voice_id.unwrap_or_else(|| DEFAULT_VOICE_ID.to_string()),
        }
    }

    /// `None` when no API key is configured.
    pub fn from_config(config: &SpeechConfig) -> Option<Self> {
        let api_key = config.api_key.clone()?;
        Some(Self::new(
            api_key,
            config.base_url.clone(),
            config.model.clone(),
            config.voice_id.clone(),
        ))
    }

    pub fn default_voice_id(&self) -> &str {
        &self.default_voice_id
    }

    pub async fn list_voices(&self) -> Result<Vec<Voice>> {
        let response = self
            .client
            .get(format!("{}/v1/voices", self.base_url))
            .header("xi-api-key", &self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(anyhow!("Voice listing failed ({}): {}", status, error_text));
        }

        let voices: VoicesResponse = response.json().await?;
        Ok(voices.voices)
    }

    /// Pick the account's first voice as the default, unless one was set
    /// explicitly. Listing errors keep the built-in default.
    pub async fn resolve_default_voice(mut self, configured: Option<&str>) -> Self {
        if configured.is_some() {
            return self;
        }

        match self.list_voices().await {
            Ok(voices) => match voices.into_iter().next() {
                Some(voice) => {
                    info!(voice_id = %voice.voice_id, voice_name = %voice.name, "Selected default voice");
                    self.default_voice_id = voice.voice_id;
                }
                None => warn!("No voices available, keeping built-in default voice"),
            },
            Err(e) => {
                log_speech_operation!(error, "list_voices", error = e);
            }
        }

        self
    }

    /// Synthesize already-cleaned text to MPEG audio bytes.
    pub async fn synthesize(&self, text: &str, voice_id: Option<&str>) -> Result<Vec<u8>> {
        let voice_id = voice_id
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(self.default_voice_id.as_str());

        let response = self
            .client
            .post(format!("{}/v1/text-to-speech/{}", self.base_url, voice_id))
            .header("xi-api-key", &self.api_key)
            .header("Accept", "audio/mpeg")
            .json(&SynthesisRequest {
                text,
                model_id: &self.model,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            let error = anyhow!("Speech request failed ({}): {}", status, error_text);
            log_speech_operation!(error, "synthesize", error = error);
            return Err(error);
        }

        let audio = response.bytes().await?.to_vec();
        if audio.is_empty() {
            return Err(anyhow!("No audio generated"));
        }

        log_speech_operation!(success, "synthesize", voice_id = voice_id, bytes = audio.len());
        Ok(audio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_strips_markdown() {
        let cleaned = clean_text_for_speech("## Volcanoes\n\n**Lava** is *very* hot!\n- It flows\n- It cools");
        assert_eq!(cleaned, "Volcanoes\nLava is very hot!\nIt flows\nIt cools");
    }

    #[test]
    fn test_clean_text_links_and_code() {
        let cleaned = clean_text_for_speech("See [the map](http://x.test) and `code`\n```rust\nlet a = 1;\n```");
        assert_eq!(cleaned, "See the map and code\nlet a = 1;");
    }

    #[test]
    fn test_clean_text_keeps_plain_sentences() {
        assert_eq!(clean_text_for_speech("  2 + 3 = 5  "), "2 + 3 = 5");
        assert_eq!(clean_text_for_speech("***"), "");
    }

    #[test]
    fn test_from_config() {
        let mut config = SpeechConfig {
            api_key: None,
            base_url: "http://localhost:9000/".to_string(),
            model: DEFAULT_SPEECH_MODEL.to_string(),
            voice_id: None,
        };
        assert!(SpeechService::from_config(&config).is_none());

        config.api_key = Some("xi-key".to_string());
        let service = SpeechService::from_config(&config).unwrap();
        assert_eq!(service.default_voice_id(), DEFAULT_VOICE_ID);
        assert_eq!(service.base_url, "http://localhost:9000");

        config.voice_id = Some("custom".to_string());
        let service = SpeechService::from_config(&config).unwrap();
        assert_eq!(service.default_voice_id(), "custom");
    }
}
