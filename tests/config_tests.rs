use std::collections::HashMap;

use smart_tutor::config::Config;
use smart_tutor::speech_service::{DEFAULT_SPEECH_BASE_URL, DEFAULT_VOICE_ID};
use smart_tutor::{LLMProviderType, LLMService, SpeechService};

fn load(pairs: &[(&str, &str)]) -> Config {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Config::load(&move |name: &str| vars.get(name).cloned()).unwrap()
}

#[test]
fn test_unconfigured_services_stay_disabled() {
    let config = load(&[]);

    assert!(LLMService::from_config(&config.llm).is_none());
    assert!(SpeechService::from_config(&config.speech).is_none());
    assert_eq!(config.speech.base_url, DEFAULT_SPEECH_BASE_URL);
    assert!(config.validate().is_ok());
}

#[test]
fn test_placeholder_keys_count_as_missing() {
    let config = load(&[
        ("GEMINI_API_KEY", "your-api-key"),
        ("ELEVENLABS_API_KEY", "   "),
    ]);

    assert!(config.llm.api_key.is_none());
    assert!(config.speech.api_key.is_none());
}

#[test]
fn test_gemini_service_from_google_key() {
    let config = load(&[("GOOGLE_API_KEY", "google-key-123")]);

    assert_eq!(config.llm.provider, LLMProviderType::Gemini);
    let llm = LLMService::from_config(&config.llm).unwrap();
    assert_eq!(llm.provider_name(), "Gemini");
    assert_eq!(llm.model_name(), "gemini-2.0-flash");
}

#[test]
fn test_openai_service_with_model_override() {
    let config = load(&[
        ("LLM_PROVIDER", "OpenAI"),
        ("LLM_API_KEY", "sk-test-key"),
        ("LLM_MODEL", "gpt-4o"),
        ("LLM_BASE_URL", "http://localhost:9000/v1"),
    ]);

    let llm = LLMService::from_config(&config.llm).unwrap();
    assert_eq!(llm.provider_name(), "OpenAI");
    assert_eq!(llm.model_name(), "gpt-4o");
}

#[test]
fn test_speech_service_voice_selection() {
    let config = load(&[("ELEVENLABS_API_KEY", "xi-key-123")]);
    let speech = SpeechService::from_config(&config.speech).unwrap();
    assert_eq!(speech.default_voice_id(), DEFAULT_VOICE_ID);

    let config = load(&[
        ("ELEVENLABS_API_KEY", "xi-key-123"),
        ("ELEVENLABS_VOICE_ID", "custom-voice"),
    ]);
    let speech = SpeechService::from_config(&config.speech).unwrap();
    assert_eq!(speech.default_voice_id(), "custom-voice");
}

#[test]
fn test_rejects_non_sqlite_database() {
    let config = load(&[("DATABASE_URL", "postgres://localhost/tutor")]);
    assert!(config.validate().is_err());

    let config = load(&[("DATABASE_URL", "sqlite::memory:")]);
    assert!(config.validate().is_ok());
}

#[test]
fn test_server_address_settings() {
    let config = load(&[("PORT", "3000"), ("HOST", "127.0.0.1")]);
    assert_eq!(config.server.port, 3000);
    assert_eq!(config.server.host, "127.0.0.1");

    let vars: HashMap<String, String> = [("PORT".to_string(), "eighty".to_string())].into();
    assert!(Config::load(&move |name: &str| vars.get(name).cloned()).is_err());
}
