use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_GEMINI_IMAGE_MODEL: &str = "imagen-4.0-fast-generate-001";

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_OPENAI_IMAGE_MODEL: &str = "dall-e-3";

/// Common message structure for chat-style requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMMessage {
    pub role: String,
    pub content: String,
}

/// Enum-based provider so the service can be cloned into router state
#[derive(Debug, Clone)]
pub enum LLMProvider {
    OpenAI(OpenAIProvider),
    Gemini(GeminiProvider),
}

impl LLMProvider {
    /// Make a text request. With `json_mode` the provider is asked to emit a
    /// single JSON document.
    pub async fn make_request(
        &self,
        system_message: Option<&str>,
        prompt: &str,
        json_mode: bool,
    ) -> Result<String> {
        match self {
            LLMProvider::OpenAI(provider) => provider.make_request(system_message, prompt, json_mode).await,
            LLMProvider::Gemini(provider) => provider.make_request(system_message, prompt, json_mode).await,
        }
    }

    /// Generate one image and return it as a `data:` URL, or `None` when the
    /// provider returned no image.
    pub async fn generate_image(&self, prompt: &str, aspect_ratio: &str) -> Result<Option<String>> {
        match self {
            LLMProvider::OpenAI(provider) => provider.generate_image(prompt, aspect_ratio).await,
            LLMProvider::Gemini(provider) => provider.generate_image(prompt, aspect_ratio).await,
        }
    }

    pub fn provider_name(&self) -> &'static str {
        match self {
            LLMProvider::OpenAI(provider) => provider.provider_name(),
            LLMProvider::Gemini(provider) => provider.provider_name(),
        }
    }

    pub fn model_name(&self) -> &str {
        match self {
            LLMProvider::OpenAI(provider) => provider.model_name(),
            LLMProvider::Gemini(provider) => provider.model_name(),
        }
    }
}

fn normalize_base_url(base_url: Option<String>, default: &str) -> String {
    base_url
        .unwrap_or_else(|| default.to_string())
        .trim_end_matches('/')
        .to_string()
}

fn png_data_url(base64_payload: &str) -> String {
    format!("data:image/png;base64,{}", base64_payload)
}

async fn error_body(response: reqwest::Response) -> String {
    response.text().await.unwrap_or_else(|_| "Unknown error".to_string())
}

/// OpenAI provider implementation
#[derive(Debug, Clone)]
pub struct OpenAIProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    image_model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<LLMMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<OpenAIResponseFormat>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OpenAIResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OpenAIChoice {
    message: LLMMessage,
}

#[derive(Debug, Clone, Serialize)]
struct OpenAIImageRequest {
    model: String,
    prompt: String,
    n: u32,
    size: String,
    response_format: String,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAIImageResponse {
    #[serde(default)]
    data: Vec<OpenAIImageData>,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAIImageData {
    b64_json: Option<String>,
}

impl OpenAIProvider {
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        model: Option<String>,
        image_model: Option<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: normalize_base_url(base_url, DEFAULT_OPENAI_BASE_URL),
            model: model.unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            image_model: image_model.unwrap_or_else(|| DEFAULT_OPENAI_IMAGE_MODEL.to_string()),
        }
    }

    fn build_request(&self, system_message: Option<&str>, prompt: &str, json_mode: bool) -> OpenAIRequest {
        let mut messages = Vec::new();

        if let Some(sys_msg) = system_message {
            messages.push(LLMMessage {
                role: "system".to_string(),
                content: sys_msg.to_string(),
            });
        }

        messages.push(LLMMessage {
            role: "user".to_string(),
            content: prompt.to_string(),
        });

        OpenAIRequest {
            model: self.model.clone(),
            messages,
            response_format: json_mode.then(|| OpenAIResponseFormat {
                format_type: "json_object".to_string(),
            }),
        }
    }

    pub async fn make_request(
        &self,
        system_message: Option<&str>,
        prompt: &str,
        json_mode: bool,
    ) -> Result<String> {
        let request_body = self.build_request(system_message, prompt, json_mode);

        info!(
            provider = self.provider_name(),
            model = %self.model,
            base_url = %self.base_url,
            prompt_length = prompt.len(),
            json_mode,
            "Making LLM request"
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request_body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = error_body(response).await;
            error!(
                provider = self.provider_name(),
                status = %status,
                error = %error_text,
                "LLM API request failed"
            );
            return Err(anyhow!("OpenAI API request failed: {}", error_text));
        }

        let openai_response: OpenAIResponse = response.json().await?;

        let response_content = openai_response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| anyhow!("No choices in OpenAI response"))?;

        info!(
            provider = self.provider_name(),
            response_length = response_content.len(),
            "Successfully received LLM response"
        );

        Ok(response_content)
    }

    pub async fn generate_image(&self, prompt: &str, aspect_ratio: &str) -> Result<Option<String>> {
        let size = match aspect_ratio {
            "16:9" => "1792x1024",
            "9:16" => "1024x1792",
            _ => "1024x1024",
        };

        let request_body = OpenAIImageRequest {
            model: self.image_model.clone(),
            prompt: prompt.to_string(),
            n: 1,
            size: size.to_string(),
            response_format: "b64_json".to_string(),
        };

        info!(
            provider = self.provider_name(),
            model = %self.image_model,
            size,
            "Making image generation request"
        );

        let response = self
            .client
            .post(format!("{}/images/generations", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request_body)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = error_body(response).await;
            return Err(anyhow!("OpenAI image request failed: {}", error_text));
        }

        let image_response: OpenAIImageResponse = response.json().await?;

        Ok(image_response
            .data
            .into_iter()
            .find_map(|image| image.b64_json)
            .map(|payload| png_data_url(&payload)))
    }

    pub fn provider_name(&self) -> &'static str {
        "OpenAI"
    }

    pub fn model_name(&self) -> &str {
        &self.model
    }
}

/// Gemini provider implementation
#[derive(Debug, Clone)]
pub struct GeminiProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    image_model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiGenerationConfig {
    temperature: f32,
    #[serde(rename = "topK")]
    top_k: i32,
    #[serde(rename = "topP")]
    top_p: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: i32,
    #[serde(rename = "responseMimeType", skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}

#[derive(Debug, Clone, Serialize)]
struct ImagenRequest {
    instances: Vec<ImagenInstance>,
    parameters: ImagenParameters,
}

#[derive(Debug, Clone, Serialize)]
struct ImagenInstance {
    prompt: String,
}

#[derive(Debug, Clone, Serialize)]
struct ImagenParameters {
    #[serde(rename = "sampleCount")]
    sample_count: u32,
    #[serde(rename = "aspectRatio")]
    aspect_ratio: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ImagenResponse {
    #[serde(default)]
    predictions: Vec<ImagenPrediction>,
}

#[derive(Debug, Clone, Deserialize)]
struct ImagenPrediction {
    #[serde(rename = "bytesBase64Encoded")]
    bytes_base64_encoded: Option<String>,
}

impl GeminiProvider {
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        model: Option<String>,
        image_model: Option<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: normalize_base_url(base_url, DEFAULT_GEMINI_BASE_URL),
            model: model.unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            image_model: image_model.unwrap_or_else(|| DEFAULT_GEMINI_IMAGE_MODEL.to_string()),
        }
    }

    fn build_request(&self, system_message: Option<&str>, prompt: &str, json_mode: bool) -> GeminiRequest {
        let full_prompt = match system_message {
            Some(sys_msg) => format!("{}\n\n{}", sys_msg, prompt),
            None => prompt.to_string(),
        };

        GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: full_prompt }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: 0.7,
                top_k: 40,
                top_p: 0.9,
                max_output_tokens: 2048,
                response_mime_type: json_mode.then(|| "application/json".to_string()),
            },
        }
    }

    pub async fn make_request(
        &self,
        system_message: Option<&str>,
        prompt: &str,
        json_mode: bool,
    ) -> Result<String> {
        let request_body = self.build_request(system_message, prompt, json_mode);

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        info!(
            provider = self.provider_name(),
            model = %self.model,
            base_url = %self.base_url,
            prompt_length = prompt.len(),
            json_mode,
            "Making LLM request"
        );

        let response = self.client.post(&url).json(&request_body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = error_body(response).await;
            error!(
                provider = self.provider_name(),
                status = %status,
                error = %error_text,
                "LLM API request failed"
            );
            return Err(anyhow!("Gemini API request failed: {}", error_text));
        }

        let gemini_response: GeminiResponse = response.json().await?;

        let candidate = gemini_response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("No candidates in Gemini response"))?;

        if candidate.content.parts.is_empty() {
            return Err(anyhow!("No parts in Gemini response"));
        }

        let response_content: String = candidate
            .content
            .parts
            .into_iter()
            .map(|part| part.text)
            .collect();

        info!(
            provider = self.provider_name(),
            response_length = response_content.len(),
            "Successfully received LLM response"
        );

        Ok(response_content)
    }

    pub async fn generate_image(&self, prompt: &str, aspect_ratio: &str) -> Result<Option<String>> {
        let request_body = ImagenRequest {
            instances: vec![ImagenInstance {
                prompt: prompt.to_string(),
            }],
            parameters: ImagenParameters {
                sample_count: 1,
                aspect_ratio: aspect_ratio.to_string(),
            },
        };

        let url = format!(
            "{}/models/{}:predict?key={}",
            self.base_url, self.image_model, self.api_key
        );

        info!(
            provider = self.provider_name(),
            model = %self.image_model,
            aspect_ratio,
            "Making image generation request"
        );

        let response = self.client.post(&url).json(&request_body).send().await?;

        if !response.status().is_success() {
            let error_text = error_body(response).await;
            return Err(anyhow!("Gemini image request failed: {}", error_text));
        }

        let imagen_response: ImagenResponse = response.json().await?;

        Ok(imagen_response
            .predictions
            .into_iter()
            .find_map(|prediction| prediction.bytes_base64_encoded)
            .map(|payload| png_data_url(&payload)))
    }

    pub fn provider_name(&self) -> &'static str {
        "Gemini"
    }

    pub fn model_name(&self) -> &str {
        &self.model
    }
}

/// Centralized JSON response parser with robust extraction logic
#[derive(Clone)]
pub struct JsonResponseParser;

impl JsonResponseParser {
    /// Extract JSON from model output that might be wrapped in markdown fences
    pub fn extract_json_from_response(content: &str) -> String {
        if let Some(start) = content.find("```json") {
            if let Some(end) = content[start + 7..].find("```") {
                let json_start = start + 7;
                let json_end = json_start + end;
                return content[json_start..json_end].trim().to_string();
            }
        }

        if let Some(start) = content.find("```") {
            if let Some(end) = content[start + 3..].find("```") {
                let json_start = start + 3;
                let json_end = json_start + end;
                let potential_json = content[json_start..json_end].trim();
                if potential_json.starts_with('{') || potential_json.starts_with('[') {
                    return potential_json.to_string();
                }
            }
        }

        let object_start = content.find('{');
        let array_start = content.find('[');

        // Whichever container opens first is the outermost one.
        let candidates = match (object_start, array_start) {
            (Some(o), Some(a)) if a < o => [('[', ']'), ('{', '}')],
            _ => [('{', '}'), ('[', ']')],
        };

        for (open, close) in candidates {
            if let (Some(start), Some(end)) = (content.find(open), content.rfind(close)) {
                if end > start {
                    return content[start..=end].to_string();
                }
            }
        }

        content.trim().to_string()
    }

    /// Parse a model response into a specific type
    pub fn parse_json_response<T>(&self, content: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let json_content = Self::extract_json_from_response(content);
        serde_json::from_str::<T>(&json_content)
            .map_err(|e| anyhow!("Failed to parse JSON response: {}", e))
    }
}

/// Factory for creating providers based on provider type
pub struct LLMProviderFactory;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum LLMProviderType {
    OpenAI,
    Gemini,
}

impl LLMProviderType {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "openai" | "gpt" => Some(Self::OpenAI),
            "gemini" | "google" => Some(Self::Gemini),
            _ => None,
        }
    }
}

impl LLMProviderFactory {
    pub fn create_provider(
        provider_type: LLMProviderType,
        api_key: String,
        base_url: Option<String>,
        model: Option<String>,
        image_model: Option<String>,
    ) -> LLMProvider {
        match provider_type {
            LLMProviderType::OpenAI => {
                LLMProvider::OpenAI(OpenAIProvider::new(api_key, base_url, model, image_model))
            }
            LLMProviderType::Gemini => {
                LLMProvider::Gemini(GeminiProvider::new(api_key, base_url, model, image_model))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_provider_defaults() {
        let gemini = LLMProviderFactory::create_provider(LLMProviderType::Gemini, "k".into(), None, None, None);
        assert_eq!(gemini.provider_name(), "Gemini");
        assert_eq!(gemini.model_name(), DEFAULT_GEMINI_MODEL);

        let openai = LLMProviderFactory::create_provider(
            LLMProviderType::OpenAI,
            "k".into(),
            Some("http://localhost:8080/v1/".into()),
            Some("gpt-4o".into()),
            None,
        );
        assert_eq!(openai.provider_name(), "OpenAI");
        assert_eq!(openai.model_name(), "gpt-4o");
        match openai {
            LLMProvider::OpenAI(provider) => assert_eq!(provider.base_url, "http://localhost:8080/v1"),
            LLMProvider::Gemini(_) => panic!("expected OpenAI provider"),
        }
    }

    #[test]
    fn test_gemini_json_mode_request() {
        let provider = GeminiProvider::new("k".into(), None, None, None);

        let plain = serde_json::to_value(provider.build_request(None, "hi", false)).unwrap();
        assert!(plain["generationConfig"].get("responseMimeType").is_none());

        let json_mode = serde_json::to_value(provider.build_request(Some("sys"), "hi", true)).unwrap();
        assert_eq!(json_mode["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(json_mode["contents"][0]["parts"][0]["text"], "sys\n\nhi");
    }

    #[test]
    fn test_openai_json_mode_request() {
        let provider = OpenAIProvider::new("k".into(), None, None, None);

        let plain = serde_json::to_value(provider.build_request(None, "hi", false)).unwrap();
        assert!(plain.get("response_format").is_none());
        assert_eq!(plain["messages"].as_array().unwrap().len(), 1);

        let json_mode = serde_json::to_value(provider.build_request(Some("sys"), "hi", true)).unwrap();
        assert_eq!(json_mode["response_format"], json!({"type": "json_object"}));
        assert_eq!(json_mode["messages"][0]["role"], "system");
    }

    #[test]
    fn test_extract_json_variants() {
        let fenced = "Here you go:\n```json\n{\"plan\": [\"A\"]}\n```";
        assert_eq!(JsonResponseParser::extract_json_from_response(fenced), "{\"plan\": [\"A\"]}");

        let bare_fence = "```\n[1, 2]\n```";
        assert_eq!(JsonResponseParser::extract_json_from_response(bare_fence), "[1, 2]");

        let array_of_objects = "[{\"needs_image\": true}]";
        assert_eq!(
            JsonResponseParser::extract_json_from_response(array_of_objects),
            array_of_objects
        );

        let chatty = "Sure! {\"a\": 1} hope that helps";
        assert_eq!(JsonResponseParser::extract_json_from_response(chatty), "{\"a\": 1}");
    }

    #[test]
    fn test_parse_json_response() {
        let parser = JsonResponseParser;
        let value: Value = parser.parse_json_response("```json\n{\"plan\": []}\n```").unwrap();
        assert_eq!(value, json!({"plan": []}));

        let failure: Result<Value> = parser.parse_json_response("not json at all");
        assert!(failure.is_err());
    }

    #[test]
    fn test_provider_type_parse() {
        assert_eq!(LLMProviderType::parse("OpenAI"), Some(LLMProviderType::OpenAI));
        assert_eq!(LLMProviderType::parse(" gemini "), Some(LLMProviderType::Gemini));
        assert_eq!(LLMProviderType::parse("claude"), None);
    }
}
