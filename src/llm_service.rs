use anyhow::Result;
use serde::Deserialize;
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, warn};

use crate::config::LLMConfig;
use crate::llm_providers::{JsonResponseParser, LLMProvider, LLMProviderFactory, LLMProviderType};
use crate::models::{
    ChatReply, ChatRequest, FlashcardDraft, FlashcardGenerateRequest, GeneratedFlashcards,
    GeneratedQuiz, Greeting, GreetingRequest, LessonContent, LessonContentRequest, LessonPlan,
    LessonPlanRequest, QuizQuestion, QuizRequest, TwiVocabRequest, TwiVocabulary,
};

use crate::log_llm_operation;

/// Longest source text passed to flashcard generation, in characters.
pub const MAX_FLASHCARD_SOURCE_CHARS: usize = 2000;

/// Aspect ratio used for lesson illustrations.
pub const LESSON_IMAGE_ASPECT_RATIO: &str = "16:9";

/// Highest grade that gets the young-learner greeting.
const YOUNG_LEARNER_MAX_GRADE: i64 = 2;

#[derive(Debug, Default, Deserialize)]
struct ImageDecision {
    #[serde(default)]
    needs_image: bool,
    #[serde(default)]
    image_prompt: Option<String>,
}

impl ImageDecision {
    /// Models sometimes wrap the object in a one-element array.
    fn from_value(value: Value) -> Self {
        let value = match value {
            Value::Array(items) => items.into_iter().next().unwrap_or(Value::Null),
            other => other,
        };
        serde_json::from_value(value).unwrap_or_default()
    }

    fn illustration_prompt(&self) -> Option<&str> {
        if !self.needs_image {
            return None;
        }
        self.image_prompt.as_deref().map(str::trim).filter(|p| !p.is_empty())
    }
}

#[derive(Clone)]
pub struct LLMService {
    provider: LLMProvider,
    json_parser: JsonResponseParser,
}

impl LLMService {
    pub fn new_with_provider(
        api_key: String,
        base_url: Option<String>,
        provider_type: LLMProviderType,
        model: Option<String>,
        image_model: Option<String>,
    ) -> Self {
        let provider =
            LLMProviderFactory::create_provider(provider_type, api_key, base_url, model, image_model);

        Self {
            provider,
            json_parser: JsonResponseParser,
        }
    }

    /// Build the service from configuration; `None` when no key is configured.
    pub fn from_config(config: &LLMConfig) -> Option<Self> {
        let api_key = config.api_key.clone()?;
        Some(Self::new_with_provider(
            api_key,
            config.base_url.clone(),
            config.provider,
            config.model.clone(),
            config.image_model.clone(),
        ))
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.provider_name()
    }

    pub fn model_name(&self) -> &str {
        self.provider.model_name()
    }

    async fn request(&self, operation: &str, prompt: &str, json_mode: bool) -> Result<String> {
        let provider = self.provider.provider_name();
        log_llm_operation!(start, operation, provider = provider);
        let started = Instant::now();

        match self.provider.make_request(None, prompt, json_mode).await {
            Ok(text) => {
                log_llm_operation!(
                    success,
                    operation,
                    provider = provider,
                    duration_ms = started.elapsed().as_millis() as u64
                );
                Ok(text)
            }
            Err(e) => {
                log_llm_operation!(error, operation, provider = provider, error = e);
                Err(e)
            }
        }
    }

    async fn request_json<T>(&self, operation: &str, prompt: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let response_text = self.request(operation, prompt, true).await?;
        debug!(operation, response_content = %response_text, "Raw JSON-mode response");
        self.json_parser.parse_json_response(&response_text)
    }

    /// Greeting never fails; generation errors fall back to a fixed line.
    pub async fn greet(&self, request: &GreetingRequest) -> Greeting {
        match self.request("greet", &greeting_prompt(request), false).await {
            Ok(message) => Greeting { message },
            Err(e) => {
                log_llm_operation!(fallback, "greet", e);
                Greeting {
                    message: format!("Hello {}! Ready to learn?", request.name),
                }
            }
        }
    }

    /// Tutor chat never fails; generation errors fall back to a fixed line.
    pub async fn chat(&self, request: &ChatRequest) -> ChatReply {
        match self.request("chat", &chat_prompt(request), false).await {
            Ok(reply) => ChatReply { reply },
            Err(e) => {
                log_llm_operation!(fallback, "chat", e);
                ChatReply {
                    reply: "Oops! I got a little confused. Can you ask that again?".to_string(),
                }
            }
        }
    }

    pub async fn lesson_plan(&self, request: &LessonPlanRequest) -> Result<LessonPlan> {
        self.request_json("lesson_plan", &lesson_plan_prompt(request)).await
    }

    /// Writes the lesson text, then asks whether an illustration would help and
    /// generates one if so. Image failures leave `image_url` empty.
    pub async fn lesson_content(&self, request: &LessonContentRequest) -> Result<LessonContent> {
        let content = self
            .request("lesson_content", &lesson_content_prompt(request), false)
            .await?;

        let image_url = self.illustrate(request).await;

        Ok(LessonContent { content, image_url })
    }

    async fn illustrate(&self, request: &LessonContentRequest) -> Option<String> {
        let decision = match self
            .request_json::<Value>("image_decision", &image_decision_prompt(request))
            .await
        {
            Ok(value) => ImageDecision::from_value(value),
            Err(e) => {
                warn!(subtopic = %request.subtopic, error = %e, "Image decision failed, skipping illustration");
                return None;
            }
        };

        let image_prompt = decision.illustration_prompt()?;
        let prompt = format!(
            "Educational illustration for Grade {} students: {}. Clear, colorful, age-appropriate, diagram style. No text or labels.",
            request.grade, image_prompt
        );

        match self.provider.generate_image(&prompt, LESSON_IMAGE_ASPECT_RATIO).await {
            Ok(Some(url)) => {
                debug!(subtopic = %request.subtopic, "Generated lesson illustration");
                Some(url)
            }
            Ok(None) => {
                warn!(subtopic = %request.subtopic, "Image model returned no image");
                None
            }
            Err(e) => {
                warn!(subtopic = %request.subtopic, error = %e, "Image generation failed");
                None
            }
        }
    }

    pub async fn quiz(&self, request: &QuizRequest) -> Result<GeneratedQuiz> {
        let mut quiz: GeneratedQuiz = self.request_json("quiz", &quiz_prompt(request)).await?;

        for (index, question) in quiz.questions.iter_mut().enumerate() {
            if question.id.is_null() {
                question.id = Value::from(index + 1);
            }
        }

        Ok(quiz)
    }

    pub async fn twi_vocab(&self, request: &TwiVocabRequest) -> Result<TwiVocabulary> {
        self.request_json("twi_vocab", &twi_vocab_prompt(request)).await
    }

    pub async fn flashcards(&self, request: &FlashcardGenerateRequest) -> Result<GeneratedFlashcards> {
        self.request_json("generate_flashcards", &flashcard_prompt(request)).await
    }
}

// Canned responses served when no generative model is configured

pub fn fallback_greeting(request: &GreetingRequest) -> Greeting {
    Greeting {
        message: format!(
            "Hello {}! Welcome to your learning hub! (AI Key missing)",
            request.name
        ),
    }
}

pub fn fallback_chat() -> ChatReply {
    ChatReply {
        reply: "I'm sorry, I can't chat right now because my brain (API Key) is missing!".to_string(),
    }
}

pub fn fallback_lesson_plan(request: &LessonPlanRequest) -> LessonPlan {
    LessonPlan {
        plan: vec![
            format!("Introduction to {}", request.topic),
            "Key Concepts".to_string(),
            "Examples".to_string(),
            "Summary".to_string(),
        ],
    }
}

pub fn fallback_lesson_content(request: &LessonContentRequest) -> LessonContent {
    LessonContent {
        content: format!(
            "Simulation: Content for {} (Grade {})",
            request.subtopic, request.grade
        ),
        image_url: None,
    }
}

pub fn fallback_quiz(request: &QuizRequest) -> GeneratedQuiz {
    GeneratedQuiz {
        questions: (1..=request.num_questions)
            .map(|i| QuizQuestion {
                id: Value::from(i),
                question: format!("Question {} about {}", i, request.topic),
                options: ["A", "B", "C", "D"].iter().map(|o| o.to_string()).collect(),
                correct: "A".to_string(),
                explanation: None,
            })
            .collect(),
    }
}

pub fn fallback_twi_vocab(request: &TwiVocabRequest) -> TwiVocabulary {
    TwiVocabulary {
        vocab: Vec::new(),
        message: Some(format!("Simulation: Twi vocab for {}", request.topic)),
    }
}

pub fn fallback_flashcards() -> GeneratedFlashcards {
    GeneratedFlashcards {
        flashcards: Vec::<FlashcardDraft>::new(),
    }
}

/// First `max_chars` characters of `text`, never splitting a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

fn greeting_prompt(request: &GreetingRequest) -> String {
    if request.grade <= YOUNG_LEARNER_MAX_GRADE {
        format!(
            "You are a kind, encouraging elementary school teacher. Say hello to {}, a Grade {} student, \
             and ask if they are ready to play with words and numbers! Keep it very short and fun.",
            request.name, request.grade
        )
    } else {
        format!(
            "You are a helpful tutor. Say hello to {}, a Grade {} student. Encourage them to tackle \
             some math and science today. Keep it short and motivating.",
            request.name, request.grade
        )
    }
}

fn chat_prompt(request: &ChatRequest) -> String {
    format!(
        r#"You are a friendly, encouraging tutor named "Professor Hoot" helping a Grade {grade} student.

Current lesson context:
{context}

Student question:
{message}

Instructions:
1. Answer simply and clearly, using language a Grade {grade} student understands.
2. Be encouraging and positive. Use emojis occasionally.
3. If the question is about the lesson, use the context above.
4. If the question is off-topic, gently guide the student back to learning.
5. Keep the answer under 3 sentences unless a detailed explanation is needed."#,
        grade = request.student_grade,
        context = request.context,
        message = request.message,
    )
}

fn lesson_plan_prompt(request: &LessonPlanRequest) -> String {
    format!(
        r#"Create a short lesson plan with 3 to 5 distinct sub-topics for teaching '{}' in '{}' to a Grade {} student.
Return ONLY valid JSON with a key "plan" containing a list of strings (the sub-topic titles).
Example: {{ "plan": ["What is a Volcano?", "Types of Volcanoes", "Why do they Erupt?"] }}"#,
        request.topic, request.subject, request.grade
    )
}

fn lesson_content_prompt(request: &LessonContentRequest) -> String {
    format!(
        r#"You are a tutor for a Grade {grade} student.
Subject: {subject}
Main topic: {topic}
Current sub-topic: {subtopic}

Write a clear, engaging and age-appropriate explanation of this sub-topic.
Use analogies if helpful. Keep it focused on '{subtopic}'."#,
        grade = request.grade,
        subject = request.subject,
        topic = request.topic,
        subtopic = request.subtopic,
    )
}

fn image_decision_prompt(request: &LessonContentRequest) -> String {
    format!(
        r#"Topic: {subtopic}
Subject: {subject}
Grade: {grade}

Would a visual diagram, illustration or educational image significantly help a Grade {grade} student understand "{subtopic}"?
Consider diagrams for processes, scientific concepts, historical events, geography, anatomy, chemistry and physics.

Respond with JSON:
{{
    "needs_image": true or false,
    "image_prompt": "A detailed prompt for generating an educational illustration (only if needs_image is true)"
}}"#,
        subtopic = request.subtopic,
        subject = request.subject,
        grade = request.grade,
    )
}

fn quiz_prompt(request: &QuizRequest) -> String {
    format!(
        r#"You are a tutor for a Grade {} student.
Create a {}-question multiple choice quiz about '{}' in {}.
The output must be a JSON object with a key "questions".
Each question object must have:
- "id"
- "question"
- "options" (list of 4 strings)
- "correct" (the exact text of the correct option)
- "explanation" (one short sentence on why the correct answer is right and the others are not)"#,
        request.grade, request.num_questions, request.topic, request.subject
    )
}

fn twi_vocab_prompt(request: &TwiVocabRequest) -> String {
    format!(
        r#"You are an expert Asante Twi language teacher.
Create a list of 5 common Twi words or phrases related to '{}'.
Format the output as a JSON object with a key "vocab".
Each item must have "twi" (the word or phrase), "english" (translation), "pronunciation" (phonetic guide) and "example" (a simple sentence using the word).
Example:
{{
  "vocab": [
    {{
      "twi": "Maakye",
      "english": "Good morning",
      "pronunciation": "Ma-chi",
      "example": "Maakye, Papa. (Good morning, Father.)"
    }}
  ]
}}"#,
        request.topic
    )
}

fn flashcard_prompt(request: &FlashcardGenerateRequest) -> String {
    format!(
        r#"Create {} flashcards from the following text.
Return a JSON object with a key "flashcards" containing a list of objects.
Each object must have "front" (question) and "back" (answer).
Keep questions concise and answers clear.

Text: {}"#,
        request.num_cards,
        truncate_chars(&request.text, MAX_FLASHCARD_SOURCE_CHARS)
    )
}
