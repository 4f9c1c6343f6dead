pub mod api;
pub mod config;
pub mod database;
pub mod errors;
pub mod flashcard_service;
pub mod gamification;
pub mod gamification_service;
pub mod llm_providers;
pub mod llm_service;
pub mod logging;
pub mod models;
pub mod scheduler;
pub mod speech_service;
pub mod student_service;

pub use database::Database;
pub use errors::*;
pub use flashcard_service::FlashcardService;
pub use gamification_service::GamificationService;
pub use llm_providers::{JsonResponseParser, LLMProvider, LLMProviderFactory, LLMProviderType};
pub use llm_service::LLMService;
pub use models::*;
pub use scheduler::{FlashcardScheduler, ReviewRating};
pub use speech_service::SpeechService;
pub use student_service::StudentService;
