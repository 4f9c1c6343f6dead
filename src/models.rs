use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_AVATAR: &str = "🎓";
pub const PRIVATE_AVATAR: &str = "👤";

// Stored rows

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Student {
    pub id: i64,
    pub name: String,
    pub grade: i64,
    pub avatar: String,
    pub xp: i64,
    pub level: i64,
    pub is_public_profile: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub id: i64,
    pub student_id: Option<i64>,
    pub student_name: String,
    pub grade: i64,
    pub subject: String,
    pub topic: String,
    pub score: i64,
    pub total_questions: i64,
    pub timestamp: DateTime<Utc>,
}

impl TestResult {
    /// Fraction of questions answered correctly, 0.0 when the quiz had no questions.
    pub fn percentage(&self) -> f64 {
        if self.total_questions > 0 {
            self.score as f64 / self.total_questions as f64
        } else {
            0.0
        }
    }

    pub fn is_perfect(&self) -> bool {
        self.score == self.total_questions
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flashcard {
    pub id: i64,
    pub student_id: i64,
    pub topic: String,
    pub front: String,
    pub back: String,
    pub ease_factor: f64,
    pub interval: i64, // days
    pub next_review: DateTime<Utc>,
    pub review_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonLog {
    pub id: i64,
    pub student_id: i64,
    pub subject: String,
    pub topic: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedQuiz {
    pub id: i64,
    pub student_id: i64,
    pub subject: String,
    pub topic: String,
    pub questions: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Badge {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub criteria_type: String,
    pub criteria_value: i64,
    pub tier: String, // bronze, silver, gold, platinum
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentBadge {
    pub id: i64,
    pub student_id: i64,
    pub badge_id: i64,
    pub earned_at: DateTime<Utc>,
    pub is_new: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StudentStreak {
    pub id: i64,
    pub student_id: i64,
    pub current_streak: i64,
    pub longest_streak: i64,
    pub last_activity_date: Option<NaiveDate>,
    pub freeze_available: bool,
}

/// Catalog entry used when seeding the badges table.
#[derive(Debug, Clone)]
pub struct NewBadge {
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub criteria_type: &'static str,
    pub criteria_value: i64,
    pub tier: &'static str,
}

// Profile and progress requests

fn default_avatar() -> String {
    DEFAULT_AVATAR.to_string()
}

fn default_question_count() -> u32 {
    5
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateStudentRequest {
    pub name: String,
    pub grade: i64,
    #[serde(default = "default_avatar")]
    pub avatar: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStudentRequest {
    pub name: String,
    pub grade: i64,
    pub avatar: String,
    #[serde(default)]
    pub is_public: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XpUpdateRequest {
    pub student_id: i64,
    pub xp_amount: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrivacyUpdateRequest {
    #[serde(default)]
    pub is_public: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyPinRequest {
    #[serde(default)]
    pub pin: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangePinRequest {
    pub old_pin: String,
    pub new_pin: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateResultRequest {
    #[serde(default)]
    pub student_id: Option<i64>,
    pub student_name: String,
    pub grade: i64,
    pub subject: String,
    pub topic: String,
    pub score: i64,
    pub total_questions: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLessonLogRequest {
    pub subject: String,
    pub topic: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSavedQuizRequest {
    pub student_id: i64,
    pub subject: String,
    pub topic: String,
    pub questions: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFlashcardRequest {
    pub topic: String,
    pub front: String,
    pub back: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewFlashcardRequest {
    pub rating: String, // "easy", "medium", "hard"
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardParams {
    pub period: Option<String>,
    pub limit: Option<i64>,
}

// Profile and progress responses

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct XpUpdateResult {
    pub xp: i64,
    pub level: i64,
    pub leveled_up: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub id: i64,
    pub name: String,
    pub xp: i64,
    pub level: i64,
    pub avatar: String,
    pub is_public: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReviewRecommendation {
    pub subject: String,
    pub topic: String,
    pub last_score: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlashcardReviewResult {
    pub next_review: DateTime<Utc>,
    pub interval: i64,
    pub ease_factor: f64,
    pub review_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BadgeSummary {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub tier: String,
}

impl From<&Badge> for BadgeSummary {
    fn from(badge: &Badge) -> Self {
        Self {
            id: badge.id,
            name: badge.name.clone(),
            description: badge.description.clone(),
            icon: badge.icon.clone(),
            tier: badge.tier.clone(),
        }
    }
}

/// A catalog badge as seen by one student.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentBadgeView {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub tier: String,
    pub earned: bool,
    pub earned_at: Option<DateTime<Utc>>,
    pub is_new: bool,
    pub progress: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BadgesAwarded {
    pub new_badges: Vec<BadgeSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StreakView {
    pub current_streak: i64,
    pub longest_streak: i64,
    pub last_activity: Option<NaiveDate>,
    pub freeze_available: bool,
}

impl From<&StudentStreak> for StreakView {
    fn from(streak: &StudentStreak) -> Self {
        Self {
            current_streak: streak.current_streak,
            longest_streak: streak.longest_streak,
            last_activity: streak.last_activity_date,
            freeze_available: streak.freeze_available,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityOutcome {
    pub current_streak: i64,
    pub longest_streak: i64,
    pub freeze_available: bool,
    pub already_logged: bool,
    pub new_badges: Vec<BadgeSummary>,
}

// Generation requests

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GreetingRequest {
    pub name: String,
    pub grade: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub context: String,
    pub student_grade: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonPlanRequest {
    pub subject: String,
    pub topic: String,
    pub grade: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonContentRequest {
    pub subject: String,
    pub topic: String,
    pub subtopic: String,
    pub grade: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizRequest {
    pub subject: String,
    pub topic: String,
    pub grade: i64,
    #[serde(default = "default_question_count")]
    pub num_questions: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwiVocabRequest {
    pub topic: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlashcardGenerateRequest {
    pub text: String,
    #[serde(default = "default_question_count")]
    pub num_cards: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsRequest {
    pub text: String,
    pub voice_id: Option<String>,
}

// Generation responses

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Greeting {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LessonPlan {
    pub plan: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonContent {
    pub content: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizQuestion {
    #[serde(default)]
    pub id: serde_json::Value,
    pub question: String,
    pub options: Vec<String>,
    pub correct: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedQuiz {
    pub questions: Vec<QuizQuestion>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwiWord {
    pub twi: String,
    pub english: String,
    pub pronunciation: String,
    pub example: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwiVocabulary {
    pub vocab: Vec<TwiWord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlashcardDraft {
    pub front: String,
    pub back: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedFlashcards {
    pub flashcards: Vec<FlashcardDraft>,
}
