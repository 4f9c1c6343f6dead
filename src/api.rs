use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post, put},
    Router,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};

use crate::{
    api_error,
    errors::{ApiError, ErrorContext, ErrorResponse},
    flashcard_service::FlashcardService,
    gamification_service::GamificationService,
    llm_service::{self, LLMService},
    models::*,
    scheduler::ReviewRating,
    speech_service::{clean_text_for_speech, SpeechService},
    student_service::StudentService,
};

use crate::{log_api_error, log_api_start, log_api_success, log_api_warn, log_llm_operation, log_validation};

/// Largest number of quiz questions or flashcards one request may generate.
pub const MAX_GENERATED_ITEMS: u32 = 20;

#[derive(Clone)]
pub struct AppState {
    pub student_service: StudentService,
    pub flashcard_service: FlashcardService,
    pub gamification_service: GamificationService,
    /// `None` when no generative model is configured; endpoints serve canned content.
    pub llm_service: Option<LLMService>,
    /// `None` when no speech credentials are configured.
    pub speech_service: Option<SpeechService>,
}

#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ErrorResponse>;

fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::success(data)))
}

fn student_not_found(operation: &str, student_id: i64) -> ErrorResponse {
    log_api_warn!(operation, student_id = student_id, "student not found");
    api_error!(not_found, operation, "student", student_id)
}

fn database_failure(operation: &str, resource_type: &str, error: anyhow::Error) -> ErrorResponse {
    log_api_error!(operation, error = error, "data access failed");
    api_error!(database, operation, resource_type, error)
}

fn rejected(operation: &str, resource_type: &str, message: &str) -> ErrorResponse {
    log_validation!(failure, operation, error = message);
    api_error!(validation, operation, resource_type, message)
}

fn generation_failure(operation: &str, error: anyhow::Error) -> ErrorResponse {
    log_api_error!(operation, error = error, "content generation failed");
    api_error!(llm, operation, "content", error)
}

fn check_item_count(operation: &str, count: u32, what: &str) -> Result<(), ErrorResponse> {
    if count == 0 || count > MAX_GENERATED_ITEMS {
        let message = format!("{} must be between 1 and {}", what, MAX_GENERATED_ITEMS);
        return Err(rejected(operation, "content", &message));
    }
    Ok(())
}

// General endpoints

pub async fn root() -> Json<ApiResponse<Value>> {
    Json(ApiResponse::success(json!({ "message": "Welcome to Smart Tutor API" })))
}

pub async fn health() -> Json<ApiResponse<Value>> {
    Json(ApiResponse::success(json!({ "status": "ok" })))
}

// Generation endpoints

pub async fn greet(
    State(state): State<AppState>,
    Json(request): Json<GreetingRequest>,
) -> ApiResult<Greeting> {
    log_api_start!("greet");

    let greeting = match &state.llm_service {
        Some(llm) => llm.greet(&request).await,
        None => {
            log_llm_operation!(fallback, "greet", "no API key configured");
            llm_service::fallback_greeting(&request)
        }
    };

    ok(greeting)
}

pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> ApiResult<ChatReply> {
    log_api_start!("chat");

    let reply = match &state.llm_service {
        Some(llm) => llm.chat(&request).await,
        None => {
            log_llm_operation!(fallback, "chat", "no API key configured");
            llm_service::fallback_chat()
        }
    };

    ok(reply)
}

pub async fn lesson_plan(
    State(state): State<AppState>,
    Json(request): Json<LessonPlanRequest>,
) -> ApiResult<LessonPlan> {
    log_api_start!("lesson_plan");

    let Some(llm) = &state.llm_service else {
        log_llm_operation!(fallback, "lesson_plan", "no API key configured");
        return ok(llm_service::fallback_lesson_plan(&request));
    };

    match llm.lesson_plan(&request).await {
        Ok(plan) => {
            log_api_success!("lesson_plan", count = plan.plan.len(), "lesson plan generated");
            ok(plan)
        }
        Err(e) => Err(generation_failure("lesson_plan", e)),
    }
}

pub async fn lesson_content(
    State(state): State<AppState>,
    Json(request): Json<LessonContentRequest>,
) -> ApiResult<LessonContent> {
    log_api_start!("lesson_content");

    let Some(llm) = &state.llm_service else {
        log_llm_operation!(fallback, "lesson_content", "no API key configured");
        return ok(llm_service::fallback_lesson_content(&request));
    };

    match llm.lesson_content(&request).await {
        Ok(content) => {
            log_api_success!(
                "lesson_content",
                format!("content generated, illustrated: {}", content.image_url.is_some())
            );
            ok(content)
        }
        Err(e) => Err(generation_failure("lesson_content", e)),
    }
}

pub async fn quiz(
    State(state): State<AppState>,
    Json(request): Json<QuizRequest>,
) -> ApiResult<GeneratedQuiz> {
    log_api_start!("quiz");
    check_item_count("quiz", request.num_questions, "num_questions")?;

    let Some(llm) = &state.llm_service else {
        log_llm_operation!(fallback, "quiz", "no API key configured");
        return ok(llm_service::fallback_quiz(&request));
    };

    match llm.quiz(&request).await {
        Ok(quiz) => {
            log_api_success!("quiz", count = quiz.questions.len(), "quiz generated");
            ok(quiz)
        }
        Err(e) => Err(generation_failure("quiz", e)),
    }
}

pub async fn twi_vocab(
    State(state): State<AppState>,
    Json(request): Json<TwiVocabRequest>,
) -> ApiResult<TwiVocabulary> {
    log_api_start!("twi_vocab");

    let Some(llm) = &state.llm_service else {
        log_llm_operation!(fallback, "twi_vocab", "no API key configured");
        return ok(llm_service::fallback_twi_vocab(&request));
    };

    match llm.twi_vocab(&request).await {
        Ok(vocab) => {
            log_api_success!("twi_vocab", count = vocab.vocab.len(), "vocabulary generated");
            ok(vocab)
        }
        Err(e) => Err(generation_failure("twi_vocab", e)),
    }
}

pub async fn generate_flashcards(
    State(state): State<AppState>,
    Json(request): Json<FlashcardGenerateRequest>,
) -> ApiResult<GeneratedFlashcards> {
    log_api_start!("generate_flashcards");
    check_item_count("generate_flashcards", request.num_cards, "num_cards")?;
    if request.text.trim().is_empty() {
        return Err(rejected("generate_flashcards", "content", "Text is required"));
    }

    let Some(llm) = &state.llm_service else {
        log_llm_operation!(fallback, "generate_flashcards", "no API key configured");
        return ok(llm_service::fallback_flashcards());
    };

    match llm.flashcards(&request).await {
        Ok(cards) => {
            log_api_success!("generate_flashcards", count = cards.flashcards.len(), "flashcards generated");
            ok(cards)
        }
        Err(e) => Err(generation_failure("generate_flashcards", e)),
    }
}

pub async fn text_to_speech(
    State(state): State<AppState>,
    Json(request): Json<TtsRequest>,
) -> Result<Response, ErrorResponse> {
    log_api_start!("text_to_speech");

    let Some(speech) = &state.speech_service else {
        return Err(ApiError::ServiceUnavailable("Speech service is not configured".to_string())
            .to_response_with_context(ErrorContext::new("text_to_speech", "audio")));
    };

    let text = clean_text_for_speech(&request.text);
    if text.is_empty() {
        return Err(rejected("text_to_speech", "audio", "Text is required"));
    }

    match speech.synthesize(&text, request.voice_id.as_deref()).await {
        Ok(audio) => {
            log_api_success!("text_to_speech", count = audio.len(), "audio generated");
            Ok(([(header::CONTENT_TYPE, "audio/mpeg")], audio).into_response())
        }
        Err(e) => {
            log_api_error!("text_to_speech", error = e, "speech synthesis failed");
            Err(ApiError::InternalError(format!("Failed to generate speech: {}", e))
                .to_response_with_context(ErrorContext::new("text_to_speech", "audio")))
        }
    }
}

// Student endpoints

pub async fn list_students(State(state): State<AppState>) -> ApiResult<Vec<Student>> {
    log_api_start!("list_students");

    match state.student_service.list_students().await {
        Ok(students) => {
            log_api_success!("list_students", count = students.len(), "students listed");
            ok(students)
        }
        Err(e) => Err(database_failure("list_students", "student", e)),
    }
}

pub async fn create_student(
    State(state): State<AppState>,
    Json(mut request): Json<CreateStudentRequest>,
) -> ApiResult<Student> {
    log_api_start!("create_student");

    request.name = request.name.trim().to_string();
    if request.name.is_empty() {
        return Err(rejected("create_student", "student", "Student name is required"));
    }

    match state.student_service.get_or_create_student(&request).await {
        Ok(student) => {
            log_api_success!("create_student", student_id = student.id, "student signed in");
            ok(student)
        }
        Err(e) => Err(database_failure("create_student", "student", e)),
    }
}

pub async fn update_student(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(mut request): Json<UpdateStudentRequest>,
) -> ApiResult<Student> {
    log_api_start!("update_student", student_id = id);

    request.name = request.name.trim().to_string();
    if request.name.is_empty() {
        return Err(rejected("update_student", "student", "Student name is required"));
    }

    match state.student_service.update_student(id, &request).await {
        Ok(Some(student)) => {
            log_api_success!("update_student", student_id = id, "profile updated");
            ok(student)
        }
        Ok(None) => Err(student_not_found("update_student", id)),
        Err(e) => Err(database_failure("update_student", "student", e)),
    }
}

pub async fn delete_student(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<bool> {
    log_api_start!("delete_student", student_id = id);

    match state.student_service.delete_student(id).await {
        Ok(true) => {
            log_api_success!("delete_student", student_id = id, "student deleted");
            ok(true)
        }
        Ok(false) => Err(student_not_found("delete_student", id)),
        Err(e) => Err(database_failure("delete_student", "student", e)),
    }
}

pub async fn add_xp(
    State(state): State<AppState>,
    Json(request): Json<XpUpdateRequest>,
) -> ApiResult<XpUpdateResult> {
    log_api_start!("add_xp", student_id = request.student_id);

    match state
        .student_service
        .add_xp(request.student_id, request.xp_amount)
        .await
    {
        Ok(Some(update)) => {
            log_api_success!("add_xp", student_id = request.student_id, format!("xp now {}", update.xp));
            ok(update)
        }
        Ok(None) => Err(student_not_found("add_xp", request.student_id)),
        Err(e) => Err(database_failure("add_xp", "student", e)),
    }
}

pub async fn update_privacy(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<PrivacyUpdateRequest>,
) -> ApiResult<Value> {
    log_api_start!("update_privacy", student_id = id);

    match state.student_service.set_privacy(id, request.is_public).await {
        Ok(Some(is_public)) => {
            log_api_success!("update_privacy", student_id = id, "privacy updated");
            ok(json!({ "is_public_profile": is_public }))
        }
        Ok(None) => Err(student_not_found("update_privacy", id)),
        Err(e) => Err(database_failure("update_privacy", "student", e)),
    }
}

pub async fn leaderboard(
    State(state): State<AppState>,
    Query(params): Query<LeaderboardParams>,
) -> ApiResult<Vec<LeaderboardEntry>> {
    log_api_start!("leaderboard");

    // Only all-time XP is tracked, so `period` does not change the ranking.
    match state.student_service.leaderboard(params.limit).await {
        Ok(entries) => {
            log_api_success!("leaderboard", count = entries.len(), "leaderboard built");
            ok(entries)
        }
        Err(e) => Err(database_failure("leaderboard", "student", e)),
    }
}

// Parental controls

pub async fn verify_pin(
    State(state): State<AppState>,
    Json(request): Json<VerifyPinRequest>,
) -> ApiResult<Value> {
    log_api_start!("verify_pin");

    match state.student_service.verify_pin(&request.pin).await {
        Ok(valid) => ok(json!({ "valid": valid })),
        Err(e) => Err(database_failure("verify_pin", "setting", e)),
    }
}

pub async fn change_pin(
    State(state): State<AppState>,
    Json(request): Json<ChangePinRequest>,
) -> ApiResult<Value> {
    log_api_start!("change_pin");

    if request.new_pin.trim().is_empty() {
        return Err(rejected("change_pin", "setting", "New PIN is required"));
    }

    match state
        .student_service
        .change_pin(&request.old_pin, &request.new_pin)
        .await
    {
        Ok(true) => ok(json!({ "message": "PIN updated successfully" })),
        Ok(false) => Err(ApiError::BadRequest("Incorrect old PIN".to_string())
            .to_response_with_context(
                ErrorContext::new("change_pin", "setting").with_user_message("Incorrect old PIN"),
            )),
        Err(e) => Err(database_failure("change_pin", "setting", e)),
    }
}

// Quiz results

pub async fn create_result(
    State(state): State<AppState>,
    Json(request): Json<CreateResultRequest>,
) -> ApiResult<TestResult> {
    log_api_start!("create_result");

    if request.score < 0 || request.total_questions < 0 {
        return Err(rejected("create_result", "result", "Score and total must not be negative"));
    }
    if request.score > request.total_questions {
        return Err(rejected("create_result", "result", "Score cannot exceed total questions"));
    }

    match state.student_service.record_result(&request, Utc::now()).await {
        Ok(result) => {
            log_api_success!("create_result", format!("result {} saved", result.id));
            ok(result)
        }
        Err(e) => Err(database_failure("create_result", "result", e)),
    }
}

pub async fn list_results(State(state): State<AppState>) -> ApiResult<Vec<TestResult>> {
    log_api_start!("list_results");

    match state.student_service.all_results().await {
        Ok(results) => {
            log_api_success!("list_results", count = results.len(), "results listed");
            ok(results)
        }
        Err(e) => Err(database_failure("list_results", "result", e)),
    }
}

pub async fn student_results(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Vec<TestResult>> {
    log_api_start!("student_results", student_id = id);

    match state.student_service.student_results(id).await {
        Ok(Some(results)) => {
            log_api_success!("student_results", count = results.len(), "results listed");
            ok(results)
        }
        Ok(None) => Err(student_not_found("student_results", id)),
        Err(e) => Err(database_failure("student_results", "result", e)),
    }
}

pub async fn review_recommendations(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Vec<ReviewRecommendation>> {
    log_api_start!("review_recommendations", student_id = id);

    match state.student_service.review_recommendations(id).await {
        Ok(Some(recommendations)) => {
            log_api_success!("review_recommendations", count = recommendations.len(), "weak topics found");
            ok(recommendations)
        }
        Ok(None) => Err(student_not_found("review_recommendations", id)),
        Err(e) => Err(database_failure("review_recommendations", "result", e)),
    }
}

// Lesson logs and saved quizzes

pub async fn create_lesson_log(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<CreateLessonLogRequest>,
) -> ApiResult<LessonLog> {
    log_api_start!("create_lesson_log", student_id = id);

    match state.student_service.log_lesson(id, &request, Utc::now()).await {
        Ok(Some(log)) => {
            log_api_success!("create_lesson_log", student_id = id, "lesson logged");
            ok(log)
        }
        Ok(None) => Err(student_not_found("create_lesson_log", id)),
        Err(e) => Err(database_failure("create_lesson_log", "lesson log", e)),
    }
}

pub async fn lesson_logs(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Vec<LessonLog>> {
    log_api_start!("lesson_logs", student_id = id);

    match state.student_service.lesson_logs(id).await {
        Ok(Some(logs)) => {
            log_api_success!("lesson_logs", count = logs.len(), "lesson logs listed");
            ok(logs)
        }
        Ok(None) => Err(student_not_found("lesson_logs", id)),
        Err(e) => Err(database_failure("lesson_logs", "lesson log", e)),
    }
}

pub async fn create_saved_quiz(
    State(state): State<AppState>,
    Json(request): Json<CreateSavedQuizRequest>,
) -> ApiResult<SavedQuiz> {
    log_api_start!("create_saved_quiz", student_id = request.student_id);

    match state.student_service.save_quiz(&request, Utc::now()).await {
        Ok(Some(quiz)) => {
            log_api_success!("create_saved_quiz", student_id = request.student_id, "quiz saved");
            ok(quiz)
        }
        Ok(None) => Err(student_not_found("create_saved_quiz", request.student_id)),
        Err(e) => Err(database_failure("create_saved_quiz", "saved quiz", e)),
    }
}

pub async fn saved_quizzes(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Vec<SavedQuiz>> {
    log_api_start!("saved_quizzes", student_id = id);

    match state.student_service.saved_quizzes(id).await {
        Ok(Some(quizzes)) => {
            log_api_success!("saved_quizzes", count = quizzes.len(), "saved quizzes listed");
            ok(quizzes)
        }
        Ok(None) => Err(student_not_found("saved_quizzes", id)),
        Err(e) => Err(database_failure("saved_quizzes", "saved quiz", e)),
    }
}

pub async fn delete_saved_quiz(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<bool> {
    log_api_start!("delete_saved_quiz");

    match state.student_service.delete_saved_quiz(id).await {
        Ok(true) => ok(true),
        Ok(false) => Err(api_error!(not_found, "delete_saved_quiz", "saved quiz", id)),
        Err(e) => Err(database_failure("delete_saved_quiz", "saved quiz", e)),
    }
}

// Flashcards

pub async fn create_flashcard(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<CreateFlashcardRequest>,
) -> ApiResult<Flashcard> {
    log_api_start!("create_flashcard", student_id = id);

    if request.front.trim().is_empty() || request.back.trim().is_empty() {
        return Err(rejected("create_flashcard", "flashcard", "Both sides of the card are required"));
    }

    match state
        .flashcard_service
        .create_flashcard(id, &request, Utc::now())
        .await
    {
        Ok(Some(card)) => {
            log_api_success!("create_flashcard", flashcard_id = card.id, "flashcard created");
            ok(card)
        }
        Ok(None) => Err(student_not_found("create_flashcard", id)),
        Err(e) => Err(database_failure("create_flashcard", "flashcard", e)),
    }
}

pub async fn student_flashcards(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Vec<Flashcard>> {
    log_api_start!("student_flashcards", student_id = id);

    match state.flashcard_service.student_flashcards(id).await {
        Ok(Some(cards)) => {
            log_api_success!("student_flashcards", count = cards.len(), "flashcards listed");
            ok(cards)
        }
        Ok(None) => Err(student_not_found("student_flashcards", id)),
        Err(e) => Err(database_failure("student_flashcards", "flashcard", e)),
    }
}

pub async fn due_flashcards(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Vec<Flashcard>> {
    log_api_start!("due_flashcards", student_id = id);

    match state.flashcard_service.due_flashcards(id, Utc::now()).await {
        Ok(Some(cards)) => {
            log_api_success!("due_flashcards", count = cards.len(), "due flashcards listed");
            ok(cards)
        }
        Ok(None) => Err(student_not_found("due_flashcards", id)),
        Err(e) => Err(database_failure("due_flashcards", "flashcard", e)),
    }
}

pub async fn review_flashcard(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<ReviewFlashcardRequest>,
) -> ApiResult<FlashcardReviewResult> {
    log_api_start!("review_flashcard", flashcard_id = id);

    let rating = ReviewRating::parse(&request.rating)
        .map_err(|e| rejected("review_flashcard", "flashcard", &e.to_string()))?;

    match state
        .flashcard_service
        .review_flashcard(id, rating, Utc::now())
        .await
    {
        Ok(Some(review)) => {
            log_api_success!("review_flashcard", flashcard_id = id, format!("next review in {} days", review.interval));
            ok(review)
        }
        Ok(None) => Err(api_error!(not_found, "review_flashcard", "flashcard", id)),
        Err(e) => Err(database_failure("review_flashcard", "flashcard", e)),
    }
}

pub async fn delete_flashcard(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<bool> {
    log_api_start!("delete_flashcard", flashcard_id = id);

    match state.flashcard_service.delete_flashcard(id).await {
        Ok(true) => {
            log_api_success!("delete_flashcard", flashcard_id = id, "flashcard deleted");
            ok(true)
        }
        Ok(false) => Err(api_error!(not_found, "delete_flashcard", "flashcard", id)),
        Err(e) => Err(database_failure("delete_flashcard", "flashcard", e)),
    }
}

// Badges and streaks

pub async fn list_badges(State(state): State<AppState>) -> ApiResult<Vec<Badge>> {
    log_api_start!("list_badges");

    match state.gamification_service.all_badges().await {
        Ok(badges) => ok(badges),
        Err(e) => Err(database_failure("list_badges", "badge", e)),
    }
}

pub async fn student_badges(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Vec<StudentBadgeView>> {
    log_api_start!("student_badges", student_id = id);

    match state.gamification_service.student_badges(id).await {
        Ok(Some(badges)) => ok(badges),
        Ok(None) => Err(student_not_found("student_badges", id)),
        Err(e) => Err(database_failure("student_badges", "badge", e)),
    }
}

pub async fn check_badges(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<BadgesAwarded> {
    log_api_start!("check_badges", student_id = id);

    match state.gamification_service.check_badges(id, Utc::now()).await {
        Ok(Some(new_badges)) => {
            log_api_success!("check_badges", student_id = id, format!("{} new badges", new_badges.len()));
            ok(BadgesAwarded { new_badges })
        }
        Ok(None) => Err(student_not_found("check_badges", id)),
        Err(e) => Err(database_failure("check_badges", "badge", e)),
    }
}

pub async fn acknowledge_badge(
    State(state): State<AppState>,
    Path((id, badge_id)): Path<(i64, i64)>,
) -> ApiResult<bool> {
    log_api_start!("acknowledge_badge", student_id = id);

    match state.gamification_service.acknowledge_badge(id, badge_id).await {
        Ok(true) => ok(true),
        Ok(false) => Err(api_error!(not_found, "acknowledge_badge", "badge", badge_id)),
        Err(e) => Err(database_failure("acknowledge_badge", "badge", e)),
    }
}

pub async fn student_streak(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StreakView> {
    log_api_start!("student_streak", student_id = id);

    match state.gamification_service.streak(id).await {
        Ok(Some(streak)) => ok(streak),
        Ok(None) => Err(student_not_found("student_streak", id)),
        Err(e) => Err(database_failure("student_streak", "streak", e)),
    }
}

pub async fn log_activity(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<ActivityOutcome> {
    log_api_start!("log_activity", student_id = id);

    let now = Utc::now();
    match state
        .gamification_service
        .log_activity(id, now.date_naive(), now)
        .await
    {
        Ok(Some(outcome)) => {
            log_api_success!(
                "log_activity",
                student_id = id,
                format!("streak {} ({} new badges)", outcome.current_streak, outcome.new_badges.len())
            );
            ok(outcome)
        }
        Ok(None) => Err(student_not_found("log_activity", id)),
        Err(e) => Err(database_failure("log_activity", "streak", e)),
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        // Generation routes
        .route("/api/greet", post(greet))
        .route("/api/chat", post(chat))
        .route("/api/lesson/plan", post(lesson_plan))
        .route("/api/lesson/content", post(lesson_content))
        .route("/api/quiz", post(quiz))
        .route("/api/twi/vocab", post(twi_vocab))
        .route("/api/flashcards/generate", post(generate_flashcards))
        .route("/api/tts", post(text_to_speech))
        // Student routes
        .route("/api/students", get(list_students).post(create_student))
        .route("/api/students/xp", post(add_xp))
        .route("/api/students/:id", put(update_student).delete(delete_student))
        .route("/api/students/:id/privacy", put(update_privacy))
        .route("/api/leaderboard", get(leaderboard))
        // Parental controls
        .route("/api/admin/verify-pin", post(verify_pin))
        .route("/api/admin/change-pin", post(change_pin))
        // Results
        .route("/api/results", get(list_results).post(create_result))
        .route("/api/students/:id/results", get(student_results))
        .route("/api/review/recommendations/:id", get(review_recommendations))
        // Lesson logs and saved quizzes
        .route("/api/students/:id/lesson-log", post(create_lesson_log))
        .route("/api/students/:id/lesson-logs", get(lesson_logs))
        .route("/api/saved-quizzes", post(create_saved_quiz))
        .route("/api/saved-quizzes/:id", delete(delete_saved_quiz))
        .route("/api/students/:id/saved-quizzes", get(saved_quizzes))
        // Flashcards
        .route("/api/students/:id/flashcards", get(student_flashcards).post(create_flashcard))
        .route("/api/students/:id/flashcards/due", get(due_flashcards))
        .route("/api/flashcards/:id/review", post(review_flashcard))
        .route("/api/flashcards/:id", delete(delete_flashcard))
        // Badges and streaks
        .route("/api/badges", get(list_badges))
        .route("/api/students/:id/badges", get(student_badges))
        .route("/api/students/:id/check-badges", post(check_badges))
        .route("/api/students/:id/badges/:badge_id/acknowledge", post(acknowledge_badge))
        .route("/api/students/:id/streak", get(student_streak))
        .route("/api/students/:id/activity", post(log_activity))
        .with_state(state)
}
