use chrono::{Duration, NaiveDate, TimeZone, Utc};
use futures_util::future::join_all;
use smart_tutor::{
    CreateFlashcardRequest, CreateLessonLogRequest, CreateResultRequest, CreateStudentRequest,
    Database, FlashcardService, GamificationService, ReviewRating, StudentService,
};
use smart_tutor::scheduler::MAX_INTERVAL_DAYS;

async fn services() -> (StudentService, FlashcardService, GamificationService) {
    let db = Database::new("sqlite::memory:").await.unwrap();
    (
        StudentService::new(db.clone()),
        FlashcardService::new(db.clone()),
        GamificationService::new(db),
    )
}

async fn new_student(students: &StudentService, name: &str) -> i64 {
    students
        .get_or_create_student(&CreateStudentRequest {
            name: name.to_string(),
            grade: 3,
            avatar: "🎓".to_string(),
        })
        .await
        .unwrap()
        .id
}

fn result_request(student_id: i64, subject: &str, topic: &str, score: i64, total: i64) -> CreateResultRequest {
    CreateResultRequest {
        student_id: Some(student_id),
        student_name: "Ama".to_string(),
        grade: 3,
        subject: subject.to_string(),
        topic: topic.to_string(),
        score,
        total_questions: total,
    }
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
}

#[tokio::test]
async fn test_xp_level_thresholds() {
    let (students, _, _) = services().await;
    let id = new_student(&students, "Ama").await;

    let update = students.add_xp(id, 100).await.unwrap().unwrap();
    assert_eq!((update.xp, update.level, update.leveled_up), (100, 1, false));

    let update = students.add_xp(id, 1).await.unwrap().unwrap();
    assert_eq!((update.xp, update.level, update.leveled_up), (101, 2, true));

    let update = students.add_xp(id, 900).await.unwrap().unwrap();
    assert_eq!((update.xp, update.level, update.leveled_up), (1001, 5, true));

    let student = students.get_student(id).await.unwrap().unwrap();
    assert_eq!(student.xp, 1001);
    assert_eq!(student.level, 5);

    assert!(students.add_xp(999, 10).await.unwrap().is_none());
}

#[tokio::test]
async fn test_xp_total_saturates() {
    let (students, _, _) = services().await;
    let id = new_student(&students, "Kofi").await;

    students.add_xp(id, i64::MAX).await.unwrap().unwrap();
    let update = students.add_xp(id, 1).await.unwrap().unwrap();
    assert_eq!((update.xp, update.level), (i64::MAX, 5));

    let student = students.get_student(id).await.unwrap().unwrap();
    assert_eq!(student.xp, i64::MAX);
}

#[tokio::test]
async fn test_streak_progression() {
    let (students, _, gamification) = services().await;
    let id = new_student(&students, "Ama").await;
    let now = Utc::now();

    let outcome = gamification.log_activity(id, day(1), now).await.unwrap().unwrap();
    assert_eq!(outcome.current_streak, 1);
    assert!(!outcome.already_logged);

    let outcome = gamification.log_activity(id, day(2), now).await.unwrap().unwrap();
    assert_eq!(outcome.current_streak, 2);
    assert_eq!(outcome.longest_streak, 2);

    // Same day again changes nothing
    let outcome = gamification.log_activity(id, day(2), now).await.unwrap().unwrap();
    assert_eq!(outcome.current_streak, 2);
    assert!(outcome.already_logged);

    // Missing a day restarts the streak but keeps the record
    let outcome = gamification.log_activity(id, day(5), now).await.unwrap().unwrap();
    assert_eq!(outcome.current_streak, 1);
    assert_eq!(outcome.longest_streak, 2);

    let streak = gamification.streak(id).await.unwrap().unwrap();
    assert_eq!(streak.current_streak, 1);
    assert_eq!(streak.last_activity, Some(day(5)));
}

#[tokio::test]
async fn test_seven_day_streak_grants_freeze_and_badge() {
    let (students, _, gamification) = services().await;
    let id = new_student(&students, "Ama").await;
    let now = Utc::now();

    let mut last = None;
    for d in 1..=7 {
        last = gamification.log_activity(id, day(d), now).await.unwrap();
    }
    let outcome = last.unwrap();
    assert_eq!(outcome.current_streak, 7);
    assert!(outcome.freeze_available);
    assert!(outcome.new_badges.iter().any(|b| b.name == "Streak Master"));

    // A gap clears the freeze; it is never spent to bridge one
    let outcome = gamification.log_activity(id, day(10), now).await.unwrap().unwrap();
    assert_eq!(outcome.current_streak, 1);
    assert_eq!(outcome.longest_streak, 7);
    assert!(!outcome.freeze_available);
}

#[tokio::test]
async fn test_lesson_count_badge_threshold() {
    let (students, _, gamification) = services().await;
    let id = new_student(&students, "Ama").await;
    let noon = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();

    for i in 0..24 {
        let request = result_request(id, "Math", &format!("Topic {}", i), 3, 5);
        students.record_result(&request, noon + Duration::minutes(i)).await.unwrap();
    }

    let awarded = gamification.check_badges(id, noon).await.unwrap().unwrap();
    let names: Vec<&str> = awarded.iter().map(|b| b.name.as_str()).collect();
    assert!(names.contains(&"First Steps"));
    assert!(!names.contains(&"Dedicated Learner"));

    let request = result_request(id, "Math", "Topic 24", 3, 5);
    students.record_result(&request, noon + Duration::minutes(24)).await.unwrap();

    let awarded = gamification.check_badges(id, noon).await.unwrap().unwrap();
    let names: Vec<&str> = awarded.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(names, vec!["Dedicated Learner"]);
}

#[tokio::test]
async fn test_time_of_day_badges() {
    let (students, _, gamification) = services().await;
    let id = new_student(&students, "Ama").await;

    let early = Utc.with_ymd_and_hms(2024, 3, 1, 7, 30, 0).unwrap();
    students
        .record_result(&result_request(id, "Science", "Plants", 2, 5), early)
        .await
        .unwrap();

    let awarded = gamification.check_badges(id, early).await.unwrap().unwrap();
    assert!(awarded.iter().any(|b| b.name == "Early Bird"));
    assert!(!awarded.iter().any(|b| b.name == "Night Owl"));

    let late = Utc.with_ymd_and_hms(2024, 3, 1, 21, 0, 0).unwrap();
    students
        .record_result(&result_request(id, "Science", "Stars", 2, 5), late)
        .await
        .unwrap();

    let awarded = gamification.check_badges(id, late).await.unwrap().unwrap();
    assert!(awarded.iter().any(|b| b.name == "Night Owl"));
    // Durations are not tracked
    assert!(!awarded.iter().any(|b| b.name == "Speed Demon"));
}

#[tokio::test]
async fn test_badge_views_are_per_student() {
    let (students, _, gamification) = services().await;
    let now = Utc::now();

    let mut ids = Vec::new();
    for (name, score) in [("Ama", 5), ("Kofi", 2), ("Esi", 0)] {
        let id = new_student(&students, name).await;
        if score > 0 {
            students
                .record_result(&result_request(id, "Math", "Sums", score, 5), now)
                .await
                .unwrap();
            gamification.check_badges(id, now).await.unwrap();
        }
        ids.push(id);
    }

    let views = join_all(ids.iter().map(|id| gamification.student_badges(*id))).await;
    let earned: Vec<Vec<String>> = views
        .into_iter()
        .map(|view| {
            view.unwrap()
                .unwrap()
                .into_iter()
                .filter(|b| b.earned)
                .map(|b| b.name)
                .collect()
        })
        .collect();

    assert!(earned[0].contains(&"Quiz Ace".to_string()));
    assert!(earned[1].contains(&"First Steps".to_string()));
    assert!(!earned[1].contains(&"Quiz Ace".to_string()));
    assert!(earned[2].is_empty());
}

#[tokio::test]
async fn test_due_flashcards_follow_reviews() {
    let (students, flashcards, _) = services().await;
    let id = new_student(&students, "Ama").await;
    let now = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();

    let request = CreateFlashcardRequest {
        topic: "Capitals".to_string(),
        front: "Capital of Ghana?".to_string(),
        back: "Accra".to_string(),
    };
    let easy = flashcards.create_flashcard(id, &request, now).await.unwrap().unwrap();
    let hard = flashcards.create_flashcard(id, &request, now).await.unwrap().unwrap();

    let due = flashcards.due_flashcards(id, now).await.unwrap().unwrap();
    assert_eq!(due.len(), 2);

    let review = flashcards
        .review_flashcard(easy.id, ReviewRating::Easy, now)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(review.interval, 1);
    assert_eq!(review.next_review, now + Duration::days(1));

    let review = flashcards
        .review_flashcard(hard.id, ReviewRating::Hard, now)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(review.interval, 0);
    assert!((review.ease_factor - 2.3).abs() < 1e-9);

    let due = flashcards.due_flashcards(id, now).await.unwrap().unwrap();
    assert_eq!(due.iter().map(|c| c.id).collect::<Vec<_>>(), vec![hard.id]);

    let tomorrow = now + Duration::days(1);
    let due = flashcards.due_flashcards(id, tomorrow).await.unwrap().unwrap();
    assert_eq!(due.len(), 2);

    let stored = flashcards.get_flashcard(easy.id).await.unwrap().unwrap();
    assert_eq!(stored.review_count, 1);
    assert!((stored.ease_factor - 2.6).abs() < 1e-9);
}

#[tokio::test]
async fn test_long_easy_streak_keeps_card_readable() {
    let (students, flashcards, _) = services().await;
    let id = new_student(&students, "Ama").await;
    let now = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();

    let request = CreateFlashcardRequest {
        topic: "Capitals".to_string(),
        front: "Capital of Ghana?".to_string(),
        back: "Accra".to_string(),
    };
    let card = flashcards.create_flashcard(id, &request, now).await.unwrap().unwrap();

    for _ in 0..40 {
        flashcards
            .review_flashcard(card.id, ReviewRating::Easy, now)
            .await
            .unwrap()
            .unwrap();
    }

    let stored = flashcards.student_flashcards(id).await.unwrap().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].interval, MAX_INTERVAL_DAYS);
    assert_eq!(stored[0].review_count, 40);
    assert_eq!(stored[0].next_review, now + Duration::days(MAX_INTERVAL_DAYS));

    assert!(flashcards.due_flashcards(id, now).await.unwrap().unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_student_cascades() {
    let (students, flashcards, gamification) = services().await;
    let id = new_student(&students, "Ama").await;
    let other = new_student(&students, "Kofi").await;
    let now = Utc::now();

    students
        .record_result(&result_request(id, "Math", "Sums", 5, 5), now)
        .await
        .unwrap();
    students
        .record_result(&result_request(other, "Math", "Sums", 1, 5), now)
        .await
        .unwrap();
    let card = flashcards
        .create_flashcard(
            id,
            &CreateFlashcardRequest {
                topic: "Capitals".to_string(),
                front: "Q".to_string(),
                back: "A".to_string(),
            },
            now,
        )
        .await
        .unwrap()
        .unwrap();
    students
        .log_lesson(
            id,
            &CreateLessonLogRequest {
                subject: "Science".to_string(),
                topic: "Volcanoes".to_string(),
                content: "Lava".to_string(),
            },
            now,
        )
        .await
        .unwrap();
    gamification.log_activity(id, now.date_naive(), now).await.unwrap();

    assert!(students.delete_student(id).await.unwrap());
    assert!(!students.delete_student(id).await.unwrap());

    assert!(flashcards.get_flashcard(card.id).await.unwrap().is_none());
    assert!(students.lesson_logs(id).await.unwrap().is_none());
    assert!(gamification.streak(id).await.unwrap().is_none());

    let remaining = students.all_results().await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].student_id, Some(other));
}

#[tokio::test]
async fn test_recommendations_use_latest_attempt() {
    let (students, _, _) = services().await;
    let id = new_student(&students, "Ama").await;
    let start = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();

    students
        .record_result(&result_request(id, "Math", "Fractions", 1, 5), start)
        .await
        .unwrap();
    students
        .record_result(&result_request(id, "Math", "Fractions", 5, 5), start + Duration::hours(1))
        .await
        .unwrap();
    students
        .record_result(&result_request(id, "Science", "Plants", 4, 5), start)
        .await
        .unwrap();
    students
        .record_result(&result_request(id, "Science", "Plants", 2, 5), start + Duration::hours(2))
        .await
        .unwrap();
    students
        .record_result(&result_request(id, "English", "Verbs", 0, 0), start + Duration::hours(3))
        .await
        .unwrap();

    let weak = students.review_recommendations(id).await.unwrap().unwrap();
    let topics: Vec<(&str, i64)> = weak.iter().map(|w| (w.topic.as_str(), w.last_score)).collect();
    assert_eq!(topics, vec![("Verbs", 0), ("Plants", 40)]);
}

#[tokio::test]
async fn test_parent_pin_persists() {
    let (students, _, _) = services().await;

    assert!(students.verify_pin("1234").await.unwrap());
    assert!(!students.change_pin("9999", "4321").await.unwrap());
    assert!(students.change_pin("1234", "4321").await.unwrap());
    assert!(students.verify_pin("4321").await.unwrap());
    assert!(!students.verify_pin("1234").await.unwrap());
}
