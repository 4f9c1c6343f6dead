use anyhow::Result;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::database::{Database, DEFAULT_PARENT_PIN, PARENT_PIN_KEY};
use crate::gamification::apply_xp;
use crate::models::*;

use crate::{log_service_success, log_service_warn};

/// Topics scoring below this fraction on their latest attempt need review.
pub const WEAK_AREA_THRESHOLD: f64 = 0.6;

pub const DEFAULT_LEADERBOARD_LIMIT: i64 = 10;

/// Profiles, progress, results and per-student content.
#[derive(Clone)]
pub struct StudentService {
    db: Database,
}

impl StudentService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    // Profiles

    /// Login by name: returns the existing profile or creates one.
    pub async fn get_or_create_student(&self, request: &CreateStudentRequest) -> Result<Student> {
        if let Some(student) = self.db.get_student_by_name(&request.name).await? {
            return Ok(student);
        }

        let student = self
            .db
            .create_student(&request.name, request.grade, &request.avatar)
            .await?;
        log_service_success!("student_service", "create_student", student_id = student.id, "new profile created");
        Ok(student)
    }

    pub async fn list_students(&self) -> Result<Vec<Student>> {
        self.db.get_all_students().await
    }

    pub async fn get_student(&self, id: i64) -> Result<Option<Student>> {
        self.db.get_student(id).await
    }

    pub async fn student_exists(&self, id: i64) -> Result<bool> {
        self.db.student_exists(id).await
    }

    pub async fn update_student(
        &self,
        id: i64,
        request: &UpdateStudentRequest,
    ) -> Result<Option<Student>> {
        let Some(mut student) = self.db.get_student(id).await? else {
            return Ok(None);
        };

        student.name = request.name.clone();
        student.grade = request.grade;
        student.avatar = request.avatar.clone();
        student.is_public_profile = request.is_public;

        self.db.update_student_profile(&student).await?;
        Ok(Some(student))
    }

    pub async fn delete_student(&self, id: i64) -> Result<bool> {
        let deleted = self.db.delete_student(id).await?;
        if deleted {
            log_service_success!("student_service", "delete_student", student_id = id, "student and owned records removed");
        }
        Ok(deleted)
    }

    pub async fn add_xp(&self, student_id: i64, amount: i64) -> Result<Option<XpUpdateResult>> {
        let Some(student) = self.db.get_student(student_id).await? else {
            return Ok(None);
        };

        let update = apply_xp(student.xp, student.level, amount);
        self.db
            .update_student_progress(student_id, update.xp, update.level)
            .await?;

        if update.leveled_up {
            log_service_success!(
                "student_service",
                "add_xp",
                student_id = student_id,
                format!("reached level {}", update.level)
            );
        }

        Ok(Some(update))
    }

    /// Returns the stored flag, or `None` for an unknown student.
    pub async fn set_privacy(&self, student_id: i64, is_public: bool) -> Result<Option<bool>> {
        let updated = self.db.set_student_privacy(student_id, is_public).await?;
        Ok(updated.then_some(is_public))
    }

    pub async fn leaderboard(&self, limit: Option<i64>) -> Result<Vec<LeaderboardEntry>> {
        let limit = limit.unwrap_or(DEFAULT_LEADERBOARD_LIMIT).max(0);
        let students = self.db.get_students_by_xp(limit).await?;
        Ok(rank_students(&students))
    }

    // Parental PIN

    pub async fn verify_pin(&self, pin: &str) -> Result<bool> {
        Ok(self.current_pin().await? == pin)
    }

    /// Returns false when `old_pin` does not match the stored PIN.
    pub async fn change_pin(&self, old_pin: &str, new_pin: &str) -> Result<bool> {
        if self.current_pin().await? != old_pin {
            log_service_warn!("student_service", "change_pin", "incorrect old PIN");
            return Ok(false);
        }

        self.db.set_setting(PARENT_PIN_KEY, new_pin).await?;
        log_service_success!("student_service", "change_pin", "parent PIN updated");
        Ok(true)
    }

    async fn current_pin(&self) -> Result<String> {
        Ok(self
            .db
            .get_setting(PARENT_PIN_KEY)
            .await?
            .unwrap_or_else(|| DEFAULT_PARENT_PIN.to_string()))
    }

    // Quiz results

    pub async fn record_result(
        &self,
        request: &CreateResultRequest,
        now: DateTime<Utc>,
    ) -> Result<TestResult> {
        self.db.create_test_result(request, now).await
    }

    pub async fn all_results(&self) -> Result<Vec<TestResult>> {
        self.db.get_all_test_results().await
    }

    pub async fn student_results(&self, student_id: i64) -> Result<Option<Vec<TestResult>>> {
        if !self.db.student_exists(student_id).await? {
            return Ok(None);
        }
        Ok(Some(self.db.get_student_test_results(student_id).await?))
    }

    pub async fn review_recommendations(
        &self,
        student_id: i64,
    ) -> Result<Option<Vec<ReviewRecommendation>>> {
        if !self.db.student_exists(student_id).await? {
            return Ok(None);
        }
        let results = self.db.get_student_test_results(student_id).await?;
        Ok(Some(weak_topics(&results)))
    }

    // Lesson logs

    pub async fn log_lesson(
        &self,
        student_id: i64,
        request: &CreateLessonLogRequest,
        now: DateTime<Utc>,
    ) -> Result<Option<LessonLog>> {
        if !self.db.student_exists(student_id).await? {
            return Ok(None);
        }
        Ok(Some(self.db.create_lesson_log(student_id, request, now).await?))
    }

    pub async fn lesson_logs(&self, student_id: i64) -> Result<Option<Vec<LessonLog>>> {
        if !self.db.student_exists(student_id).await? {
            return Ok(None);
        }
        Ok(Some(self.db.get_lesson_logs(student_id).await?))
    }

    // Saved quizzes

    pub async fn save_quiz(
        &self,
        request: &CreateSavedQuizRequest,
        now: DateTime<Utc>,
    ) -> Result<Option<SavedQuiz>> {
        if !self.db.student_exists(request.student_id).await? {
            return Ok(None);
        }
        Ok(Some(self.db.create_saved_quiz(request, now).await?))
    }

    pub async fn saved_quizzes(&self, student_id: i64) -> Result<Option<Vec<SavedQuiz>>> {
        if !self.db.student_exists(student_id).await? {
            return Ok(None);
        }
        Ok(Some(self.db.get_saved_quizzes(student_id).await?))
    }

    pub async fn delete_saved_quiz(&self, quiz_id: i64) -> Result<bool> {
        self.db.delete_saved_quiz(quiz_id).await
    }
}

/// Number students in the given order, masking private profiles.
pub fn rank_students(students: &[Student]) -> Vec<LeaderboardEntry> {
    students
        .iter()
        .enumerate()
        .map(|(index, student)| {
            let (name, avatar) = if student.is_public_profile {
                (student.name.clone(), student.avatar.clone())
            } else {
                (format!("Student #{}", student.id), PRIVATE_AVATAR.to_string())
            };

            LeaderboardEntry {
                rank: index + 1,
                id: student.id,
                name,
                xp: student.xp,
                level: student.level,
                avatar,
                is_public: student.is_public_profile,
            }
        })
        .collect()
}

/// Topics whose most recent result scored below the weak-area threshold,
/// most recently attempted first.
pub fn weak_topics(results: &[TestResult]) -> Vec<ReviewRecommendation> {
    let mut latest: HashMap<&str, &TestResult> = HashMap::new();

    for result in results {
        latest
            .entry(result.topic.as_str())
            .and_modify(|current| {
                if (result.timestamp, result.id) > (current.timestamp, current.id) {
                    *current = result;
                }
            })
            .or_insert(result);
    }

    let mut weak: Vec<&TestResult> = latest
        .into_values()
        .filter(|result| result.percentage() < WEAK_AREA_THRESHOLD)
        .collect();
    weak.sort_by(|a, b| (b.timestamp, b.id).cmp(&(a.timestamp, a.id)));

    weak.into_iter()
        .map(|result| ReviewRecommendation {
            subject: result.subject.clone(),
            topic: result.topic.clone(),
            last_score: (result.percentage() * 100.0).trunc() as i64,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn result(id: i64, topic: &str, score: i64, total: i64, minutes: i64) -> TestResult {
        let base = Utc.with_ymd_and_hms(2024, 3, 1, 15, 0, 0).unwrap();
        TestResult {
            id,
            student_id: Some(1),
            student_name: "Ama".to_string(),
            grade: 3,
            subject: "Math".to_string(),
            topic: topic.to_string(),
            score,
            total_questions: total,
            timestamp: base + Duration::minutes(minutes),
        }
    }

    fn student(id: i64, xp: i64, is_public: bool) -> Student {
        Student {
            id,
            name: format!("Kid {}", id),
            grade: 2,
            avatar: "🦁".to_string(),
            xp,
            level: 1,
            is_public_profile: is_public,
        }
    }

    #[test]
    fn test_latest_result_decides() {
        // Inserted out of order: the passing attempt is the newest.
        let results = vec![
            result(2, "Fractions", 4, 5, 30),
            result(1, "Fractions", 1, 5, 10),
        ];
        assert!(weak_topics(&results).is_empty());

        let results = vec![
            result(1, "Fractions", 5, 5, 10),
            result(2, "Fractions", 2, 5, 30),
        ];
        let recommendations = weak_topics(&results);
        assert_eq!(recommendations.len(), 1);
        assert_eq!(recommendations[0].last_score, 40);
    }

    #[test]
    fn test_threshold_and_truncation() {
        let results = vec![
            result(1, "Exactly Sixty", 3, 5, 0),
            result(2, "Two Thirds Fail", 1, 3, 1),
            result(3, "Empty Quiz", 0, 0, 2),
        ];
        let recommendations = weak_topics(&results);

        let topics: Vec<&str> = recommendations.iter().map(|r| r.topic.as_str()).collect();
        assert_eq!(topics, vec!["Empty Quiz", "Two Thirds Fail"]);
        assert_eq!(recommendations[1].last_score, 33);
        assert_eq!(recommendations[0].last_score, 0);
    }

    #[test]
    fn test_same_timestamp_uses_id() {
        let results = vec![
            result(7, "Shapes", 5, 5, 0),
            result(8, "Shapes", 0, 5, 0),
        ];
        assert_eq!(weak_topics(&results).len(), 1);
    }

    #[test]
    fn test_rank_students_masks_private_profiles() {
        let entries = rank_students(&[student(3, 500, true), student(9, 200, false)]);

        assert_eq!(entries[0].rank, 1);
        assert_eq!(entries[0].name, "Kid 3");
        assert_eq!(entries[0].avatar, "🦁");

        assert_eq!(entries[1].rank, 2);
        assert_eq!(entries[1].name, "Student #9");
        assert_eq!(entries[1].avatar, PRIVATE_AVATAR);
        assert!(!entries[1].is_public);
    }
}
