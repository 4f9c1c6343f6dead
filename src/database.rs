use anyhow::Result;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;

use crate::gamification::default_badges;
use crate::models::*;

use crate::log_db_operation;

pub const PARENT_PIN_KEY: &str = "parent_pin";
pub const DEFAULT_PARENT_PIN: &str = "1234";

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

/// Fixed-width UTC timestamps so that text ordering matches time ordering.
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value)?.with_timezone(&Utc))
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    Ok(NaiveDate::parse_from_str(value, "%Y-%m-%d")?)
}

impl Database {
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePool::connect_with(options).await?;
        let db = Database { pool };
        db.migrate().await?;
        db.seed().await?;
        Ok(db)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS students (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                grade INTEGER NOT NULL,
                avatar TEXT NOT NULL DEFAULT '🎓',
                xp INTEGER NOT NULL DEFAULT 0,
                level INTEGER NOT NULL DEFAULT 1,
                is_public_profile INTEGER NOT NULL DEFAULT 0
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        // student_id is nullable and unconstrained: results may be logged by name only.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS test_results (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                student_id INTEGER,
                student_name TEXT NOT NULL,
                grade INTEGER NOT NULL,
                subject TEXT NOT NULL,
                topic TEXT NOT NULL,
                score INTEGER NOT NULL,
                total_questions INTEGER NOT NULL,
                timestamp TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_test_results_student ON test_results (student_id);",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS flashcards (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                student_id INTEGER NOT NULL,
                topic TEXT NOT NULL,
                front TEXT NOT NULL,
                back TEXT NOT NULL,
                ease_factor REAL NOT NULL DEFAULT 2.5,
                interval INTEGER NOT NULL DEFAULT 0,
                next_review TEXT NOT NULL,
                review_count INTEGER NOT NULL DEFAULT 0,
                FOREIGN KEY (student_id) REFERENCES students(id) ON DELETE CASCADE
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS lesson_logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                student_id INTEGER NOT NULL,
                subject TEXT NOT NULL,
                topic TEXT NOT NULL,
                content TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                FOREIGN KEY (student_id) REFERENCES students(id) ON DELETE CASCADE
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS saved_quizzes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                student_id INTEGER NOT NULL,
                subject TEXT NOT NULL,
                topic TEXT NOT NULL,
                questions TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (student_id) REFERENCES students(id) ON DELETE CASCADE
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS badges (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                description TEXT NOT NULL,
                icon TEXT NOT NULL,
                criteria_type TEXT NOT NULL,
                criteria_value INTEGER NOT NULL,
                tier TEXT NOT NULL DEFAULT 'bronze'
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS student_badges (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                student_id INTEGER NOT NULL,
                badge_id INTEGER NOT NULL,
                earned_at TEXT NOT NULL,
                is_new INTEGER NOT NULL DEFAULT 1,
                UNIQUE (student_id, badge_id),
                FOREIGN KEY (student_id) REFERENCES students(id) ON DELETE CASCADE,
                FOREIGN KEY (badge_id) REFERENCES badges(id) ON DELETE CASCADE
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS student_streaks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                student_id INTEGER NOT NULL UNIQUE,
                current_streak INTEGER NOT NULL DEFAULT 0,
                longest_streak INTEGER NOT NULL DEFAULT 0,
                last_activity_date TEXT,
                freeze_available INTEGER NOT NULL DEFAULT 0,
                FOREIGN KEY (student_id) REFERENCES students(id) ON DELETE CASCADE
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        log_db_operation!(info, "migrate", "schema is up to date");
        Ok(())
    }

    async fn seed(&self) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO settings (key, value) VALUES (?1, ?2)")
            .bind(PARENT_PIN_KEY)
            .bind(DEFAULT_PARENT_PIN)
            .execute(&self.pool)
            .await?;

        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM badges")
            .fetch_one(&self.pool)
            .await?;
        if existing > 0 {
            return Ok(());
        }

        let catalog = default_badges();
        let mut tx = self.pool.begin().await?;
        for badge in &catalog {
            sqlx::query(
                r#"
                INSERT INTO badges (name, description, icon, criteria_type, criteria_value, tier)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(badge.name)
            .bind(badge.description)
            .bind(badge.icon)
            .bind(badge.criteria_type)
            .bind(badge.criteria_value)
            .bind(badge.tier)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        log_db_operation!(info, "seed_badges", format!("seeded {} badges", catalog.len()));
        Ok(())
    }

    // Student operations
    pub async fn create_student(&self, name: &str, grade: i64, avatar: &str) -> Result<Student> {
        let id = sqlx::query("INSERT INTO students (name, grade, avatar) VALUES (?1, ?2, ?3)")
            .bind(name)
            .bind(grade)
            .bind(avatar)
            .execute(&self.pool)
            .await?
            .last_insert_rowid();

        Ok(Student {
            id,
            name: name.to_string(),
            grade,
            avatar: avatar.to_string(),
            xp: 0,
            level: 1,
            is_public_profile: false,
        })
    }

    pub async fn get_student(&self, id: i64) -> Result<Option<Student>> {
        let row = sqlx::query("SELECT * FROM students WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_student).transpose()
    }

    pub async fn get_student_by_name(&self, name: &str) -> Result<Option<Student>> {
        let row = sqlx::query("SELECT * FROM students WHERE name = ?1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_student).transpose()
    }

    pub async fn get_all_students(&self) -> Result<Vec<Student>> {
        let rows = sqlx::query("SELECT * FROM students ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_student).collect()
    }

    pub async fn student_exists(&self, id: i64) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM students WHERE id = ?1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    pub async fn update_student_profile(&self, student: &Student) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE students
            SET name = ?1, grade = ?2, avatar = ?3, is_public_profile = ?4
            WHERE id = ?5
            "#,
        )
        .bind(&student.name)
        .bind(student.grade)
        .bind(&student.avatar)
        .bind(student.is_public_profile)
        .bind(student.id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn update_student_progress(&self, id: i64, xp: i64, level: i64) -> Result<()> {
        sqlx::query("UPDATE students SET xp = ?1, level = ?2 WHERE id = ?3")
            .bind(xp)
            .bind(level)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn set_student_privacy(&self, id: i64, is_public: bool) -> Result<bool> {
        let result = sqlx::query("UPDATE students SET is_public_profile = ?1 WHERE id = ?2")
            .bind(is_public)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Removes the student and its results; owned rows go with it through cascades.
    pub async fn delete_student(&self, id: i64) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM test_results WHERE student_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM students WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn get_students_by_xp(&self, limit: i64) -> Result<Vec<Student>> {
        let rows = sqlx::query("SELECT * FROM students ORDER BY xp DESC, id ASC LIMIT ?1")
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_student).collect()
    }

    // Test result operations
    pub async fn create_test_result(
        &self,
        request: &CreateResultRequest,
        timestamp: DateTime<Utc>,
    ) -> Result<TestResult> {
        let id = sqlx::query(
            r#"
            INSERT INTO test_results (student_id, student_name, grade, subject, topic,
                                      score, total_questions, timestamp)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(request.student_id)
        .bind(&request.student_name)
        .bind(request.grade)
        .bind(&request.subject)
        .bind(&request.topic)
        .bind(request.score)
        .bind(request.total_questions)
        .bind(format_timestamp(&timestamp))
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        Ok(TestResult {
            id,
            student_id: request.student_id,
            student_name: request.student_name.clone(),
            grade: request.grade,
            subject: request.subject.clone(),
            topic: request.topic.clone(),
            score: request.score,
            total_questions: request.total_questions,
            timestamp,
        })
    }

    pub async fn get_all_test_results(&self) -> Result<Vec<TestResult>> {
        let rows = sqlx::query("SELECT * FROM test_results ORDER BY timestamp DESC, id DESC")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_test_result).collect()
    }

    pub async fn get_student_test_results(&self, student_id: i64) -> Result<Vec<TestResult>> {
        let rows = sqlx::query(
            "SELECT * FROM test_results WHERE student_id = ?1 ORDER BY timestamp DESC, id DESC",
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_test_result).collect()
    }

    // Flashcard operations
    pub async fn create_flashcard(
        &self,
        student_id: i64,
        request: &CreateFlashcardRequest,
        now: DateTime<Utc>,
    ) -> Result<Flashcard> {
        let card = Flashcard {
            id: 0,
            student_id,
            topic: request.topic.clone(),
            front: request.front.clone(),
            back: request.back.clone(),
            ease_factor: 2.5,
            interval: 0,
            next_review: now,
            review_count: 0,
        };

        let id = sqlx::query(
            r#"
            INSERT INTO flashcards (student_id, topic, front, back, ease_factor, interval,
                                    next_review, review_count)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(card.student_id)
        .bind(&card.topic)
        .bind(&card.front)
        .bind(&card.back)
        .bind(card.ease_factor)
        .bind(card.interval)
        .bind(format_timestamp(&card.next_review))
        .bind(card.review_count)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        Ok(Flashcard { id, ..card })
    }

    pub async fn get_flashcard(&self, id: i64) -> Result<Option<Flashcard>> {
        let row = sqlx::query("SELECT * FROM flashcards WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_flashcard).transpose()
    }

    pub async fn get_student_flashcards(&self, student_id: i64) -> Result<Vec<Flashcard>> {
        let rows = sqlx::query("SELECT * FROM flashcards WHERE student_id = ?1 ORDER BY id")
            .bind(student_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_flashcard).collect()
    }

    pub async fn get_due_flashcards(
        &self,
        student_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<Flashcard>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM flashcards
            WHERE student_id = ?1 AND next_review <= ?2
            ORDER BY next_review ASC, id ASC
            "#,
        )
        .bind(student_id)
        .bind(format_timestamp(&now))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_flashcard).collect()
    }

    pub async fn update_flashcard_after_review(&self, card: &Flashcard) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE flashcards
            SET ease_factor = ?1, interval = ?2, next_review = ?3, review_count = ?4
            WHERE id = ?5
            "#,
        )
        .bind(card.ease_factor)
        .bind(card.interval)
        .bind(format_timestamp(&card.next_review))
        .bind(card.review_count)
        .bind(card.id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn delete_flashcard(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM flashcards WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // Lesson log operations
    pub async fn create_lesson_log(
        &self,
        student_id: i64,
        request: &CreateLessonLogRequest,
        timestamp: DateTime<Utc>,
    ) -> Result<LessonLog> {
        let id = sqlx::query(
            r#"
            INSERT INTO lesson_logs (student_id, subject, topic, content, timestamp)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(student_id)
        .bind(&request.subject)
        .bind(&request.topic)
        .bind(&request.content)
        .bind(format_timestamp(&timestamp))
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        Ok(LessonLog {
            id,
            student_id,
            subject: request.subject.clone(),
            topic: request.topic.clone(),
            content: request.content.clone(),
            timestamp,
        })
    }

    pub async fn get_lesson_logs(&self, student_id: i64) -> Result<Vec<LessonLog>> {
        let rows = sqlx::query(
            "SELECT * FROM lesson_logs WHERE student_id = ?1 ORDER BY timestamp DESC, id DESC",
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;

        let mut logs = Vec::with_capacity(rows.len());
        for row in rows {
            logs.push(LessonLog {
                id: row.try_get("id")?,
                student_id: row.try_get("student_id")?,
                subject: row.try_get("subject")?,
                topic: row.try_get("topic")?,
                content: row.try_get("content")?,
                timestamp: parse_timestamp(&row.try_get::<String, _>("timestamp")?)?,
            });
        }

        Ok(logs)
    }

    // Saved quiz operations
    pub async fn create_saved_quiz(
        &self,
        request: &CreateSavedQuizRequest,
        created_at: DateTime<Utc>,
    ) -> Result<SavedQuiz> {
        let questions = serde_json::Value::Array(request.questions.clone());

        let id = sqlx::query(
            r#"
            INSERT INTO saved_quizzes (student_id, subject, topic, questions, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(request.student_id)
        .bind(&request.subject)
        .bind(&request.topic)
        .bind(serde_json::to_string(&questions)?)
        .bind(format_timestamp(&created_at))
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        Ok(SavedQuiz {
            id,
            student_id: request.student_id,
            subject: request.subject.clone(),
            topic: request.topic.clone(),
            questions,
            created_at,
        })
    }

    pub async fn get_saved_quizzes(&self, student_id: i64) -> Result<Vec<SavedQuiz>> {
        let rows = sqlx::query(
            "SELECT * FROM saved_quizzes WHERE student_id = ?1 ORDER BY created_at DESC, id DESC",
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;

        let mut quizzes = Vec::with_capacity(rows.len());
        for row in rows {
            quizzes.push(SavedQuiz {
                id: row.try_get("id")?,
                student_id: row.try_get("student_id")?,
                subject: row.try_get("subject")?,
                topic: row.try_get("topic")?,
                questions: serde_json::from_str(&row.try_get::<String, _>("questions")?)?,
                created_at: parse_timestamp(&row.try_get::<String, _>("created_at")?)?,
            });
        }

        Ok(quizzes)
    }

    pub async fn delete_saved_quiz(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM saved_quizzes WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // Settings operations
    pub async fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let value: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(value)
    }

    pub async fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO settings (key, value) VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // Badge operations
    pub async fn get_all_badges(&self) -> Result<Vec<Badge>> {
        let rows = sqlx::query("SELECT * FROM badges ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        let mut badges = Vec::with_capacity(rows.len());
        for row in rows {
            badges.push(Badge {
                id: row.try_get("id")?,
                name: row.try_get("name")?,
                description: row.try_get("description")?,
                icon: row.try_get("icon")?,
                criteria_type: row.try_get("criteria_type")?,
                criteria_value: row.try_get("criteria_value")?,
                tier: row.try_get("tier")?,
            });
        }

        Ok(badges)
    }

    pub async fn get_student_badges(&self, student_id: i64) -> Result<Vec<StudentBadge>> {
        let rows = sqlx::query("SELECT * FROM student_badges WHERE student_id = ?1 ORDER BY id")
            .bind(student_id)
            .fetch_all(&self.pool)
            .await?;

        let mut awards = Vec::with_capacity(rows.len());
        for row in rows {
            awards.push(StudentBadge {
                id: row.try_get("id")?,
                student_id: row.try_get("student_id")?,
                badge_id: row.try_get("badge_id")?,
                earned_at: parse_timestamp(&row.try_get::<String, _>("earned_at")?)?,
                is_new: row.try_get("is_new")?,
            });
        }

        Ok(awards)
    }

    /// Returns false when the student already held the badge.
    pub async fn award_badge(
        &self,
        student_id: i64,
        badge_id: i64,
        earned_at: DateTime<Utc>,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO student_badges (student_id, badge_id, earned_at, is_new)
            VALUES (?1, ?2, ?3, 1)
            "#,
        )
        .bind(student_id)
        .bind(badge_id)
        .bind(format_timestamp(&earned_at))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn acknowledge_badge(&self, student_id: i64, badge_id: i64) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE student_badges SET is_new = 0 WHERE student_id = ?1 AND badge_id = ?2",
        )
        .bind(student_id)
        .bind(badge_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    // Streak operations
    pub async fn get_streak(&self, student_id: i64) -> Result<Option<StudentStreak>> {
        let row = sqlx::query("SELECT * FROM student_streaks WHERE student_id = ?1")
            .bind(student_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_streak).transpose()
    }

    /// Fetch the student's streak row, inserting an empty one first if needed.
    pub async fn get_or_create_streak(&self, student_id: i64) -> Result<StudentStreak> {
        sqlx::query("INSERT OR IGNORE INTO student_streaks (student_id) VALUES (?1)")
            .bind(student_id)
            .execute(&self.pool)
            .await?;

        let row = sqlx::query("SELECT * FROM student_streaks WHERE student_id = ?1")
            .bind(student_id)
            .fetch_one(&self.pool)
            .await?;

        row_to_streak(&row)
    }

    pub async fn save_streak(&self, streak: &StudentStreak) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE student_streaks
            SET current_streak = ?1, longest_streak = ?2, last_activity_date = ?3,
                freeze_available = ?4
            WHERE student_id = ?5
            "#,
        )
        .bind(streak.current_streak)
        .bind(streak.longest_streak)
        .bind(streak.last_activity_date.map(|d| d.format("%Y-%m-%d").to_string()))
        .bind(streak.freeze_available)
        .bind(streak.student_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn row_to_student(row: &SqliteRow) -> Result<Student> {
    Ok(Student {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        grade: row.try_get("grade")?,
        avatar: row.try_get("avatar")?,
        xp: row.try_get("xp")?,
        level: row.try_get("level")?,
        is_public_profile: row.try_get("is_public_profile")?,
    })
}

fn row_to_test_result(row: &SqliteRow) -> Result<TestResult> {
    Ok(TestResult {
        id: row.try_get("id")?,
        student_id: row.try_get("student_id")?,
        student_name: row.try_get("student_name")?,
        grade: row.try_get("grade")?,
        subject: row.try_get("subject")?,
        topic: row.try_get("topic")?,
        score: row.try_get("score")?,
        total_questions: row.try_get("total_questions")?,
        timestamp: parse_timestamp(&row.try_get::<String, _>("timestamp")?)?,
    })
}

fn row_to_flashcard(row: &SqliteRow) -> Result<Flashcard> {
    Ok(Flashcard {
        id: row.try_get("id")?,
        student_id: row.try_get("student_id")?,
        topic: row.try_get("topic")?,
        front: row.try_get("front")?,
        back: row.try_get("back")?,
        ease_factor: row.try_get("ease_factor")?,
        interval: row.try_get("interval")?,
        next_review: parse_timestamp(&row.try_get::<String, _>("next_review")?)?,
        review_count: row.try_get("review_count")?,
    })
}

fn row_to_streak(row: &SqliteRow) -> Result<StudentStreak> {
    Ok(StudentStreak {
        id: row.try_get("id")?,
        student_id: row.try_get("student_id")?,
        current_streak: row.try_get("current_streak")?,
        longest_streak: row.try_get("longest_streak")?,
        last_activity_date: row
            .try_get::<Option<String>, _>("last_activity_date")?
            .as_deref()
            .map(parse_date)
            .transpose()?,
        freeze_available: row.try_get("freeze_available")?,
    })
}
