use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::database::Database;
use crate::models::*;
use crate::scheduler::{FlashcardScheduler, ReviewRating};

use crate::log_service_success;

#[derive(Clone)]
pub struct FlashcardService {
    db: Database,
    scheduler: FlashcardScheduler,
}

impl FlashcardService {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            scheduler: FlashcardScheduler::new(),
        }
    }

    /// New cards are due immediately. `None` when the student does not exist.
    pub async fn create_flashcard(
        &self,
        student_id: i64,
        request: &CreateFlashcardRequest,
        now: DateTime<Utc>,
    ) -> Result<Option<Flashcard>> {
        if !self.db.student_exists(student_id).await? {
            return Ok(None);
        }
        Ok(Some(self.db.create_flashcard(student_id, request, now).await?))
    }

    pub async fn get_flashcard(&self, id: i64) -> Result<Option<Flashcard>> {
        self.db.get_flashcard(id).await
    }

    pub async fn student_flashcards(&self, student_id: i64) -> Result<Option<Vec<Flashcard>>> {
        if !self.db.student_exists(student_id).await? {
            return Ok(None);
        }
        Ok(Some(self.db.get_student_flashcards(student_id).await?))
    }

    pub async fn due_flashcards(
        &self,
        student_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<Vec<Flashcard>>> {
        if !self.db.student_exists(student_id).await? {
            return Ok(None);
        }
        Ok(Some(self.db.get_due_flashcards(student_id, now).await?))
    }

    pub async fn review_flashcard(
        &self,
        id: i64,
        rating: ReviewRating,
        now: DateTime<Utc>,
    ) -> Result<Option<FlashcardReviewResult>> {
        let Some(card) = self.db.get_flashcard(id).await? else {
            return Ok(None);
        };

        let reviewed = self.scheduler.schedule_review(&card, rating, now)?;
        self.db.update_flashcard_after_review(&reviewed).await?;

        log_service_success!(
            "flashcard_service",
            "review_flashcard",
            student_id = reviewed.student_id,
            format!("card {} rated {:?}, next in {} days", id, rating, reviewed.interval)
        );

        Ok(Some(FlashcardReviewResult {
            next_review: reviewed.next_review,
            interval: reviewed.interval,
            ease_factor: reviewed.ease_factor,
            review_count: reviewed.review_count,
        }))
    }

    pub async fn delete_flashcard(&self, id: i64) -> Result<bool> {
        self.db.delete_flashcard(id).await
    }
}
