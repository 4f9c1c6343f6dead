use anyhow::{anyhow, Result};
use chrono::{DateTime, Datelike, Duration, Utc};

use crate::models::Flashcard;

pub const MIN_EASE_FACTOR: f64 = 1.3;

/// Longest gap between reviews, in days.
pub const MAX_INTERVAL_DAYS: i64 = 36_500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewRating {
    Easy,
    Medium,
    Hard,
}

impl ReviewRating {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            other => Err(anyhow!("Invalid rating: '{}'. Expected easy, medium, or hard", other)),
        }
    }
}

/// Simplified SM-2 style interval update for flashcards.
#[derive(Debug, Clone, Default)]
pub struct FlashcardScheduler;

impl FlashcardScheduler {
    pub fn new() -> Self {
        Self
    }

    pub fn schedule_review(
        &self,
        card: &Flashcard,
        rating: ReviewRating,
        now: DateTime<Utc>,
    ) -> Result<Flashcard> {
        let (interval, ease_factor) = match rating {
            ReviewRating::Easy => {
                let interval = if card.interval > 0 {
                    card.interval.saturating_mul(2)
                } else {
                    1
                };
                (interval.min(MAX_INTERVAL_DAYS), card.ease_factor + 0.1)
            }
            ReviewRating::Medium => {
                let interval = if card.interval > 0 {
                    ((card.interval as f64 * 1.5) as i64).max(1)
                } else {
                    1
                };
                (interval.min(MAX_INTERVAL_DAYS), card.ease_factor)
            }
            ReviewRating::Hard => (0, (card.ease_factor - 0.2).max(MIN_EASE_FACTOR)),
        };

        // A reset card comes straight back into the due pile.
        let next_review = if interval == 0 {
            now
        } else {
            now.checked_add_signed(Duration::days(interval))
                .filter(|next| next.year() <= 9999)
                .ok_or_else(|| anyhow!("Review date out of range for card {}", card.id))?
        };

        Ok(Flashcard {
            interval,
            ease_factor,
            next_review,
            review_count: card.review_count + 1,
            ..card.clone()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn card(interval: i64, ease_factor: f64) -> Flashcard {
        Flashcard {
            id: 1,
            student_id: 1,
            topic: "Volcanoes".to_string(),
            front: "What comes out of a volcano?".to_string(),
            back: "Lava".to_string(),
            ease_factor,
            interval,
            next_review: Utc::now(),
            review_count: 0,
        }
    }

    #[test]
    fn test_rating_parsing() {
        assert_eq!(ReviewRating::parse("easy").unwrap(), ReviewRating::Easy);
        assert_eq!(ReviewRating::parse("Medium").unwrap(), ReviewRating::Medium);
        assert_eq!(ReviewRating::parse(" HARD ").unwrap(), ReviewRating::Hard);
        assert!(ReviewRating::parse("again").is_err());
    }

    #[test]
    fn test_easy_starts_at_one_then_doubles() {
        let scheduler = FlashcardScheduler::new();
        let now = Utc::now();

        let first = scheduler.schedule_review(&card(0, 2.5), ReviewRating::Easy, now).unwrap();
        assert_eq!(first.interval, 1);
        assert!((first.ease_factor - 2.6).abs() < 1e-9);
        assert_eq!(first.next_review, now + Duration::days(1));

        let second = scheduler.schedule_review(&first, ReviewRating::Easy, now).unwrap();
        assert_eq!(second.interval, 2);
        let third = scheduler.schedule_review(&second, ReviewRating::Easy, now).unwrap();
        assert_eq!(third.interval, 4);
        assert_eq!(third.review_count, 3);
    }

    #[test]
    fn test_medium_scales_interval() {
        let scheduler = FlashcardScheduler::new();
        let now = Utc::now();

        assert_eq!(scheduler.schedule_review(&card(0, 2.5), ReviewRating::Medium, now).unwrap().interval, 1);
        assert_eq!(scheduler.schedule_review(&card(1, 2.5), ReviewRating::Medium, now).unwrap().interval, 1);
        assert_eq!(scheduler.schedule_review(&card(4, 2.5), ReviewRating::Medium, now).unwrap().interval, 6);
        let reviewed = scheduler.schedule_review(&card(4, 2.5), ReviewRating::Medium, now).unwrap();
        assert!((reviewed.ease_factor - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_hard_always_resets() {
        let scheduler = FlashcardScheduler::new();
        let now = Utc::now();

        for interval in [0, 1, 8, 64] {
            let reviewed = scheduler.schedule_review(&card(interval, 2.5), ReviewRating::Hard, now).unwrap();
            assert_eq!(reviewed.interval, 0);
            assert_eq!(reviewed.next_review, now);
        }
    }

    #[test]
    fn test_hard_ease_floor() {
        let scheduler = FlashcardScheduler::new();
        let reviewed = scheduler.schedule_review(&card(3, 1.4), ReviewRating::Hard, Utc::now()).unwrap();
        assert!((reviewed.ease_factor - MIN_EASE_FACTOR).abs() < 1e-9);
    }

    #[test]
    fn test_intervals_are_capped() {
        let scheduler = FlashcardScheduler::new();
        let now = Utc::now();

        let mut reviewed = card(0, 2.5);
        for _ in 0..40 {
            reviewed = scheduler.schedule_review(&reviewed, ReviewRating::Easy, now).unwrap();
        }
        assert_eq!(reviewed.interval, MAX_INTERVAL_DAYS);
        assert_eq!(reviewed.next_review, now + Duration::days(MAX_INTERVAL_DAYS));

        let medium = scheduler
            .schedule_review(&card(30_000, 2.5), ReviewRating::Medium, now)
            .unwrap();
        assert_eq!(medium.interval, MAX_INTERVAL_DAYS);
    }

    #[test]
    fn test_unrepresentable_review_date_is_an_error() {
        let scheduler = FlashcardScheduler::new();
        let far_future = Utc.with_ymd_and_hms(9990, 1, 1, 0, 0, 0).unwrap();
        assert!(scheduler
            .schedule_review(&card(1, 2.5), ReviewRating::Easy, far_future)
            .is_ok());
        assert!(scheduler
            .schedule_review(&card(4000, 2.5), ReviewRating::Easy, far_future)
            .is_err());
    }
}
