use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;

use crate::database::Database;
use crate::gamification::{badge_progress, criteria_met, record_activity, ActivityTransition, BadgeStats};
use crate::models::*;

use crate::log_service_success;

/// Badges and streaks. Evaluation errors propagate to the caller.
#[derive(Clone)]
pub struct GamificationService {
    db: Database,
}

impl GamificationService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn all_badges(&self) -> Result<Vec<Badge>> {
        self.db.get_all_badges().await
    }

    async fn badge_stats(&self, student_id: i64) -> Result<BadgeStats> {
        let results = self.db.get_student_test_results(student_id).await?;
        let streak = self.db.get_streak(student_id).await?;
        Ok(BadgeStats::collect(&results, streak.as_ref()))
    }

    /// The full catalog annotated with this student's awards and progress.
    pub async fn student_badges(&self, student_id: i64) -> Result<Option<Vec<StudentBadgeView>>> {
        if !self.db.student_exists(student_id).await? {
            return Ok(None);
        }

        let awards: HashMap<i64, StudentBadge> = self
            .db
            .get_student_badges(student_id)
            .await?
            .into_iter()
            .map(|award| (award.badge_id, award))
            .collect();
        let stats = self.badge_stats(student_id).await?;

        let views = self
            .db
            .get_all_badges()
            .await?
            .into_iter()
            .map(|badge| {
                let award = awards.get(&badge.id);
                StudentBadgeView {
                    earned: award.is_some(),
                    earned_at: award.map(|a| a.earned_at),
                    is_new: award.is_some_and(|a| a.is_new),
                    progress: if award.is_some() { 100 } else { badge_progress(&badge, &stats) },
                    id: badge.id,
                    name: badge.name,
                    description: badge.description,
                    icon: badge.icon,
                    tier: badge.tier,
                }
            })
            .collect();

        Ok(Some(views))
    }

    /// Award every unearned badge whose criterion is now met.
    pub async fn check_badges(
        &self,
        student_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<Vec<BadgeSummary>>> {
        if !self.db.student_exists(student_id).await? {
            return Ok(None);
        }
        Ok(Some(self.award_new_badges(student_id, now).await?))
    }

    async fn award_new_badges(&self, student_id: i64, now: DateTime<Utc>) -> Result<Vec<BadgeSummary>> {
        let earned: Vec<i64> = self
            .db
            .get_student_badges(student_id)
            .await?
            .iter()
            .map(|award| award.badge_id)
            .collect();
        let stats = self.badge_stats(student_id).await?;

        let mut new_badges = Vec::new();
        for badge in self.db.get_all_badges().await? {
            if earned.contains(&badge.id) || !criteria_met(&badge, &stats) {
                continue;
            }
            if self.db.award_badge(student_id, badge.id, now).await? {
                log_service_success!(
                    "gamification_service",
                    "award_badge",
                    student_id = student_id,
                    format!("earned '{}'", badge.name)
                );
                new_badges.push(BadgeSummary::from(&badge));
            }
        }

        Ok(new_badges)
    }

    /// Clears the "new" marker. False when the student never earned the badge.
    pub async fn acknowledge_badge(&self, student_id: i64, badge_id: i64) -> Result<bool> {
        self.db.acknowledge_badge(student_id, badge_id).await
    }

    /// Current streak, creating an empty record on first read.
    pub async fn streak(&self, student_id: i64) -> Result<Option<StreakView>> {
        if !self.db.student_exists(student_id).await? {
            return Ok(None);
        }
        let streak = self.db.get_or_create_streak(student_id).await?;
        Ok(Some(StreakView::from(&streak)))
    }

    /// Record activity on `today`, then re-run badge evaluation.
    pub async fn log_activity(
        &self,
        student_id: i64,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Option<ActivityOutcome>> {
        if !self.db.student_exists(student_id).await? {
            return Ok(None);
        }

        let mut streak = self.db.get_or_create_streak(student_id).await?;
        let transition = record_activity(&mut streak, today);
        let already_logged = transition == ActivityTransition::AlreadyLogged;

        let new_badges = if already_logged {
            Vec::new()
        } else {
            self.db.save_streak(&streak).await?;
            log_service_success!(
                "gamification_service",
                "log_activity",
                student_id = student_id,
                format!("{:?}, streak now {}", transition, streak.current_streak)
            );
            self.award_new_badges(student_id, now).await?
        };

        Ok(Some(ActivityOutcome {
            current_streak: streak.current_streak,
            longest_streak: streak.longest_streak,
            freeze_available: streak.freeze_available,
            already_logged,
            new_badges,
        }))
    }
}
