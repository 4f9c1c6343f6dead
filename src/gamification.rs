use chrono::{NaiveDate, Timelike};
use std::collections::{HashMap, HashSet};

use crate::models::{Badge, StudentStreak, TestResult, XpUpdateResult};

/// Upper XP bound (inclusive) for each level below the cap.
const LEVEL_BREAKPOINTS: [(i64, i64); 4] = [(100, 1), (300, 2), (600, 3), (1000, 4)];
pub const MAX_LEVEL: i64 = 5;

/// Consecutive days after which a streak freeze is granted.
pub const FREEZE_STREAK_DAYS: i64 = 7;

pub fn level_for_xp(xp: i64) -> i64 {
    LEVEL_BREAKPOINTS
        .iter()
        .find(|(upper, _)| xp <= *upper)
        .map(|(_, level)| *level)
        .unwrap_or(MAX_LEVEL)
}

/// Add `delta` to a running XP total and recompute the level. The total
/// saturates at the integer bounds.
pub fn apply_xp(current_xp: i64, current_level: i64, delta: i64) -> XpUpdateResult {
    let xp = current_xp.saturating_add(delta);
    let level = level_for_xp(xp);
    XpUpdateResult {
        xp,
        level,
        leveled_up: level > current_level,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityTransition {
    AlreadyLogged,
    Started,
    Continued,
    Reset,
}

/// Advance a streak for activity on `today`.
///
/// Dates at or before the last recorded activity leave the row untouched. The
/// freeze flag is only ever granted or cleared here; nothing spends it.
pub fn record_activity(streak: &mut StudentStreak, today: NaiveDate) -> ActivityTransition {
    let transition = match streak.last_activity_date {
        Some(last) => {
            let days_since = (today - last).num_days();
            if days_since <= 0 {
                return ActivityTransition::AlreadyLogged;
            }
            if days_since == 1 {
                streak.current_streak += 1;
                if streak.current_streak >= FREEZE_STREAK_DAYS && !streak.freeze_available {
                    streak.freeze_available = true;
                }
                ActivityTransition::Continued
            } else {
                streak.current_streak = 1;
                streak.freeze_available = false;
                ActivityTransition::Reset
            }
        }
        None => {
            streak.current_streak = 1;
            ActivityTransition::Started
        }
    };

    streak.longest_streak = streak.longest_streak.max(streak.current_streak);
    streak.last_activity_date = Some(today);
    transition
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CriteriaType {
    LessonCount,
    PerfectScore,
    Streak,
    SubjectCount,
    SubjectMaster,
    TimeEarly,
    TimeLate,
    Speed,
}

impl CriteriaType {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "lesson_count" => Some(Self::LessonCount),
            "perfect_score" | "perfect_scores" => Some(Self::PerfectScore),
            "streak" => Some(Self::Streak),
            "subject_count" => Some(Self::SubjectCount),
            "subject_master" => Some(Self::SubjectMaster),
            "time_early" => Some(Self::TimeEarly),
            "time_late" => Some(Self::TimeLate),
            "speed" => Some(Self::Speed),
            _ => None,
        }
    }
}

/// Aggregates over one student's results and streak that badge criteria read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BadgeStats {
    pub total_results: i64,
    pub perfect_results: i64,
    pub distinct_subjects: i64,
    pub best_subject_results: i64,
    pub current_streak: i64,
    pub earliest_hour: Option<u32>,
    pub latest_hour: Option<u32>,
}

impl BadgeStats {
    pub fn collect(results: &[TestResult], streak: Option<&StudentStreak>) -> Self {
        let mut per_subject: HashMap<&str, i64> = HashMap::new();
        for result in results {
            *per_subject.entry(result.subject.as_str()).or_default() += 1;
        }
        let subjects: HashSet<&str> = per_subject.keys().copied().collect();
        let hours = results.iter().map(|r| r.timestamp.hour());

        Self {
            total_results: results.len() as i64,
            perfect_results: results.iter().filter(|r| r.is_perfect()).count() as i64,
            distinct_subjects: subjects.len() as i64,
            best_subject_results: per_subject.values().copied().max().unwrap_or(0),
            current_streak: streak.map(|s| s.current_streak).unwrap_or(0),
            earliest_hour: hours.clone().min(),
            latest_hour: hours.max(),
        }
    }

    /// Countable amount achieved toward `criteria`, `None` for yes/no criteria.
    fn achieved(&self, criteria: CriteriaType) -> Option<i64> {
        match criteria {
            CriteriaType::LessonCount => Some(self.total_results),
            CriteriaType::PerfectScore => Some(self.perfect_results),
            CriteriaType::Streak => Some(self.current_streak),
            CriteriaType::SubjectCount => Some(self.distinct_subjects),
            CriteriaType::SubjectMaster => Some(self.best_subject_results),
            CriteriaType::TimeEarly | CriteriaType::TimeLate | CriteriaType::Speed => None,
        }
    }
}

/// Whether `stats` satisfy the badge's criterion.
///
/// For the time criteria, `criteria_value` is an hour of the day in UTC. Lesson
/// durations are not recorded, so `speed` badges are never met.
pub fn criteria_met(badge: &Badge, stats: &BadgeStats) -> bool {
    let Some(criteria) = CriteriaType::parse(&badge.criteria_type) else {
        return false;
    };

    match criteria {
        CriteriaType::TimeEarly => stats
            .earliest_hour
            .is_some_and(|hour| i64::from(hour) < badge.criteria_value),
        CriteriaType::TimeLate => stats
            .latest_hour
            .is_some_and(|hour| i64::from(hour) >= badge.criteria_value),
        CriteriaType::Speed => false,
        countable => stats
            .achieved(countable)
            .is_some_and(|achieved| achieved >= badge.criteria_value),
    }
}

/// Percentage (0-100) of the way toward an unearned badge.
pub fn badge_progress(badge: &Badge, stats: &BadgeStats) -> i64 {
    let Some(criteria) = CriteriaType::parse(&badge.criteria_type) else {
        return 0;
    };

    match stats.achieved(criteria) {
        Some(_) if badge.criteria_value <= 0 => 100,
        Some(achieved) => (achieved * 100 / badge.criteria_value).clamp(0, 100),
        None if criteria_met(badge, stats) => 100,
        None => 0,
    }
}

/// Catalog seeded into an empty badges table.
pub fn default_badges() -> Vec<crate::models::NewBadge> {
    use crate::models::NewBadge;

    vec![
        NewBadge { name: "First Steps", description: "Complete your first lesson", icon: "🎓", criteria_type: "lesson_count", criteria_value: 1, tier: "bronze" },
        NewBadge { name: "Quiz Ace", description: "Score 100% on any quiz", icon: "🏆", criteria_type: "perfect_score", criteria_value: 1, tier: "bronze" },
        NewBadge { name: "Streak Master", description: "Maintain a 7-day learning streak", icon: "🔥", criteria_type: "streak", criteria_value: 7, tier: "gold" },
        NewBadge { name: "Explorer", description: "Try 5 different subjects", icon: "🌟", criteria_type: "subject_count", criteria_value: 5, tier: "silver" },
        NewBadge { name: "Perfectionist", description: "Score 100% on 10 quizzes", icon: "💯", criteria_type: "perfect_score", criteria_value: 10, tier: "gold" },
        NewBadge { name: "Dedicated Learner", description: "Complete 25 lessons", icon: "📚", criteria_type: "lesson_count", criteria_value: 25, tier: "silver" },
        NewBadge { name: "Subject Expert", description: "Complete 15 lessons in one subject", icon: "🎯", criteria_type: "subject_master", criteria_value: 15, tier: "gold" },
        NewBadge { name: "Early Bird", description: "Complete a lesson before 9 AM", icon: "🌅", criteria_type: "time_early", criteria_value: 9, tier: "bronze" },
        NewBadge { name: "Night Owl", description: "Complete a lesson after 8 PM", icon: "🌙", criteria_type: "time_late", criteria_value: 20, tier: "bronze" },
        NewBadge { name: "Speed Demon", description: "Complete a lesson in under 5 minutes", icon: "⚡", criteria_type: "speed", criteria_value: 300, tier: "silver" },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn day(n: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, n).unwrap()
    }

    fn empty_streak() -> StudentStreak {
        StudentStreak {
            id: 1,
            student_id: 1,
            current_streak: 0,
            longest_streak: 0,
            last_activity_date: None,
            freeze_available: false,
        }
    }

    fn badge(criteria_type: &str, criteria_value: i64) -> Badge {
        Badge {
            id: 1,
            name: "Test".to_string(),
            description: "Test badge".to_string(),
            icon: "⭐".to_string(),
            criteria_type: criteria_type.to_string(),
            criteria_value,
            tier: "bronze".to_string(),
        }
    }

    fn result_at(subject: &str, score: i64, total: i64, hour: u32) -> TestResult {
        TestResult {
            id: 0,
            student_id: Some(1),
            student_name: "Ama".to_string(),
            grade: 2,
            subject: subject.to_string(),
            topic: "Counting".to_string(),
            score,
            total_questions: total,
            timestamp: Utc.with_ymd_and_hms(2024, 3, 1, hour, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_level_breakpoints() {
        assert_eq!(level_for_xp(0), 1);
        assert_eq!(level_for_xp(100), 1);
        assert_eq!(level_for_xp(101), 2);
        assert_eq!(level_for_xp(300), 2);
        assert_eq!(level_for_xp(301), 3);
        assert_eq!(level_for_xp(600), 3);
        assert_eq!(level_for_xp(1000), 4);
        assert_eq!(level_for_xp(1001), 5);
        assert_eq!(level_for_xp(50_000), 5);
    }

    #[test]
    fn test_apply_xp_reports_level_up() {
        let update = apply_xp(90, 1, 20);
        assert_eq!(update.xp, 110);
        assert_eq!(update.level, 2);
        assert!(update.leveled_up);

        let same_bracket = apply_xp(110, 2, 50);
        assert_eq!(same_bracket.level, 2);
        assert!(!same_bracket.leveled_up);
    }

    #[test]
    fn test_apply_xp_saturates() {
        let update = apply_xp(i64::MAX, MAX_LEVEL, 1);
        assert_eq!(update.xp, i64::MAX);
        assert_eq!(update.level, MAX_LEVEL);
        assert!(!update.leveled_up);

        assert_eq!(apply_xp(i64::MIN, 1, -1).xp, i64::MIN);
    }

    #[test]
    fn test_first_activity_starts_streak() {
        let mut streak = empty_streak();
        assert_eq!(record_activity(&mut streak, day(1)), ActivityTransition::Started);
        assert_eq!(streak.current_streak, 1);
        assert_eq!(streak.longest_streak, 1);
        assert_eq!(streak.last_activity_date, Some(day(1)));
    }

    #[test]
    fn test_same_day_activity_is_noop() {
        let mut streak = empty_streak();
        record_activity(&mut streak, day(1));
        let before = streak.clone();
        assert_eq!(
            record_activity(&mut streak, day(1)),
            ActivityTransition::AlreadyLogged
        );
        assert_eq!(streak, before);
    }

    #[test]
    fn test_consecutive_days_continue_and_grant_freeze() {
        let mut streak = empty_streak();
        for n in 1..=6 {
            record_activity(&mut streak, day(n));
        }
        assert_eq!(streak.current_streak, 6);
        assert!(!streak.freeze_available);

        assert_eq!(record_activity(&mut streak, day(7)), ActivityTransition::Continued);
        assert_eq!(streak.current_streak, 7);
        assert_eq!(streak.longest_streak, 7);
        assert!(streak.freeze_available);
    }

    #[test]
    fn test_gap_resets_streak_and_clears_freeze() {
        let mut streak = empty_streak();
        for n in 1..=8 {
            record_activity(&mut streak, day(n));
        }
        assert!(streak.freeze_available);

        assert_eq!(record_activity(&mut streak, day(10)), ActivityTransition::Reset);
        assert_eq!(streak.current_streak, 1);
        assert_eq!(streak.longest_streak, 8);
        assert!(!streak.freeze_available);
    }

    #[test]
    fn test_lesson_count_threshold() {
        let dedicated = badge("lesson_count", 25);
        let results: Vec<TestResult> = (0..24).map(|_| result_at("Math", 3, 5, 12)).collect();
        let stats = BadgeStats::collect(&results, None);
        assert!(!criteria_met(&dedicated, &stats));
        assert_eq!(badge_progress(&dedicated, &stats), 96);

        let mut results = results;
        results.push(result_at("Math", 3, 5, 12));
        let stats = BadgeStats::collect(&results, None);
        assert!(criteria_met(&dedicated, &stats));
        assert_eq!(badge_progress(&dedicated, &stats), 100);
    }

    #[test]
    fn test_subject_criteria() {
        let results = vec![
            result_at("Math", 5, 5, 12),
            result_at("Math", 4, 5, 12),
            result_at("Science", 5, 5, 12),
        ];
        let stats = BadgeStats::collect(&results, None);
        assert_eq!(stats.distinct_subjects, 2);
        assert_eq!(stats.best_subject_results, 2);
        assert_eq!(stats.perfect_results, 2);

        assert!(criteria_met(&badge("subject_master", 2), &stats));
        assert!(!criteria_met(&badge("subject_master", 3), &stats));
        assert_eq!(badge_progress(&badge("subject_count", 5), &stats), 40);
        assert!(criteria_met(&badge("perfect_score", 2), &stats));
    }

    #[test]
    fn test_time_criteria_use_hour_thresholds() {
        let early = BadgeStats::collect(&[result_at("Math", 1, 5, 8)], None);
        assert!(criteria_met(&badge("time_early", 9), &early));
        assert!(!criteria_met(&badge("time_late", 20), &early));

        let late = BadgeStats::collect(&[result_at("Math", 1, 5, 20)], None);
        assert!(criteria_met(&badge("time_late", 20), &late));
        assert!(!criteria_met(&badge("time_early", 9), &late));

        let none = BadgeStats::collect(&[], None);
        assert!(!criteria_met(&badge("time_early", 9), &none));
        assert_eq!(badge_progress(&badge("time_late", 20), &none), 0);
    }

    #[test]
    fn test_streak_progress_defaults_to_zero_without_record() {
        let streak_badge = badge("streak", 7);
        let stats = BadgeStats::collect(&[], None);
        assert_eq!(badge_progress(&streak_badge, &stats), 0);

        let mut streak = empty_streak();
        streak.current_streak = 3;
        let stats = BadgeStats::collect(&[], Some(&streak));
        assert_eq!(badge_progress(&streak_badge, &stats), 42);
        assert!(!criteria_met(&streak_badge, &stats));
    }

    #[test]
    fn test_unrecorded_and_unknown_criteria_never_met() {
        let results: Vec<TestResult> = (0..50).map(|_| result_at("Math", 5, 5, 12)).collect();
        let stats = BadgeStats::collect(&results, None);
        assert!(!criteria_met(&badge("speed", 300), &stats));
        assert!(!criteria_met(&badge("mystery", 1), &stats));
        assert_eq!(badge_progress(&badge("mystery", 1), &stats), 0);
    }

    #[test]
    fn test_default_catalog() {
        let catalog = default_badges();
        assert_eq!(catalog.len(), 10);
        assert!(catalog.iter().all(|b| CriteriaType::parse(b.criteria_type).is_some()));
        assert!(catalog.iter().any(|b| b.name == "Dedicated Learner" && b.criteria_value == 25));
    }
}
