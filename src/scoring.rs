use crate::types::{BehaviorNote, CommitStatistics, Recommendation, RedFlag, RepoStatistics};

const BASE_SCORE: i32 = 50;
const MAX_SCORE:  i32 = 100;

/// Combines positive history signals and red-flag penalties into a 0–100
/// authenticity score. A repository with no history scores 0.
///
/// Bonuses and penalties are summed unclamped; the clamp happens once, at
/// the end.
pub fn score_repository(stats: &RepoStatistics, red_flags: &[RedFlag]) -> u8 {
    let Some(s) = stats.observed() else { return 0 };

    let mut score = BASE_SCORE;

    if s.total_commits >= 10         { score += 10; }
    if s.total_commits >= 50         { score += 10; }
    if s.unique_authors > 1          { score += 10; }
    if s.days_active > 30            { score += 10; }
    if s.days_active > 90            { score += 5;  }
    if s.generic_message_ratio < 0.3 { score += 5;  }

    score += red_flags.iter().map(|f| f.score_impact).sum::<i32>();

    score.clamp(0, MAX_SCORE) as u8
}

/// Maps a finished score and its flag count onto a reviewer recommendation.
pub fn recommend(score: u8, flag_count: usize) -> Recommendation {
    if score >= 80 && flag_count == 0 {
        Recommendation::Recommended
    } else if score >= 60 && flag_count <= 2 {
        Recommendation::ProceedWithCaution
    } else if score >= 40 {
        Recommendation::CarefulReviewNeeded
    } else {
        Recommendation::NotRecommended
    }
}

/// Patterns worth mentioning that sit below the red-flag thresholds.
pub fn behavior_notes(s: &CommitStatistics) -> Vec<BehaviorNote> {
    let mut notes = Vec::new();
    if s.hour_concentration > 0.7     { notes.push(BehaviorNote::HourConcentration); }
    if s.commits_per_day > 10.0       { notes.push(BehaviorNote::HighFrequency); }
    if s.generic_message_ratio > 0.5  { notes.push(BehaviorNote::GenericMessages); }
    if s.unique_authors == 1          { notes.push(BehaviorNote::SingleContributor); }
    notes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CommitStatistics, FlagKind, Severity};
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn stats(total: usize, authors: usize, days: i64, generic: f64) -> RepoStatistics {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|d| d.and_hms_opt(9, 0, 0))
            .expect("valid date");
        RepoStatistics::Observed(CommitStatistics {
            total_commits: total,
            unique_authors: authors,
            top_author: "ana".to_string(),
            top_author_commits: total,
            first_commit_at: start,
            last_commit_at: start + chrono::Duration::days(days),
            days_active: days,
            commits_per_day: 1.0,
            most_active_hour: 9,
            most_active_day: "Monday".to_string(),
            hour_concentration: 0.2,
            avg_commit_size: 10.0,
            median_commit_size: 10.0,
            max_commit_size: 10,
            generic_message_ratio: generic,
            commit_hours_distribution: BTreeMap::new(),
            commit_days_distribution: BTreeMap::new(),
            authors: BTreeMap::new(),
        })
    }

    fn flag(impact: i32) -> RedFlag {
        RedFlag {
            kind: FlagKind::BurstActivity,
            severity: Severity::High,
            message: String::new(),
            score_impact: impact,
        }
    }

    #[test]
    fn test_no_history_scores_zero() {
        assert_eq!(score_repository(&RepoStatistics::no_history(), &[]), 0);
    }

    #[test]
    fn test_base_score_without_bonuses() {
        // generic ratio at 0.3 is not below 0.3, so no message bonus either
        assert_eq!(score_repository(&stats(9, 1, 30, 0.3), &[]), 50);
    }

    #[test]
    fn test_each_bonus_boundary() {
        assert_eq!(score_repository(&stats(10, 1, 1, 0.5), &[]), 60, "10 commits");
        assert_eq!(score_repository(&stats(50, 1, 1, 0.5), &[]), 70, "50 commits stacks");
        assert_eq!(score_repository(&stats(1, 2, 1, 0.5), &[]), 60, "multiple authors");
        assert_eq!(score_repository(&stats(1, 1, 31, 0.5), &[]), 60, "over 30 days");
        assert_eq!(score_repository(&stats(1, 1, 91, 0.5), &[]), 65, "over 90 days stacks");
        assert_eq!(score_repository(&stats(1, 1, 1, 0.29), &[]), 55, "specific messages");
    }

    #[test]
    fn test_all_bonuses_reach_exactly_100() {
        assert_eq!(score_repository(&stats(60, 2, 120, 0.1), &[]), 100);
    }

    #[test]
    fn test_penalties_are_added() {
        assert_eq!(score_repository(&stats(3, 1, 1, 1.0), &[flag(-15), flag(-10)]), 25);
    }

    #[test]
    fn test_clamps_at_zero() {
        let flags = vec![flag(-25), flag(-25), flag(-20), flag(-15)];
        assert_eq!(score_repository(&stats(3, 1, 1, 1.0), &flags), 0);
    }

    #[test]
    fn test_penalties_subtract_from_full_bonus() {
        let flags = vec![flag(-60), flag(-5)];
        assert_eq!(score_repository(&stats(60, 2, 120, 0.1), &flags), 35);
    }

    #[test]
    fn test_deterministic() {
        let s = stats(25, 1, 3, 0.2);
        let flags = vec![flag(-25), flag(-5)];
        assert_eq!(score_repository(&s, &flags), score_repository(&s, &flags));
    }

    #[test]
    fn test_recommendation_boundaries() {
        assert_eq!(recommend(80, 0), Recommendation::Recommended);
        assert_eq!(recommend(100, 0), Recommendation::Recommended);
        assert_eq!(recommend(80, 1), Recommendation::ProceedWithCaution);
        assert_eq!(recommend(79, 0), Recommendation::ProceedWithCaution);
        assert_eq!(recommend(60, 2), Recommendation::ProceedWithCaution);
        assert_eq!(recommend(60, 3), Recommendation::CarefulReviewNeeded);
        assert_eq!(recommend(59, 0), Recommendation::CarefulReviewNeeded);
        assert_eq!(recommend(40, 7), Recommendation::CarefulReviewNeeded);
        assert_eq!(recommend(39, 0), Recommendation::NotRecommended);
        assert_eq!(recommend(0, 0), Recommendation::NotRecommended);
    }

    #[test]
    fn test_behavior_notes_thresholds() {
        let Some(quiet) = stats(20, 2, 40, 0.2).observed().cloned() else { panic!("observed") };
        assert!(behavior_notes(&quiet).is_empty());

        let busy = CommitStatistics {
            hour_concentration: 0.71,
            commits_per_day: 10.5,
            generic_message_ratio: 0.51,
            unique_authors: 1,
            ..quiet.clone()
        };
        assert_eq!(
            behavior_notes(&busy),
            vec![
                BehaviorNote::HourConcentration,
                BehaviorNote::HighFrequency,
                BehaviorNote::GenericMessages,
                BehaviorNote::SingleContributor,
            ]
        );

        let edge = CommitStatistics { hour_concentration: 0.7, commits_per_day: 10.0, generic_message_ratio: 0.5, ..quiet };
        assert!(behavior_notes(&edge).is_empty(), "thresholds are strict");
    }
}
