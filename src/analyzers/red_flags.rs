use crate::types::{CommitStatistics, FlagKind, Penalties, RedFlag, Severity};

const LOW_ACTIVITY_MAX_COMMITS:    usize = 5;
const SOLO_MIN_COMMITS:            usize = 5;
const HOUR_CONCENTRATION_LIMIT:    f64   = 0.8;
const BULK_COMMIT_LINES:           u64   = 1000;
const BURST_MIN_COMMITS:           usize = 20;
const BURST_MAX_DAYS:              i64   = 7;
const GENERIC_MESSAGE_LIMIT:       f64   = 0.5;
const DOMINANT_AUTHOR_SHARE:       f64   = 0.95;

/// Runs every rule against `stats` and returns the flags that fired, in rule
/// order. Rules are independent; none looks at another rule's outcome.
pub fn detect_red_flags(stats: &CommitStatistics, penalties: &Penalties) -> Vec<RedFlag> {
    let mut flags = Vec::new();

    if stats.total_commits < LOW_ACTIVITY_MAX_COMMITS {
        flags.push(RedFlag {
            kind: FlagKind::LowActivity,
            severity: Severity::Medium,
            message: format!("Only {} commits (expected 10+)", stats.total_commits),
            score_impact: penalties.low_activity,
        });
    }

    if stats.unique_authors == 1 && stats.total_commits > SOLO_MIN_COMMITS {
        flags.push(RedFlag {
            kind: FlagKind::NoCollaboration,
            severity: Severity::Low,
            message: "Single author with no collaboration".to_string(),
            score_impact: penalties.no_collaboration,
        });
    }

    if stats.hour_concentration > HOUR_CONCENTRATION_LIMIT {
        flags.push(RedFlag {
            kind: FlagKind::SuspiciousTiming,
            severity: Severity::High,
            message: format!("{}% of commits at same hour", percent(stats.hour_concentration)),
            score_impact: penalties.suspicious_timing,
        });
    }

    if stats.max_commit_size > BULK_COMMIT_LINES {
        flags.push(RedFlag {
            kind: FlagKind::BulkUpload,
            severity: Severity::High,
            message: format!("Very large commit ({} lines)", stats.max_commit_size),
            score_impact: penalties.bulk_upload,
        });
    }

    if stats.total_commits > BURST_MIN_COMMITS && stats.days_active < BURST_MAX_DAYS {
        flags.push(RedFlag {
            kind: FlagKind::BurstActivity,
            severity: Severity::High,
            message: format!("{} commits in {} days", stats.total_commits, stats.days_active),
            score_impact: penalties.burst_activity,
        });
    }

    if stats.generic_message_ratio > GENERIC_MESSAGE_LIMIT {
        flags.push(RedFlag {
            kind: FlagKind::GenericMessages,
            severity: Severity::Medium,
            message: format!("{}% generic commit messages", percent(stats.generic_message_ratio)),
            score_impact: penalties.generic_messages,
        });
    }

    if stats.unique_authors > 1 {
        let share = stats.top_author_commits as f64 / stats.total_commits as f64;
        if share > DOMINANT_AUTHOR_SHARE {
            flags.push(RedFlag {
                kind: FlagKind::DominatedRepo,
                severity: Severity::Low,
                message: format!("One author made {}% of commits", percent(share)),
                score_impact: penalties.dominated_repo,
            });
        }
    }

    flags
}

/// Truncating percentage used in flag messages.
fn percent(ratio: f64) -> i64 {
    (ratio * 100.0) as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    /// A healthy baseline that trips no rule.
    fn clean_stats() -> CommitStatistics {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|d| d.and_hms_opt(9, 0, 0))
            .expect("valid date");
        CommitStatistics {
            total_commits: 40,
            unique_authors: 3,
            top_author: "ana".to_string(),
            top_author_commits: 20,
            first_commit_at: start,
            last_commit_at: start + chrono::Duration::days(60),
            days_active: 60,
            commits_per_day: 0.67,
            most_active_hour: 9,
            most_active_day: "Monday".to_string(),
            hour_concentration: 0.3,
            avg_commit_size: 50.0,
            median_commit_size: 40.0,
            max_commit_size: 300,
            generic_message_ratio: 0.1,
            commit_hours_distribution: BTreeMap::new(),
            commit_days_distribution: BTreeMap::new(),
            authors: BTreeMap::new(),
        }
    }

    fn kinds(flags: &[RedFlag]) -> Vec<FlagKind> {
        flags.iter().map(|f| f.kind).collect()
    }

    #[test]
    fn test_clean_stats_raise_nothing() {
        assert!(detect_red_flags(&clean_stats(), &Penalties::default()).is_empty());
    }

    #[test]
    fn test_low_activity() {
        let mut s = clean_stats();
        s.total_commits = 4;
        s.top_author_commits = 2;
        let flags = detect_red_flags(&s, &Penalties::default());
        assert_eq!(kinds(&flags), vec![FlagKind::LowActivity]);
        assert_eq!(flags[0].severity, Severity::Medium);
        assert_eq!(flags[0].score_impact, -15);
        assert_eq!(flags[0].message, "Only 4 commits (expected 10+)");
    }

    #[test]
    fn test_five_commits_is_neither_low_nor_solo() {
        let mut s = clean_stats();
        s.total_commits = 5;
        s.unique_authors = 1;
        s.top_author_commits = 5;
        assert!(detect_red_flags(&s, &Penalties::default()).is_empty(),
            "5 commits sits exactly between the low-activity and no-collaboration bounds");
    }

    #[test]
    fn test_no_collaboration() {
        let mut s = clean_stats();
        s.unique_authors = 1;
        s.top_author_commits = s.total_commits;
        let flags = detect_red_flags(&s, &Penalties::default());
        assert_eq!(kinds(&flags), vec![FlagKind::NoCollaboration],
            "a single author must not also count as a dominated repo");
        assert_eq!(flags[0].score_impact, -5);
    }

    #[test]
    fn test_suspicious_timing_is_strictly_above_threshold() {
        let mut s = clean_stats();
        s.hour_concentration = 0.8;
        assert!(detect_red_flags(&s, &Penalties::default()).is_empty());
        s.hour_concentration = 0.85;
        let flags = detect_red_flags(&s, &Penalties::default());
        assert_eq!(kinds(&flags), vec![FlagKind::SuspiciousTiming]);
        assert_eq!(flags[0].message, "85% of commits at same hour");
        assert_eq!(flags[0].severity, Severity::High);
    }

    #[test]
    fn test_bulk_upload() {
        let mut s = clean_stats();
        s.max_commit_size = 1000;
        assert!(detect_red_flags(&s, &Penalties::default()).is_empty());
        s.max_commit_size = 1001;
        let flags = detect_red_flags(&s, &Penalties::default());
        assert_eq!(kinds(&flags), vec![FlagKind::BulkUpload]);
        assert_eq!(flags[0].message, "Very large commit (1001 lines)");
        assert_eq!(flags[0].score_impact, -20);
    }

    #[test]
    fn test_burst_activity() {
        let mut s = clean_stats();
        s.total_commits = 21;
        s.top_author_commits = 10;
        s.days_active = 6;
        let flags = detect_red_flags(&s, &Penalties::default());
        assert_eq!(kinds(&flags), vec![FlagKind::BurstActivity]);
        assert_eq!(flags[0].message, "21 commits in 6 days");
        s.days_active = 7;
        assert!(detect_red_flags(&s, &Penalties::default()).is_empty());
    }

    #[test]
    fn test_generic_messages() {
        let mut s = clean_stats();
        s.generic_message_ratio = 0.5;
        assert!(detect_red_flags(&s, &Penalties::default()).is_empty());
        s.generic_message_ratio = 0.67;
        let flags = detect_red_flags(&s, &Penalties::default());
        assert_eq!(kinds(&flags), vec![FlagKind::GenericMessages]);
        assert_eq!(flags[0].message, "67% generic commit messages");
        assert_eq!(flags[0].score_impact, -10);
    }

    #[test]
    fn test_dominated_repo() {
        let mut s = clean_stats();
        s.total_commits = 100;
        s.top_author_commits = 96;
        let flags = detect_red_flags(&s, &Penalties::default());
        assert_eq!(kinds(&flags), vec![FlagKind::DominatedRepo]);
        assert_eq!(flags[0].message, "One author made 96% of commits");
        s.top_author_commits = 95;
        assert!(detect_red_flags(&s, &Penalties::default()).is_empty(), "95% is not above 0.95");
    }

    #[test]
    fn test_all_rules_fire_in_table_order() {
        // Contradictory on purpose: rules only read the fields they need.
        let mut s = clean_stats();
        s.total_commits = 3;
        s.unique_authors = 1;
        s.hour_concentration = 1.0;
        s.max_commit_size = 5000;
        s.generic_message_ratio = 1.0;
        let flags = detect_red_flags(&s, &Penalties::default());
        assert_eq!(kinds(&flags), vec![
            FlagKind::LowActivity,
            FlagKind::SuspiciousTiming,
            FlagKind::BulkUpload,
            FlagKind::GenericMessages,
        ]);

        let mut s = clean_stats();
        s.total_commits = 500;
        s.unique_authors = 2;
        s.top_author_commits = 499;
        s.days_active = 2;
        s.hour_concentration = 0.9;
        s.max_commit_size = 2000;
        s.generic_message_ratio = 0.9;
        let flags = detect_red_flags(&s, &Penalties::default());
        assert_eq!(kinds(&flags), vec![
            FlagKind::SuspiciousTiming,
            FlagKind::BulkUpload,
            FlagKind::BurstActivity,
            FlagKind::GenericMessages,
            FlagKind::DominatedRepo,
        ]);
    }

    #[test]
    fn test_custom_penalties_are_used() {
        let mut s = clean_stats();
        s.max_commit_size = 5000;
        let penalties = Penalties { bulk_upload: -40, ..Penalties::default() };
        let flags = detect_red_flags(&s, &penalties);
        assert_eq!(flags[0].score_impact, -40);
    }

    #[test]
    fn test_all_impacts_non_positive() {
        let mut s = clean_stats();
        s.total_commits = 3;
        s.unique_authors = 1;
        s.hour_concentration = 1.0;
        s.max_commit_size = 5000;
        s.generic_message_ratio = 1.0;
        for flag in detect_red_flags(&s, &Penalties::default()) {
            assert!(flag.score_impact <= 0, "{} has positive impact", flag.kind);
        }
    }
}
