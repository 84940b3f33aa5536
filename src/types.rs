use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ─── Core Git Data ────────────────────────────────────────────────────────────

/// A commit exactly as a history reader produced it, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCommit {
    pub hash: String,
    pub author_name: String,
    /// Commit time in unix seconds.
    pub timestamp: i64,
    /// Sum of added + deleted lines, `None` when the reader had no diff for it.
    pub lines_changed: Option<u64>,
    pub message: String,
}

/// A normalized commit. Immutable once extracted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    pub author_name: String,
    pub committed_at: NaiveDateTime,
    pub lines_changed: Option<u64>,
    pub message_first_line: String,
}

/// Which wall clock commit timestamps are projected onto before bucketing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeBasis {
    #[default]
    Local,
    Utc,
}

// ─── Statistics ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommitStatistics {
    pub total_commits: usize,
    pub unique_authors: usize,
    pub top_author: String,
    pub top_author_commits: usize,
    pub first_commit_at: NaiveDateTime,
    pub last_commit_at: NaiveDateTime,
    pub days_active: i64,
    pub commits_per_day: f64,
    pub most_active_hour: u32,
    pub most_active_day: String,
    pub hour_concentration: f64,
    pub avg_commit_size: f64,
    pub median_commit_size: f64,
    pub max_commit_size: u64,
    pub generic_message_ratio: f64,
    pub commit_hours_distribution: BTreeMap<u32, usize>,
    pub commit_days_distribution: BTreeMap<String, usize>,
    pub authors: BTreeMap<String, usize>,
}

/// Statistics for one repository, or the marker for a repository with no commits.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RepoStatistics {
    NoHistory { total_commits: usize },
    Observed(CommitStatistics),
}

impl RepoStatistics {
    pub fn no_history() -> Self {
        RepoStatistics::NoHistory { total_commits: 0 }
    }

    pub fn total_commits(&self) -> usize {
        match self {
            RepoStatistics::NoHistory { .. } => 0,
            RepoStatistics::Observed(s) => s.total_commits,
        }
    }

    pub fn observed(&self) -> Option<&CommitStatistics> {
        match self {
            RepoStatistics::NoHistory { .. } => None,
            RepoStatistics::Observed(s) => Some(s),
        }
    }
}

// ─── Red Flags ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagKind {
    LowActivity,
    NoCollaboration,
    SuspiciousTiming,
    BulkUpload,
    BurstActivity,
    GenericMessages,
    DominatedRepo,
}

impl std::fmt::Display for FlagKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            FlagKind::LowActivity      => "Low activity",
            FlagKind::NoCollaboration  => "No collaboration",
            FlagKind::SuspiciousTiming => "Suspicious timing",
            FlagKind::BulkUpload       => "Bulk upload",
            FlagKind::BurstActivity    => "Burst activity",
            FlagKind::GenericMessages  => "Generic messages",
            FlagKind::DominatedRepo    => "Dominated repo",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low    => write!(f, "LOW"),
            Severity::Medium => write!(f, "MEDIUM"),
            Severity::High   => write!(f, "HIGH"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedFlag {
    #[serde(rename = "type")]
    pub kind: FlagKind,
    pub severity: Severity,
    pub message: String,
    pub score_impact: i32,
}

/// Score impact of each rule. Every value is zero or negative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Penalties {
    pub low_activity: i32,
    pub no_collaboration: i32,
    pub suspicious_timing: i32,
    pub bulk_upload: i32,
    pub burst_activity: i32,
    pub generic_messages: i32,
    pub dominated_repo: i32,
}

impl Default for Penalties {
    fn default() -> Self {
        Penalties {
            low_activity:      -15,
            no_collaboration:  -5,
            suspicious_timing: -25,
            bulk_upload:       -20,
            burst_activity:    -25,
            generic_messages:  -10,
            dominated_repo:    -5,
        }
    }
}

// ─── Results ──────────────────────────────────────────────────────────────────

/// What a reviewer should do with the history, from score and flag count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recommendation {
    Recommended,
    ProceedWithCaution,
    CarefulReviewNeeded,
    NotRecommended,
}

impl Recommendation {
    pub fn advice(self) -> &'static str {
        match self {
            Recommendation::Recommended =>
                "History shows authentic development patterns.",
            Recommendation::ProceedWithCaution =>
                "Mostly authentic with minor concerns; verify skills in a technical interview.",
            Recommendation::CarefulReviewNeeded =>
                "Several red flags; an in-depth technical assessment and code review is advised.",
            Recommendation::NotRecommended =>
                "Significant suspicious patterns; high risk of farmed or fake contributions.",
        }
    }
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Recommendation::Recommended         => "RECOMMENDED",
            Recommendation::ProceedWithCaution  => "PROCEED WITH CAUTION",
            Recommendation::CarefulReviewNeeded => "CAREFUL REVIEW NEEDED",
            Recommendation::NotRecommended      => "NOT RECOMMENDED",
        };
        f.write_str(label)
    }
}

/// Softer observations than red flags. They never change the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BehaviorNote {
    HourConcentration,
    HighFrequency,
    GenericMessages,
    SingleContributor,
}

impl std::fmt::Display for BehaviorNote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            BehaviorNote::HourConcentration => "High concentration of commits at same hour (possible automation)",
            BehaviorNote::HighFrequency     => "Very high commit frequency (verify if normal workflow)",
            BehaviorNote::GenericMessages   => "Many generic commit messages (indicates low effort)",
            BehaviorNote::SingleContributor => "Single contributor (no collaborative work)",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub repository: String,
    pub statistics: RepoStatistics,
    pub red_flags: Vec<RedFlag>,
    pub authenticity_score: u8,
    pub recommendation: Recommendation,
    pub behavior_notes: Vec<BehaviorNote>,
    pub analyzed_at: DateTime<Utc>,
}

/// One entry of a batch: either a finished analysis or the reason it failed.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RepoOutcome {
    Analyzed(AnalysisResult),
    Failed { repository: String, error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub repositories: usize,
    pub analyzed: usize,
    pub failed: usize,
    pub mean_score: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub analyzed_at: DateTime<Utc>,
    pub results: Vec<RepoOutcome>,
    pub summary: BatchSummary,
}
