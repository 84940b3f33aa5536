use std::collections::BTreeMap;
use chrono::Timelike;
use once_cell::sync::Lazy;
use regex::Regex;
use crate::error::AnalysisError;
use crate::types::{CommitRecord, CommitStatistics};

/// Placeholder first lines that carry no information about the change.
static GENERIC_MESSAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:initial commit|first commit|update|fix|commit|\.)$")
        .expect("generic message regex")
});

const WEEKDAYS: [&str; 7] = [
    "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday",
];

/// Reduces a commit sequence into [`CommitStatistics`].
///
/// Fails with [`AnalysisError::NoCommits`] on an empty sequence. Ratios and
/// averages are rounded to two decimals, half away from zero. Argmax ties go
/// to the lowest hour, the earliest weekday (Monday first) and the
/// lexicographically smallest author name.
pub fn aggregate(records: &[CommitRecord]) -> Result<CommitStatistics, AnalysisError> {
    let first = records.first().ok_or(AnalysisError::NoCommits)?;
    let total_commits = records.len();

    let mut authors: BTreeMap<String, usize> = BTreeMap::new();
    let mut hours:   BTreeMap<u32, usize>    = BTreeMap::new();
    let mut days:    BTreeMap<String, usize> = BTreeMap::new();
    let mut sizes:   Vec<u64>                = Vec::new();
    let mut generic = 0usize;
    let mut first_at = first.committed_at;
    let mut last_at  = first.committed_at;

    for record in records {
        *authors.entry(record.author_name.clone()).or_default() += 1;
        *hours.entry(record.committed_at.hour()).or_default() += 1;
        *days.entry(record.committed_at.format("%A").to_string()).or_default() += 1;
        if let Some(lines) = record.lines_changed {
            sizes.push(lines);
        }
        if GENERIC_MESSAGE.is_match(&record.message_first_line) {
            generic += 1;
        }
        first_at = first_at.min(record.committed_at);
        last_at  = last_at.max(record.committed_at);
    }

    let days_active = (last_at - first_at).num_days().max(1);

    let (top_author, top_author_commits) = first_max(authors.iter().map(|(a, &c)| (a.clone(), c)))
        .ok_or_else(|| AnalysisError::Unexpected("author tally is empty".to_string()))?;
    let (most_active_hour, max_hour_commits) = first_max(hours.iter().map(|(&h, &c)| (h, c)))
        .ok_or_else(|| AnalysisError::Unexpected("hour tally is empty".to_string()))?;
    let (most_active_day, _) = first_max(
        WEEKDAYS.iter().filter_map(|d| days.get(*d).map(|&c| (d.to_string(), c))),
    )
    .ok_or_else(|| AnalysisError::Unexpected("weekday tally is empty".to_string()))?;

    let (avg_commit_size, median_commit_size, max_commit_size) = size_stats(&mut sizes);

    Ok(CommitStatistics {
        total_commits,
        unique_authors: authors.len(),
        top_author,
        top_author_commits,
        first_commit_at: first_at,
        last_commit_at: last_at,
        days_active,
        commits_per_day: round2(total_commits as f64 / days_active as f64),
        most_active_hour,
        most_active_day,
        hour_concentration: round2(max_hour_commits as f64 / total_commits as f64),
        avg_commit_size,
        median_commit_size,
        max_commit_size,
        generic_message_ratio: round2(generic as f64 / total_commits as f64),
        commit_hours_distribution: hours,
        commit_days_distribution: days,
        authors,
    })
}

/// Returns the first entry holding the maximum count, so iteration order
/// decides ties.
fn first_max<K>(entries: impl Iterator<Item = (K, usize)>) -> Option<(K, usize)> {
    entries.fold(None, |best, (key, count)| match best {
        Some((_, best_count)) if best_count >= count => best,
        _ => Some((key, count)),
    })
}

/// (mean, median, max) over known commit sizes; all zero when none are known.
fn size_stats(sizes: &mut [u64]) -> (f64, f64, u64) {
    if sizes.is_empty() {
        return (0.0, 0.0, 0);
    }
    sizes.sort_unstable();
    let n = sizes.len();
    let mean = sizes.iter().map(|&s| s as f64).sum::<f64>() / n as f64;
    let median = if n % 2 == 1 {
        sizes[n / 2] as f64
    } else {
        (sizes[n / 2 - 1] as f64 + sizes[n / 2] as f64) / 2.0
    };
    (round2(mean), round2(median), sizes[n - 1])
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
