use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use crate::error::AnalysisError;
use crate::types::{CommitRecord, RawCommit, TimeBasis};

/// Normalizes raw reader output into [`CommitRecord`]s, preserving order.
///
/// A missing line delta stays `None`. The only hard failure is a timestamp
/// that cannot be represented as a calendar date, which means the reader
/// handed us garbage.
pub fn extract_records(
    raw: &[RawCommit],
    basis: TimeBasis,
) -> Result<Vec<CommitRecord>, AnalysisError> {
    raw.iter()
        .map(|commit| {
            Ok(CommitRecord {
                author_name: commit.author_name.clone(),
                committed_at: wall_clock(commit.timestamp, basis).ok_or_else(|| {
                    AnalysisError::Unexpected(format!(
                        "commit {} has an out-of-range timestamp {}",
                        commit.hash, commit.timestamp
                    ))
                })?,
                lines_changed: commit.lines_changed,
                message_first_line: first_line(&commit.message),
            })
        })
        .collect()
}

fn wall_clock(timestamp: i64, basis: TimeBasis) -> Option<NaiveDateTime> {
    let utc = DateTime::<Utc>::from_timestamp(timestamp, 0)?;
    Some(match basis {
        TimeBasis::Utc   => utc.naive_utc(),
        TimeBasis::Local => Local.from_utc_datetime(&utc.naive_utc()).naive_local(),
    })
}

fn first_line(message: &str) -> String {
    message.trim().lines().next().unwrap_or("").trim().to_string()
}
