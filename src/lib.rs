//! Commit authenticity analysis.
//!
//! Reads a repository's commit log, reduces it to behavioral statistics,
//! checks those against a fixed set of red-flag heuristics and produces a
//! 0–100 authenticity score.

pub mod analyzers;
pub mod config;
pub mod error;
pub mod git;
pub mod pipeline;
pub mod reporters;
pub mod scoring;
pub mod types;

pub use error::AnalysisError;
pub use git::{GitHistoryReader, HistoryReader, ReaderOptions};
pub use pipeline::{AnalysisCounters, AnalysisObserver, Analyzer, NoopObserver, Stage};
pub use types::{AnalysisResult, BehaviorNote, CommitRecord, CommitStatistics, RawCommit, Recommendation, RedFlag};
