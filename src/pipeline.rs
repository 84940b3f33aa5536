//! Sequences extraction, aggregation, red-flag detection and scoring for one
//! repository, and fans a batch of repositories out over a bounded pool.

use std::sync::atomic::{AtomicU64, Ordering};
use chrono::Utc;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::analyzers::{extractor, red_flags, statistics};
use crate::error::AnalysisError;
use crate::git::HistoryReader;
use crate::scoring;
use crate::types::*;

/// Where a single analysis currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Extracting,
    Aggregating,
    Detecting,
    Scoring,
    Done,
    Failed,
}

/// Caller-owned hooks into the analysis lifecycle. Every method defaults to
/// doing nothing.
pub trait AnalysisObserver: Send + Sync {
    fn on_started(&self, _reference: &str) {}
    fn on_stage(&self, _reference: &str, _stage: Stage) {}
    fn on_completed(&self, _result: &AnalysisResult) {}
    fn on_failed(&self, _reference: &str, _error: &AnalysisError) {}
}

pub struct NoopObserver;

impl AnalysisObserver for NoopObserver {}

/// Request, analysis and error tallies.
#[derive(Debug, Default)]
pub struct AnalysisCounters {
    requests: AtomicU64,
    analyses: AtomicU64,
    errors: AtomicU64,
}

impl AnalysisCounters {
    pub fn requests(&self) -> u64 { self.requests.load(Ordering::Relaxed) }
    pub fn analyses(&self) -> u64 { self.analyses.load(Ordering::Relaxed) }
    pub fn errors(&self)   -> u64 { self.errors.load(Ordering::Relaxed) }

    /// Failed share of all requests as a percentage, two decimals.
    pub fn error_rate(&self) -> f64 {
        statistics::round2(self.errors() as f64 / self.requests().max(1) as f64 * 100.0)
    }
}

impl AnalysisObserver for AnalysisCounters {
    fn on_started(&self, _reference: &str) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    fn on_completed(&self, _result: &AnalysisResult) {
        self.analyses.fetch_add(1, Ordering::Relaxed);
    }

    fn on_failed(&self, _reference: &str, _error: &AnalysisError) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }
}

/// Forwards every hook to each observer in turn.
impl<A: AnalysisObserver, B: AnalysisObserver> AnalysisObserver for (A, B) {
    fn on_started(&self, reference: &str) {
        self.0.on_started(reference);
        self.1.on_started(reference);
    }

    fn on_stage(&self, reference: &str, stage: Stage) {
        self.0.on_stage(reference, stage);
        self.1.on_stage(reference, stage);
    }

    fn on_completed(&self, result: &AnalysisResult) {
        self.0.on_completed(result);
        self.1.on_completed(result);
    }

    fn on_failed(&self, reference: &str, error: &AnalysisError) {
        self.0.on_failed(reference, error);
        self.1.on_failed(reference, error);
    }
}

/// The analysis engine bound to a history source.
pub struct Analyzer<R: HistoryReader> {
    reader: R,
    basis: TimeBasis,
    penalties: Penalties,
}

impl<R: HistoryReader> Analyzer<R> {
    pub fn new(reader: R) -> Self {
        Analyzer { reader, basis: TimeBasis::default(), penalties: Penalties::default() }
    }

    pub fn with_time_basis(mut self, basis: TimeBasis) -> Self {
        self.basis = basis;
        self
    }

    pub fn with_penalties(mut self, penalties: Penalties) -> Self {
        self.penalties = penalties;
        self
    }

    /// Reads the history behind `reference` and analyzes it.
    ///
    /// A repository with no commits is a successful result scoring 0.
    /// Reader failures come back as [`AnalysisError::NoHistoryAccess`];
    /// anything else that goes wrong is [`AnalysisError::Unexpected`].
    pub fn analyze(
        &self,
        reference: &str,
        observer: &dyn AnalysisObserver,
    ) -> Result<AnalysisResult, AnalysisError> {
        observer.on_started(reference);
        observer.on_stage(reference, Stage::Idle);
        let result = guard(|| {
            let raw = self.reader.read(reference)?;
            self.run_stages(reference, &raw, observer)
        });
        finish(reference, result, observer)
    }

    /// Analyzes commits that were already fetched.
    pub fn analyze_commits(
        &self,
        reference: &str,
        raw: &[RawCommit],
        observer: &dyn AnalysisObserver,
    ) -> Result<AnalysisResult, AnalysisError> {
        observer.on_started(reference);
        observer.on_stage(reference, Stage::Idle);
        let result = guard(|| self.run_stages(reference, raw, observer));
        finish(reference, result, observer)
    }

    fn run_stages(
        &self,
        reference: &str,
        raw: &[RawCommit],
        observer: &dyn AnalysisObserver,
    ) -> Result<AnalysisResult, AnalysisError> {
        enter(reference, Stage::Extracting, observer);
        let records = extractor::extract_records(raw, self.basis)?;

        enter(reference, Stage::Aggregating, observer);
        let stats = match statistics::aggregate(&records) {
            Ok(s) => s,
            Err(AnalysisError::NoCommits) => {
                info!(reference, "no commits, scoring as empty history");
                return Ok(AnalysisResult {
                    repository: reference.to_string(),
                    statistics: RepoStatistics::no_history(),
                    red_flags: Vec::new(),
                    authenticity_score: 0,
                    recommendation: scoring::recommend(0, 0),
                    behavior_notes: Vec::new(),
                    analyzed_at: Utc::now(),
                });
            }
            Err(e) => return Err(e),
        };

        enter(reference, Stage::Detecting, observer);
        let flags = red_flags::detect_red_flags(&stats, &self.penalties);

        enter(reference, Stage::Scoring, observer);
        let behavior_notes = scoring::behavior_notes(&stats);
        let statistics = RepoStatistics::Observed(stats);
        let authenticity_score = scoring::score_repository(&statistics, &flags);
        let recommendation = scoring::recommend(authenticity_score, flags.len());

        Ok(AnalysisResult {
            repository: reference.to_string(),
            statistics,
            red_flags: flags,
            authenticity_score,
            recommendation,
            behavior_notes,
            analyzed_at: Utc::now(),
        })
    }

    /// Analyzes every reference on a pool of at most `concurrency` threads.
    /// Each reference fails or succeeds on its own; output order follows input.
    pub fn analyze_batch(
        &self,
        references: &[String],
        concurrency: usize,
        observer: &dyn AnalysisObserver,
    ) -> BatchReport {
        let run = |reference: &String| match self.analyze(reference, observer) {
            Ok(result) => RepoOutcome::Analyzed(result),
            Err(e) => RepoOutcome::Failed { repository: reference.clone(), error: e.to_string() },
        };

        let results: Vec<RepoOutcome> = match rayon::ThreadPoolBuilder::new()
            .num_threads(concurrency.max(1))
            .build()
        {
            Ok(pool) => pool.install(|| references.par_iter().map(run).collect()),
            Err(e) => {
                warn!("cannot build thread pool ({e}), analyzing sequentially");
                references.iter().map(run).collect()
            }
        };

        let summary = summarize(&results);
        info!(
            repositories = summary.repositories,
            analyzed = summary.analyzed,
            failed = summary.failed,
            "batch finished"
        );
        BatchReport { analyzed_at: Utc::now(), results, summary }
    }
}

fn enter(reference: &str, stage: Stage, observer: &dyn AnalysisObserver) {
    debug!(reference, ?stage, "entering stage");
    observer.on_stage(reference, stage);
}

/// Turns a panic inside the stages into an [`AnalysisError::Unexpected`] so a
/// single bad repository cannot take the batch down.
fn guard<F>(f: F) -> Result<AnalysisResult, AnalysisError>
where
    F: FnOnce() -> Result<AnalysisResult, AnalysisError>,
{
    std::panic::catch_unwind(std::panic::AssertUnwindSafe(f)).unwrap_or_else(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "analysis panicked".to_string());
        Err(AnalysisError::Unexpected(message))
    })
}

fn finish(
    reference: &str,
    result: Result<AnalysisResult, AnalysisError>,
    observer: &dyn AnalysisObserver,
) -> Result<AnalysisResult, AnalysisError> {
    match &result {
        Ok(r) => {
            enter(reference, Stage::Done, observer);
            info!(reference, score = r.authenticity_score, flags = r.red_flags.len(), "analysis done");
            observer.on_completed(r);
        }
        Err(e) => {
            enter(reference, Stage::Failed, observer);
            warn!(reference, error = %e, "analysis failed");
            observer.on_failed(reference, e);
        }
    }
    result
}

pub fn summarize(results: &[RepoOutcome]) -> BatchSummary {
    let scores: Vec<f64> = results
        .iter()
        .filter_map(|r| match r {
            RepoOutcome::Analyzed(a) => Some(a.authenticity_score as f64),
            RepoOutcome::Failed { .. } => None,
        })
        .collect();
    let mean_score = if scores.is_empty() {
        None
    } else {
        Some(statistics::round2(scores.iter().sum::<f64>() / scores.len() as f64))
    };
    BatchSummary {
        repositories: results.len(),
        analyzed: scores.len(),
        failed: results.len() - scores.len(),
        mean_score,
    }
}
