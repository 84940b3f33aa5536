pub mod clone;
pub mod log_parser;

use crate::error::AnalysisError;
use crate::types::RawCommit;
use std::path::Path;
use std::time::Duration;

/// Supplies the raw commit log for a repository reference.
///
/// Implementations must fail with [`AnalysisError::NoHistoryAccess`] when the
/// reference cannot be resolved. A resolvable repository without commits is
/// an empty `Vec`, not an error.
pub trait HistoryReader: Send + Sync {
    fn read(&self, reference: &str) -> Result<Vec<RawCommit>, AnalysisError>;
}

/// Limits applied while fetching history.
#[derive(Debug, Clone)]
pub struct ReaderOptions {
    /// Newest commits to read; `None` reads everything.
    pub max_commits: Option<usize>,
    pub max_repo_size_mb: u64,
    pub clone_timeout: Duration,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        ReaderOptions {
            max_commits: Some(100),
            max_repo_size_mb: 500,
            clone_timeout: Duration::from_secs(300),
        }
    }
}

/// Reads local repositories in place and shallow-clones remote ones.
#[derive(Debug, Clone, Default)]
pub struct GitHistoryReader {
    pub options: ReaderOptions,
}

impl GitHistoryReader {
    pub fn new(options: ReaderOptions) -> Self {
        GitHistoryReader { options }
    }
}

impl HistoryReader for GitHistoryReader {
    fn read(&self, reference: &str) -> Result<Vec<RawCommit>, AnalysisError> {
        let opts = &self.options;
        if clone::is_remote(reference) {
            let checkout = clone::shallow_clone(
                reference,
                opts.max_commits,
                opts.max_repo_size_mb,
                opts.clone_timeout,
            )?;
            log_parser::read_log(checkout.path(), reference, opts.max_commits)
        } else {
            log_parser::read_log(Path::new(reference), reference, opts.max_commits)
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fixture::*;
    use super::*;

    #[test]
    fn test_reads_local_repository() {
        if !git_available() {
            eprintln!("Skipping: git not available");
            return;
        }
        let tmp = tempfile::tempdir().expect("temp dir");
        init(tmp.path());
        commit(tmp.path(), "a.txt", 3, "Add first file", "2024-01-01T10:00:00+00:00");
        commit(tmp.path(), "b.txt", 5, "Add second file", "2024-01-02T11:00:00+00:00");

        let reader = GitHistoryReader::default();
        let commits = reader.read(&tmp.path().display().to_string()).expect("readable repo");
        assert_eq!(commits.len(), 2);
        assert_eq!(commits[0].message.trim(), "Add second file", "newest first");
        assert_eq!(commits[0].lines_changed, Some(5));
        assert_eq!(commits[0].author_name, "Fixture Dev");
        assert_eq!(commits[1].timestamp, 1_704_103_200);
    }

    #[test]
    fn test_max_commits_limits_depth() {
        if !git_available() {
            eprintln!("Skipping: git not available");
            return;
        }
        let tmp = tempfile::tempdir().expect("temp dir");
        init(tmp.path());
        for i in 0..4 {
            commit(tmp.path(), "a.txt", i + 1, &format!("change {i}"), "2024-01-01T10:00:00+00:00");
        }
        let reader = GitHistoryReader::new(ReaderOptions { max_commits: Some(2), ..Default::default() });
        let commits = reader.read(&tmp.path().display().to_string()).expect("readable repo");
        assert_eq!(commits.len(), 2);
    }

    #[test]
    fn test_repository_without_commits_is_empty() {
        if !git_available() {
            eprintln!("Skipping: git not available");
            return;
        }
        let tmp = tempfile::tempdir().expect("temp dir");
        init(tmp.path());
        let commits = GitHistoryReader::default()
            .read(&tmp.path().display().to_string())
            .expect("empty repo is readable");
        assert!(commits.is_empty());
    }

    #[test]
    fn test_plain_directory_is_no_access() {
        if !git_available() {
            eprintln!("Skipping: git not available");
            return;
        }
        let tmp = tempfile::tempdir().expect("temp dir");
        let err = GitHistoryReader::default()
            .read(&tmp.path().display().to_string())
            .expect_err("not a repository");
        assert!(matches!(err, AnalysisError::NoHistoryAccess { .. }), "got {err:?}");
    }

    #[test]
    fn test_multi_line_message_keeps_first_physical_line() {
        if !git_available() {
            eprintln!("Skipping: git not available");
            return;
        }
        let tmp = tempfile::tempdir().expect("temp dir");
        init(tmp.path());
        commit(tmp.path(), "a.txt", 2, "fix\nadjust parser for edge case", "2024-01-01T10:00:00+00:00");

        let raw = GitHistoryReader::default()
            .read(&tmp.path().display().to_string())
            .expect("readable repo");
        let records = crate::analyzers::extractor::extract_records(&raw, crate::types::TimeBasis::Utc)
            .expect("valid timestamps");
        assert_eq!(records[0].message_first_line, "fix");
        let stats = crate::analyzers::statistics::aggregate(&records).expect("one commit");
        assert_eq!(stats.generic_message_ratio, 1.0);
    }

    #[test]
    fn test_author_name_with_pipe() {
        if !git_available() {
            eprintln!("Skipping: git not available");
            return;
        }
        let tmp = tempfile::tempdir().expect("temp dir");
        init(tmp.path());
        std::fs::write(tmp.path().join("a.txt"), "x\n").expect("write fixture file");
        git(tmp.path(), &["add", "a.txt"], None);
        git_as(tmp.path(), &["commit", "--quiet", "-m", "Add x"], Some("2024-01-01T10:00:00+00:00"), "Ana|Bob");

        let commits = GitHistoryReader::default()
            .read(&tmp.path().display().to_string())
            .expect("readable repo");
        assert_eq!(commits[0].author_name, "Ana|Bob");
        assert_eq!(commits[0].message.trim(), "Add x");
    }

    #[test]
    fn test_subdirectory_of_repository_is_no_access() {
        if !git_available() {
            eprintln!("Skipping: git not available");
            return;
        }
        let tmp = tempfile::tempdir().expect("temp dir");
        init(tmp.path());
        commit(tmp.path(), "a.txt", 1, "Add first file", "2024-01-01T10:00:00+00:00");
        let nested = tmp.path().join("docs");
        std::fs::create_dir(&nested).expect("mkdir");

        let err = GitHistoryReader::default()
            .read(&nested.display().to_string())
            .expect_err("parent history must not be read");
        assert!(matches!(err, AnalysisError::NoHistoryAccess { .. }), "got {err:?}");
    }
}
