/// Errors an analysis of a single repository can end with.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalysisError {
    /// The history reader could not resolve the reference or read its log.
    #[error("Cannot read history of '{reference}': {reason}")]
    NoHistoryAccess { reference: String, reason: String },

    /// The repository exists but has no commits.
    #[error("No commits found")]
    NoCommits,

    #[error("Unexpected analysis failure: {0}")]
    Unexpected(String),
}

impl AnalysisError {
    pub fn no_access(reference: &str, reason: impl Into<String>) -> Self {
        AnalysisError::NoHistoryAccess {
            reference: reference.to_string(),
            reason: reason.into(),
        }
    }
}
