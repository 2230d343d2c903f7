use thiserror::Error;

/// Non-fatal analysis failures.
///
/// A failed `finalize` marks that analyser's result as unavailable in the
/// report; it never aborts the scenario run.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Analyser already finalized")]
    AlreadyFinalized,

    #[error("Sequence accounting failed: {0}")]
    SequenceAccounting(String),

    #[error("Inconsistent sample series: {0}")]
    InconsistentSeries(String),
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;
