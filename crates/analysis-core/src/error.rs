use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// No fundamentals record was available to score (unknown ticker, failed fetch).
    #[error("Missing data: {0}")]
    MissingData(String),

    /// Scoring could not be completed; no partial result exists.
    #[error("Computation failure: {0}")]
    ComputationFailure(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("API error: {0}")]
    ApiError(String),
}
