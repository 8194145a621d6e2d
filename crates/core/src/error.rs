use thiserror::Error;

/// Error taxonomy for ranking and clustering operations.
///
/// Validation errors (`EmptyInput`, `DimensionMismatch`) abort a request
/// before any scoring happens; `Internal` covers unexpected computation
/// failures and maps to a server-side error at the HTTP boundary.
#[derive(Error, Debug)]
pub enum AffinityError {
    #[error("Empty input: {0}")]
    EmptyInput(&'static str),

    #[error("Candidate {index} has dimension {actual}, expected {expected}")]
    DimensionMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AffinityError {
    /// Whether this error was caused by the caller's input (HTTP 400)
    /// rather than a failure inside the engine (HTTP 500).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AffinityError::EmptyInput(_) | AffinityError::DimensionMismatch { .. }
        )
    }
}
