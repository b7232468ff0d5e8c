use thiserror::Error;

/// Errors raised by pipeline stages and terminal operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    /// A required predicate, comparator, extractor or count is missing or malformed
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A terminal operation ran on a consumed pipeline, or an absent value was
    /// forced under the failing policy
    #[error("Illegal state: {0}")]
    IllegalState(String),
}

impl PipelineError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        PipelineError::InvalidArgument(msg.into())
    }

    pub fn illegal_state(msg: impl Into<String>) -> Self {
        PipelineError::IllegalState(msg.into())
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, PipelineError::InvalidArgument(_))
    }

    pub fn is_illegal_state(&self) -> bool {
        matches!(self, PipelineError::IllegalState(_))
    }
}
