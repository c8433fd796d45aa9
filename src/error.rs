use std::fmt;

/// Failure taxonomy for a recognition run. Every variant carries the single
/// message shown to the user; nothing is retried automatically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// Rejected before any network call (bad file type, size, empty file).
    Validation(String),
    /// Non-2xx or transport failure from the upload endpoint.
    Upload(String),
    /// Non-2xx or transport failure from the recognize endpoint.
    Recognition(String),
}

impl PipelineError {
    pub fn message(&self) -> &str {
        match self {
            PipelineError::Validation(message)
            | PipelineError::Upload(message)
            | PipelineError::Recognition(message) => message,
        }
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for PipelineError {}
