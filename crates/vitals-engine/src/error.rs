use crate::backend::BackendError;
use thiserror::Error;

/// An element was found but its attributes broke the contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssertionFailure {
    #[error("Expected {name}='{expected}', got '{}'", .actual.as_deref().unwrap_or("None"))]
    AttributeMismatch {
        name: String,
        expected: String,
        actual: Option<String>,
    },
    #[error("{name} is missing")]
    AttributeMissing { name: String },
}

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("Could not connect to {url} after {attempts} attempts: {last_error}")]
    Connection {
        url: String,
        attempts: u32,
        last_error: String,
    },
    #[error("{step}: {source}")]
    Timeout {
        step: String,
        #[source]
        source: BackendError,
    },
    #[error(transparent)]
    Assertion(#[from] AssertionFailure),
    #[error("{0}")]
    Unexpected(String),
}

impl VerifyError {
    /// Category name used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            VerifyError::Connection { .. } => "ConnectionError",
            VerifyError::Timeout { .. } => "TimeoutError",
            VerifyError::Assertion(_) => "AssertionError",
            VerifyError::Unexpected(_) => "UnexpectedError",
        }
    }

    /// Map a backend failure during `step`: timeouts keep their own category,
    /// everything else is unexpected.
    pub fn from_backend(step: &str, err: BackendError) -> Self {
        if err.is_timeout() {
            VerifyError::Timeout {
                step: step.to_string(),
                source: err,
            }
        } else {
            VerifyError::Unexpected(format!("{}: {}", step, err))
        }
    }
}
