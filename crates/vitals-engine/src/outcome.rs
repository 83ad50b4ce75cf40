use crate::error::VerifyError;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    /// Every assertion held.
    Success,
    /// The element was found but its attributes were wrong.
    Failure,
    /// Connection, timeout, or anything else that broke the run.
    Error,
}

impl OutcomeKind {
    pub fn artifact_name(&self) -> &'static str {
        match self {
            OutcomeKind::Success => "success.png",
            OutcomeKind::Failure => "failure.png",
            OutcomeKind::Error => "error.png",
        }
    }

    pub fn artifact_path(&self, output_dir: &Path) -> PathBuf {
        output_dir.join(self.artifact_name())
    }

    pub fn for_error(err: &VerifyError) -> Self {
        match err {
            VerifyError::Assertion(_) => OutcomeKind::Failure,
            _ => OutcomeKind::Error,
        }
    }
}

/// Result of one verification pass. Produced once, never mutated.
#[derive(Debug)]
pub struct Outcome {
    pub kind: OutcomeKind,
    pub error: Option<VerifyError>,
    /// Where the screenshot landed, if it could be taken.
    pub screenshot: Option<PathBuf>,
    pub elapsed: Duration,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        self.kind == OutcomeKind::Success
    }

    pub fn exit_code(&self) -> u8 {
        if self.is_success() { 0 } else { 1 }
    }

    pub fn process_exit_code(&self) -> ExitCode {
        ExitCode::from(self.exit_code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AssertionFailure;

    #[test]
    fn test_artifact_paths_are_distinct() {
        let dir = Path::new("verification");
        assert_eq!(
            OutcomeKind::Success.artifact_path(dir),
            PathBuf::from("verification/success.png")
        );
        assert_eq!(
            OutcomeKind::Failure.artifact_path(dir),
            PathBuf::from("verification/failure.png")
        );
        assert_eq!(
            OutcomeKind::Error.artifact_path(dir),
            PathBuf::from("verification/error.png")
        );
    }

    #[test]
    fn test_error_routing() {
        let assertion = VerifyError::Assertion(AssertionFailure::AttributeMissing {
            name: "aria-valuenow".into(),
        });
        assert_eq!(OutcomeKind::for_error(&assertion), OutcomeKind::Failure);

        let connection = VerifyError::Connection {
            url: "http://localhost:3000".into(),
            attempts: 5,
            last_error: "refused".into(),
        };
        assert_eq!(OutcomeKind::for_error(&connection), OutcomeKind::Error);
    }

    #[test]
    fn test_exit_codes() {
        let ok = Outcome {
            kind: OutcomeKind::Success,
            error: None,
            screenshot: None,
            elapsed: Duration::ZERO,
        };
        assert_eq!(ok.exit_code(), 0);

        let failed = Outcome {
            kind: OutcomeKind::Failure,
            error: None,
            screenshot: None,
            elapsed: Duration::ZERO,
        };
        assert_eq!(failed.exit_code(), 1);
    }
}
