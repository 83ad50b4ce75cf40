use crate::error::VerifyError;
use crate::outcome::{Outcome, OutcomeKind};

/// Where progress and result lines go. Logs go through `tracing` instead.
#[derive(Clone, Copy)]
pub struct OutputHandlers {
    pub out: fn(&str),
    pub err: fn(&str),
}

impl OutputHandlers {
    pub fn stdout() -> Self {
        Self {
            out: |msg| println!("{}", msg),
            err: |msg| println!("{}", msg),
        }
    }

    pub fn silent() -> Self {
        Self {
            out: |_| {},
            err: |_| {},
        }
    }
}

impl Default for OutputHandlers {
    fn default() -> Self {
        Self::stdout()
    }
}

/// The line printed when a run ends without success.
pub fn failure_line(err: &VerifyError) -> String {
    match err {
        VerifyError::Assertion(failure) => format!("❌ FAIL: {}", failure),
        other => format!("❌ ERROR: [{}] {}", other.kind(), other),
    }
}

/// One-line summary for the end of a run.
pub fn summary_line(outcome: &Outcome) -> String {
    let verdict = match outcome.kind {
        OutcomeKind::Success => "PASS",
        OutcomeKind::Failure => "FAIL",
        OutcomeKind::Error => "ERROR",
    };
    let artifact = outcome
        .screenshot
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "none".to_string());
    format!(
        "Result: {} in {:.1}s (screenshot: {})",
        verdict,
        outcome.elapsed.as_secs_f64(),
        artifact
    )
}
