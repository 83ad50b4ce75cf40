use chromiumoxide::Page;
use serde::Deserialize;
use serde_json::json;
use std::future::Future;
use std::time::Duration;
use vitals_engine::backend::{BackendError, WaitState};
use vitals_engine::locator::Locator;

const LOCATE_JS: &str = include_str!("locate.js");

/// Attribute put on the element an action is about to touch, so CDP can
/// find it again with a plain selector.
pub const TARGET_MARKER: &str = "data-vitals-target";

/// Timeout for a single locate evaluation.
/// This prevents hanging when dialogs (alert/confirm/prompt) block the JS thread.
const EVAL_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum retries for context errors during page navigation.
const MAX_CONTEXT_RETRIES: u32 = 10;

const CONTEXT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// What the locate script saw for one locator.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
pub struct Probe {
    pub count: usize,
    /// Visibility of the first match.
    pub visible: bool,
}

impl Probe {
    pub fn satisfies(&self, state: WaitState) -> bool {
        match state {
            WaitState::Attached => self.count > 0,
            WaitState::Visible => self.count > 0 && self.visible,
        }
    }
}

/// Check if an error indicates the page context is unavailable (e.g., during navigation).
fn is_context_error(err: &str) -> bool {
    err.contains("Cannot find context")
        || err.contains("Execution context was destroyed")
        || err.contains("-32000")
}

/// Retry an async operation that may fail due to context errors during page navigation.
/// Returns immediately on success or non-context errors; retries only on context errors.
async fn retry_on_context_error<T, F, Fut>(
    operation_name: &str,
    mut operation: F,
) -> Result<T, BackendError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, EvalError>>,
{
    let mut last_error = None;

    for attempt in 0..MAX_CONTEXT_RETRIES {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(EvalError::Context(err_str)) => {
                tracing::debug!(
                    "{} context error (attempt {}/{}), retrying...",
                    operation_name,
                    attempt + 1,
                    MAX_CONTEXT_RETRIES
                );
                last_error = Some(err_str);
                tokio::time::sleep(CONTEXT_RETRY_DELAY).await;
            }
            Err(EvalError::Timeout) => {
                return Err(BackendError::Script(format!(
                    "{} timed out - possibly blocked by a dialog (alert/confirm/prompt)",
                    operation_name
                )));
            }
            Err(EvalError::Other(err_str)) => {
                return Err(BackendError::Script(format!(
                    "{} failed: {}",
                    operation_name, err_str
                )));
            }
        }
    }

    Err(BackendError::Script(last_error.unwrap_or_else(|| {
        format!("{} failed after retries", operation_name)
    })))
}

fn build_expression(locator: &Locator, action: &str) -> Result<String, BackendError> {
    let query = locator.to_js_query()?;
    let op = json!({ "action": action, "marker": TARGET_MARKER });
    Ok(format!("({})({}, {})", LOCATE_JS.trim(), query, op))
}

async fn run_locate(page: &Page, expression: &str) -> Result<Probe, EvalError> {
    let value = evaluate_with_timeout(page, expression).await?;
    serde_json::from_value(value)
        .map_err(|e| EvalError::Other(format!("Unexpected locate result: {}", e)))
}

/// Count matches for `locator` and check the first one's visibility.
pub async fn probe(page: &Page, locator: &Locator) -> Result<Probe, BackendError> {
    let expression = build_expression(locator, "probe")?;
    let expression = expression.as_str();
    retry_on_context_error("Locate", || run_locate(page, expression)).await
}

/// Mark the first match with [`TARGET_MARKER`], clearing any earlier mark.
pub async fn tag(page: &Page, locator: &Locator) -> Result<Probe, BackendError> {
    let expression = build_expression(locator, "tag")?;
    let expression = expression.as_str();
    retry_on_context_error("Tag", || run_locate(page, expression)).await
}

/// Remove every [`TARGET_MARKER`] from the page.
pub async fn untag(page: &Page) -> Result<(), BackendError> {
    let expression = build_expression(&Locator::css(marker_selector()), "untag")?;
    let expression = expression.as_str();
    retry_on_context_error("Untag", || run_locate(page, expression))
        .await
        .map(|_| ())
}

pub fn marker_selector() -> String {
    format!("[{}]", TARGET_MARKER)
}

enum EvalError {
    Timeout,
    Context(String),
    Other(String),
}

async fn evaluate_with_timeout(
    page: &Page,
    expression: &str,
) -> Result<serde_json::Value, EvalError> {
    let eval_result = tokio::time::timeout(EVAL_TIMEOUT, page.evaluate(expression)).await;

    match eval_result {
        Err(_) => Err(EvalError::Timeout),
        Ok(Err(e)) => {
            let err_str = e.to_string();
            if is_context_error(&err_str) {
                Err(EvalError::Context(err_str))
            } else {
                Err(EvalError::Other(err_str))
            }
        }
        Ok(Ok(remote_object)) => remote_object
            .into_value::<serde_json::Value>()
            .map_err(|e| EvalError::Other(format!("Failed to get result: {}", e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_states() {
        let hidden = Probe {
            count: 1,
            visible: false,
        };
        assert!(hidden.satisfies(WaitState::Attached));
        assert!(!hidden.satisfies(WaitState::Visible));

        let none = Probe::default();
        assert!(!none.satisfies(WaitState::Attached));
    }

    #[test]
    fn test_expression_embeds_query() {
        let expr = build_expression(&Locator::role("progressbar"), "tag").unwrap();
        assert!(expr.starts_with("((function (query, op)"));
        assert!(expr.contains(r#"{"kind":"role","role":"progressbar"}"#));
        assert!(expr.contains(r#""marker":"data-vitals-target""#));
    }

    #[test]
    fn test_context_errors() {
        assert!(is_context_error("Execution context was destroyed."));
        assert!(!is_context_error("ReferenceError: foo is not defined"));
    }
}
