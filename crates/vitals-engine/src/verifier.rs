use crate::backend::Backend;
use crate::cli::{OutputHandlers, failure_line};
use crate::config::VerifyConfig;
use crate::error::{AssertionFailure, VerifyError};
use crate::flow::{Expectation, Flow, FlowStep, Step};
use crate::locator::Locator;
use crate::outcome::{Outcome, OutcomeKind};
use std::path::PathBuf;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Runs one verification pass against a backend.
///
/// The backend is launched at the start of `run` and closed before it
/// returns, whichever way the run ends.
pub struct Verifier<B: Backend> {
    backend: B,
    config: VerifyConfig,
    flow: Flow,
    output: OutputHandlers,
}

impl<B: Backend> Verifier<B> {
    pub fn new(backend: B, config: VerifyConfig) -> Self {
        let flow = Flow::progressbar(&config);
        Self {
            backend,
            config,
            flow,
            output: OutputHandlers::stdout(),
        }
    }

    pub fn with_output(mut self, output: OutputHandlers) -> Self {
        self.output = output;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    pub async fn run(&mut self) -> Outcome {
        let started = Instant::now();
        info!("Starting verification flow '{}'", self.flow.name);

        if let Err(e) = self.backend.launch().await {
            let err = VerifyError::Unexpected(format!("Failed to launch browser: {}", e));
            (self.output.err)(&failure_line(&err));
            return Outcome {
                kind: OutcomeKind::Error,
                error: Some(err),
                screenshot: None,
                elapsed: started.elapsed(),
            };
        }

        let (mut kind, mut error) = match self.drive().await {
            Ok(()) => {
                (self.output.out)(&format!("✅ SUCCESS: {}", self.flow.success_message));
                (OutcomeKind::Success, None)
            }
            Err(e) => {
                (self.output.err)(&failure_line(&e));
                (OutcomeKind::for_error(&e), Some(e))
            }
        };

        let screenshot = match self.capture(kind).await {
            Ok(path) => Some(path),
            Err(e) if kind == OutcomeKind::Error => {
                warn!("Screenshot on error failed (ignored): {}", e);
                None
            }
            Err(e) => {
                // Losing the success/failure artifact breaks the run.
                let err = VerifyError::Unexpected(format!("Failed to save screenshot: {}", e));
                (self.output.err)(&failure_line(&err));
                kind = OutcomeKind::Error;
                error = Some(err);
                match self.capture(kind).await {
                    Ok(path) => Some(path),
                    Err(e) => {
                        warn!("Screenshot on error failed (ignored): {}", e);
                        None
                    }
                }
            }
        };

        if let Err(e) = self.backend.close().await {
            warn!("Failed to close browser session: {}", e);
        }

        Outcome {
            kind,
            error,
            screenshot,
            elapsed: started.elapsed(),
        }
    }

    async fn drive(&mut self) -> Result<(), VerifyError> {
        self.connect().await?;

        for FlowStep { message, step } in &self.flow.steps {
            (self.output.out)(message);
            execute_step(&mut self.backend, self.output, message, step).await?;
        }
        Ok(())
    }

    async fn connect(&mut self) -> Result<(), VerifyError> {
        (self.output.out)("Navigating to homepage...");

        let url = &self.config.target_url;
        let attempts = self.config.connect_retries.max(1);
        let delay = self.config.connect_retry_delay();
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            match self.backend.navigate(url).await {
                Ok(nav) => {
                    info!("Connected to {} (title: '{}')", nav.url, nav.title);
                    return Ok(());
                }
                Err(e) => {
                    debug!("Connection attempt {}/{} failed: {}", attempt, attempts, e);
                    last_error = e.to_string();
                    if attempt < attempts {
                        (self.output.out)(&format!(
                            "Connection attempt {} failed, retrying in {}s...",
                            attempt,
                            delay.as_secs()
                        ));
                        tokio::time::sleep(delay).await;
                    } else {
                        (self.output.out)(&format!("Connection attempt {} failed", attempt));
                    }
                }
            }
        }

        Err(VerifyError::Connection {
            url: url.clone(),
            attempts,
            last_error,
        })
    }

    async fn capture(&mut self, kind: OutcomeKind) -> Result<PathBuf, String> {
        let path = kind.artifact_path(&self.config.output_dir);
        let bytes = self.backend.screenshot().await.map_err(|e| e.to_string())?;
        tokio::fs::create_dir_all(&self.config.output_dir)
            .await
            .map_err(|e| format!("{}: {}", self.config.output_dir.display(), e))?;
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| format!("{}: {}", path.display(), e))?;
        info!("Screenshot saved to {}", path.display());
        Ok(path)
    }
}

async fn execute_step<B: Backend>(
    backend: &mut B,
    output: OutputHandlers,
    message: &str,
    step: &Step,
) -> Result<(), VerifyError> {
    match step {
        Step::WaitFor {
            locator,
            state,
            timeout,
        } => {
            debug!("Waiting up to {:?} for {} to be {}", timeout, locator, state);
            backend
                .wait_for(locator, *state, *timeout)
                .await
                .map_err(|e| VerifyError::from_backend(message, e))
        }
        Step::Click { locator, timeout } => {
            debug!("Clicking {}", locator);
            backend
                .click(locator, *timeout)
                .await
                .map_err(|e| VerifyError::from_backend(message, e))
        }
        Step::Inspect {
            locator,
            expectations,
        } => {
            let mut values = Vec::with_capacity(expectations.len());
            for expectation in expectations {
                let name = expectation.attribute();
                let value = backend
                    .attribute(locator, name)
                    .await
                    .map_err(|e| VerifyError::from_backend(message, e))?;
                values.push(value);
            }

            (output.out)(&describe_found(locator, expectations, &values));

            for (expectation, actual) in expectations.iter().zip(&values) {
                check(expectation, actual.as_deref())?;
            }
            Ok(())
        }
    }
}

fn check(expectation: &Expectation, actual: Option<&str>) -> Result<(), AssertionFailure> {
    match expectation {
        Expectation::AttributeEquals { name, expected } => {
            if actual == Some(expected.as_str()) {
                Ok(())
            } else {
                Err(AssertionFailure::AttributeMismatch {
                    name: name.clone(),
                    expected: expected.clone(),
                    actual: actual.map(str::to_string),
                })
            }
        }
        Expectation::AttributePresent { name } => match actual {
            Some(value) if !value.is_empty() => Ok(()),
            _ => Err(AssertionFailure::AttributeMissing { name: name.clone() }),
        },
    }
}

/// `Found [role='progressbar'] with aria-label='Time Remaining' and aria-valuenow='42'`
pub fn describe_found(
    locator: &Locator,
    expectations: &[Expectation],
    values: &[Option<String>],
) -> String {
    let attrs: Vec<String> = expectations
        .iter()
        .zip(values)
        .map(|(e, v)| format!("{}='{}'", e.attribute(), v.as_deref().unwrap_or("None")))
        .collect();
    format!("Found {} with {}", locator, attrs.join(" and "))
}
