use crate::locator::Locator;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct NavigationResult {
    pub url: String,
    pub title: String,
}

/// Element state a `wait_for` call polls for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitState {
    /// Present in the DOM.
    Attached,
    /// Present with a non-empty box and not hidden by CSS.
    Visible,
}

impl std::fmt::Display for WaitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WaitState::Attached => write!(f, "attached"),
            WaitState::Visible => write!(f, "visible"),
        }
    }
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Backend not ready")]
    NotReady,
    #[error("Failed to launch browser: {0}")]
    Launch(String),
    #[error("Navigation failed: {0}")]
    Navigation(String),
    #[error("Timeout {timeout_ms}ms exceeded waiting for {locator}")]
    Timeout { locator: String, timeout_ms: u64 },
    #[error("No element matches {0}")]
    ElementNotFound(String),
    #[error("Script evaluation failed: {0}")]
    Script(String),
    #[error("Screenshot failed: {0}")]
    Screenshot(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("{0}")]
    Other(String),
}

impl BackendError {
    pub fn timeout(locator: &Locator, timeout: Duration) -> Self {
        BackendError::Timeout {
            locator: locator.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, BackendError::Timeout { .. })
    }
}

/// The browser session the verifier drives.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Launch the backend (start the browser and open a page).
    async fn launch(&mut self) -> Result<(), BackendError>;

    /// Close the backend and cleanup resources. Closing twice is a no-op.
    async fn close(&mut self) -> Result<(), BackendError>;

    /// Check if the backend is ready to accept commands.
    async fn is_ready(&self) -> bool;

    /// Navigate to a specific URL.
    async fn navigate(&mut self, url: &str) -> Result<NavigationResult, BackendError>;

    /// Poll until an element matching `locator` reaches `state`, or fail with
    /// `BackendError::Timeout`.
    async fn wait_for(
        &mut self,
        locator: &Locator,
        state: WaitState,
        timeout: Duration,
    ) -> Result<(), BackendError>;

    /// Wait for the element to become visible, then click it.
    async fn click(&mut self, locator: &Locator, timeout: Duration) -> Result<(), BackendError>;

    /// Read an attribute of the first matching element.
    async fn attribute(
        &mut self,
        locator: &Locator,
        name: &str,
    ) -> Result<Option<String>, BackendError>;

    /// Capture a PNG screenshot of the current viewport.
    async fn screenshot(&mut self) -> Result<Vec<u8>, BackendError>;
}
