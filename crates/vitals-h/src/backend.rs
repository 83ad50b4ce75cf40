use crate::cdp::CdpClient;
use crate::locate::{self, Probe};
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::{Element, Page};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use vitals_engine::backend::{Backend, BackendError, NavigationResult, WaitState};
use vitals_engine::config::BrowserSettings;
use vitals_engine::locator::Locator;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Chromium reports unreachable hosts by loading its own error page.
const CHROME_ERROR_PREFIX: &str = "chrome-error://";

pub struct HeadlessBackend {
    client: Option<CdpClient>,
    settings: BrowserSettings,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::with_settings(BrowserSettings::default())
    }

    pub fn with_settings(settings: BrowserSettings) -> Self {
        Self {
            client: None,
            settings,
        }
    }

    fn page(&self) -> Result<&Page, BackendError> {
        self.client
            .as_ref()
            .map(|c| &c.page)
            .ok_or(BackendError::NotReady)
    }
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessBackend {
    async fn get_navigation_result(page: &Page) -> Result<NavigationResult, BackendError> {
        let title = page
            .get_title()
            .await
            .unwrap_or_default()
            .unwrap_or_default();
        let url = page
            .url()
            .await
            .map_err(|e| BackendError::Navigation(e.to_string()))?
            .unwrap_or_default();
        Ok(NavigationResult { url, title })
    }

    async fn poll(
        page: &Page,
        locator: &Locator,
        state: WaitState,
        timeout: Duration,
    ) -> Result<Probe, BackendError> {
        let deadline = Instant::now() + timeout;
        loop {
            let probe =
                Self::before_deadline(deadline, locator, timeout, locate::probe(page, locator))
                    .await?;
            if probe.satisfies(state) {
                if probe.count > 1 {
                    debug!("{} matched {} elements, using the first", locator, probe.count);
                }
                return Ok(probe);
            }
            if Instant::now() >= deadline {
                return Err(BackendError::timeout(locator, timeout));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// A page eval still in flight at the deadline counts as the wait timing out.
    async fn before_deadline<T>(
        deadline: Instant,
        locator: &Locator,
        timeout: Duration,
        eval: impl Future<Output = Result<T, BackendError>>,
    ) -> Result<T, BackendError> {
        tokio::time::timeout_at(deadline, eval)
            .await
            .unwrap_or_else(|_| Err(BackendError::timeout(locator, timeout)))
    }

    /// Tag the first match and hand it back as a CDP element.
    async fn target(page: &Page, locator: &Locator) -> Result<Element, BackendError> {
        let probe = locate::tag(page, locator).await?;
        if probe.count == 0 {
            return Err(BackendError::ElementNotFound(locator.to_string()));
        }
        page.find_element(locate::marker_selector())
            .await
            .map_err(|e| BackendError::ElementNotFound(format!("{}: {}", locator, e)))
    }

    async fn release(page: &Page) {
        if let Err(e) = locate::untag(page).await {
            debug!("Failed to clear target marker: {}", e);
        }
    }
}

#[async_trait]
impl Backend for HeadlessBackend {
    async fn launch(&mut self) -> Result<(), BackendError> {
        info!("Launching Headless Backend (Chromium)...");
        let client = CdpClient::launch(&self.settings).await?;
        self.client = Some(client);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), BackendError> {
        if let Some(client) = self.client.take() {
            client.close().await?;
            info!("Browser session closed");
        }
        Ok(())
    }

    async fn is_ready(&self) -> bool {
        self.client.is_some()
    }

    async fn navigate(&mut self, url: &str) -> Result<NavigationResult, BackendError> {
        let page = self.page()?;

        info!("Navigating to: {}", url);
        page.goto(url)
            .await
            .map_err(|e| BackendError::Navigation(e.to_string()))?;

        let result = Self::get_navigation_result(page).await?;
        if result.url.starts_with(CHROME_ERROR_PREFIX) {
            return Err(BackendError::Navigation(format!("{} is unreachable", url)));
        }
        Ok(result)
    }

    async fn wait_for(
        &mut self,
        locator: &Locator,
        state: WaitState,
        timeout: Duration,
    ) -> Result<(), BackendError> {
        let page = self.page()?;
        Self::poll(page, locator, state, timeout).await.map(|_| ())
    }

    async fn click(&mut self, locator: &Locator, timeout: Duration) -> Result<(), BackendError> {
        let page = self.page()?;
        Self::poll(page, locator, WaitState::Visible, timeout).await?;

        let element = Self::target(page, locator).await?;
        let clicked = element
            .click()
            .await
            .map(|_| ())
            .map_err(|e| BackendError::Other(format!("Click on {} failed: {}", locator, e)));
        Self::release(page).await;
        clicked
    }

    async fn attribute(
        &mut self,
        locator: &Locator,
        name: &str,
    ) -> Result<Option<String>, BackendError> {
        let page = self.page()?;
        let element = Self::target(page, locator).await?;
        let value = element.attribute(name).await.map_err(|e| {
            BackendError::Other(format!("Reading {} from {} failed: {}", name, locator, e))
        });
        Self::release(page).await;
        value
    }

    async fn screenshot(&mut self) -> Result<Vec<u8>, BackendError> {
        let page = self.page()?;
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .build();
        page.screenshot(params).await.map_err(|e| {
            warn!("Screenshot failed: {}", e);
            BackendError::Screenshot(e.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stalled_eval_reports_wait_timeout() {
        let locator = Locator::text("CODE BLUE");
        let timeout = Duration::from_millis(50);
        let stalled = std::future::pending::<Result<Probe, BackendError>>();

        let err = HeadlessBackend::before_deadline(Instant::now() + timeout, &locator, timeout, stalled)
            .await
            .expect_err("eval never completes");
        assert!(err.is_timeout(), "{:?}", err);
        assert!(err.to_string().contains("50ms"), "{}", err);
    }

    #[tokio::test]
    async fn test_eval_error_before_deadline_passes_through() {
        let locator = Locator::role("progressbar");
        let timeout = Duration::from_secs(5);
        let failing = async { Err::<Probe, _>(BackendError::Script("page crashed".into())) };

        let err = HeadlessBackend::before_deadline(Instant::now() + timeout, &locator, timeout, failing)
            .await
            .expect_err("script error");
        assert!(matches!(err, BackendError::Script(_)));
    }

    #[tokio::test]
    async fn test_finished_eval_is_returned() {
        let locator = Locator::role("progressbar");
        let timeout = Duration::from_secs(5);
        let ready = async { Ok::<_, BackendError>(Probe { count: 1, visible: true }) };

        let probe = HeadlessBackend::before_deadline(Instant::now() + timeout, &locator, timeout, ready)
            .await
            .unwrap();
        assert!(probe.satisfies(WaitState::Visible));
    }
}
