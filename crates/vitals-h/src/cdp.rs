use chromiumoxide::cdp::browser_protocol::page::{
    EventJavascriptDialogOpening, HandleJavaScriptDialogParams,
};
use chromiumoxide::cdp::js_protocol::runtime::EventConsoleApiCalled;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::task::JoinHandle;
use vitals_engine::backend::BackendError;
use vitals_engine::config::BrowserSettings;

/// One Chromium process with a single page, driven over CDP.
pub struct CdpClient {
    pub browser: Browser,
    pub handler_task: JoinHandle<()>,
    pub page: Page,
    user_data_dir: Option<PathBuf>,
    cleanup_user_data_dir: bool,
}

impl CdpClient {
    pub async fn launch(settings: &BrowserSettings) -> Result<Self, BackendError> {
        let mut config_builder = BrowserConfig::builder();
        config_builder = config_builder.no_sandbox(); // Often needed in docker/CI/restricted envs
        let (user_data_dir, cleanup_user_data_dir) = resolve_user_data_dir(settings)?;
        config_builder = config_builder.user_data_dir(&user_data_dir);

        if settings.visible {
            tracing::info!("Launching browser in visible mode");
            config_builder = config_builder.with_head();
        } else {
            tracing::info!("Launching browser in headless mode");
        }

        if let Some(chrome_bin) = resolve_chrome_bin(settings) {
            tracing::info!("Using custom Chrome binary: {}", chrome_bin.display());
            config_builder = config_builder.chrome_executable(chrome_bin);
        }

        let config = config_builder
            .build()
            .map_err(|e| BackendError::Launch(format!("invalid browser config: {}", e)))?;
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| BackendError::Launch(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if let Err(e) = h {
                    tracing::error!("Browser handler error (ignoring): {}", e);
                    continue;
                }
            }
            tracing::info!("Browser handler task ended");
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| BackendError::Launch(format!("Failed to create page: {}", e)))?;

        let mut console_events = page
            .event_listener::<EventConsoleApiCalled>()
            .await
            .map_err(|e| BackendError::Launch(format!("Failed to subscribe to console events: {}", e)))?;

        tokio::spawn(async move {
            while let Some(event) = console_events.next().await {
                let args_str: Vec<String> = event
                    .args
                    .iter()
                    .map(|arg| {
                        arg.description
                            .clone()
                            .or_else(|| arg.value.as_ref().map(|v| v.to_string()))
                            .unwrap_or_else(|| "unknown".to_string())
                    })
                    .collect();
                tracing::debug!(
                    "Browser Console [{:?}]: {}",
                    event.r#type,
                    args_str.join(" ")
                );
            }
        });

        // A dialog blocks the page's JS thread; accept it so waits keep polling.
        let mut dialog_events = page
            .event_listener::<EventJavascriptDialogOpening>()
            .await
            .map_err(|e| BackendError::Launch(format!("Failed to subscribe to dialog events: {}", e)))?;

        let page_clone = page.clone();
        tokio::spawn(async move {
            while let Some(event) = dialog_events.next().await {
                tracing::info!(
                    "Handling JavaScript Dialog: {} ({:?})",
                    event.message,
                    event.r#type
                );
                let cmd = HandleJavaScriptDialogParams::new(true);
                if let Err(e) = page_clone.execute(cmd).await {
                    tracing::error!("Failed to handle/accept dialog: {}", e);
                }
            }
        });

        Ok(Self {
            browser,
            handler_task,
            page,
            user_data_dir: Some(user_data_dir),
            cleanup_user_data_dir,
        })
    }

    pub async fn close(mut self) -> Result<(), BackendError> {
        let closed = self
            .browser
            .close()
            .await
            .map_err(|e| BackendError::Other(format!("Error closing browser: {}", e)));
        if closed.is_ok() {
            if let Err(e) = self.handler_task.await {
                tracing::debug!("Error awaiting handler: {}", e);
            }
        } else {
            self.handler_task.abort();
        }

        if self.cleanup_user_data_dir {
            if let Some(dir) = &self.user_data_dir {
                if let Err(e) = std::fs::remove_dir_all(dir) {
                    tracing::debug!("Failed to clean up user-data-dir {}: {}", dir.display(), e);
                }
            }
        }

        closed.map(|_| ())
    }
}

fn resolve_chrome_bin(settings: &BrowserSettings) -> Option<PathBuf> {
    settings
        .chrome_bin
        .clone()
        .or_else(|| std::env::var_os("CHROME_BIN").map(PathBuf::from))
}

fn resolve_user_data_dir(settings: &BrowserSettings) -> Result<(PathBuf, bool), BackendError> {
    let configured = settings
        .user_data_dir
        .clone()
        .or_else(|| std::env::var_os("VITALS_USER_DATA_DIR").map(PathBuf::from));

    if let Some(path) = configured {
        std::fs::create_dir_all(&path)
            .map_err(|e| BackendError::Launch(format!("{}: {}", path.display(), e)))?;
        tracing::info!("Using user data dir: {}", path.display());
        return Ok((path, false));
    }

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| BackendError::Launch(format!("System clock error: {}", e)))?
        .as_nanos();
    let unique = format!("vitals-chromium-profile-{}-{}", std::process::id(), nanos);
    let path = std::env::temp_dir().join(unique);
    std::fs::create_dir_all(&path)
        .map_err(|e| BackendError::Launch(format!("{}: {}", path.display(), e)))?;
    tracing::info!("Using isolated user data dir: {}", path.display());
    Ok((path, true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_profile_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let settings = BrowserSettings {
            user_data_dir: Some(dir.path().join("profile")),
            ..BrowserSettings::default()
        };
        let (path, cleanup) = resolve_user_data_dir(&settings).unwrap();
        assert_eq!(path, dir.path().join("profile"));
        assert!(path.exists());
        assert!(!cleanup);
    }

    #[test]
    fn test_configured_chrome_bin_wins() {
        let settings = BrowserSettings {
            chrome_bin: Some(PathBuf::from("/opt/chrome/chrome")),
            ..BrowserSettings::default()
        };
        assert_eq!(
            resolve_chrome_bin(&settings),
            Some(PathBuf::from("/opt/chrome/chrome"))
        );
    }
}
