use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyConfig {
    #[serde(default = "default_target_url")]
    pub target_url: String,
    #[serde(default = "default_connect_retries")]
    pub connect_retries: u32,
    #[serde(default = "default_connect_retry_delay_seconds")]
    pub connect_retry_delay_seconds: u64,
    /// Waits for whole screens (main menu, exam start screen).
    #[serde(default = "default_selector_timeout_ms")]
    pub selector_timeout_ms: u64,
    /// Wait for the progress element to become visible.
    #[serde(default = "default_visible_timeout_ms")]
    pub visible_timeout_ms: u64,
    /// Auto-wait before a click gives up.
    #[serde(default = "default_action_timeout_ms")]
    pub action_timeout_ms: u64,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub browser: BrowserSettings,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            target_url: default_target_url(),
            connect_retries: default_connect_retries(),
            connect_retry_delay_seconds: default_connect_retry_delay_seconds(),
            selector_timeout_ms: default_selector_timeout_ms(),
            visible_timeout_ms: default_visible_timeout_ms(),
            action_timeout_ms: default_action_timeout_ms(),
            output_dir: default_output_dir(),
            browser: BrowserSettings::default(),
        }
    }
}

impl VerifyConfig {
    pub fn connect_retry_delay(&self) -> Duration {
        Duration::from_secs(self.connect_retry_delay_seconds)
    }

    pub fn selector_timeout(&self) -> Duration {
        Duration::from_millis(self.selector_timeout_ms)
    }

    pub fn visible_timeout(&self) -> Duration {
        Duration::from_millis(self.visible_timeout_ms)
    }

    pub fn action_timeout(&self) -> Duration {
        Duration::from_millis(self.action_timeout_ms)
    }
}

fn default_target_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_connect_retries() -> u32 {
    5
}

fn default_connect_retry_delay_seconds() -> u64 {
    2
}

fn default_selector_timeout_ms() -> u64 {
    10000
}

fn default_visible_timeout_ms() -> u64 {
    5000
}

fn default_action_timeout_ms() -> u64 {
    30000
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("verification")
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserSettings {
    /// Launch with a window instead of headless.
    #[serde(default)]
    pub visible: bool,
    #[serde(default)]
    pub chrome_bin: Option<PathBuf>,
    /// Persistent profile directory. A throwaway one is used when unset.
    #[serde(default)]
    pub user_data_dir: Option<PathBuf>,
}
