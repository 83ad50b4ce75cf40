use super::schema::VerifyConfig;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid target URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from default locations:
    /// 1. ./vitals.yaml
    /// 2. ~/.vitals/config.yaml
    /// 3. Default configuration
    pub async fn load_default() -> Result<VerifyConfig, ConfigError> {
        let local_config = PathBuf::from("./vitals.yaml");
        if local_config.exists() {
            return Self::load_from(&local_config).await;
        }

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".vitals").join("config.yaml");
            if home_config.exists() {
                return Self::load_from(&home_config).await;
            }
        }

        Ok(VerifyConfig::default())
    }

    pub async fn load_from(path: &Path) -> Result<VerifyConfig, ConfigError> {
        let content = tokio::fs::read_to_string(path).await?;
        let config: VerifyConfig = serde_yaml::from_str(&content)?;
        tracing::debug!("Loaded config from {}", path.display());
        Self::validate(&config)?;
        Ok(config)
    }

    pub fn validate(config: &VerifyConfig) -> Result<(), ConfigError> {
        let url = url::Url::parse(&config.target_url)?;
        if !matches!(url.scheme(), "http" | "https" | "file" | "data") {
            return Err(ConfigError::Invalid(format!(
                "unsupported scheme '{}' in targetUrl",
                url.scheme()
            )));
        }
        if config.connect_retries == 0 {
            return Err(ConfigError::Invalid(
                "connectRetries must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
