use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::NamedTempFile;
use vitals_engine::config::{ConfigError, ConfigLoader, VerifyConfig};

#[test]
fn test_default_values() {
    let config = VerifyConfig::default();
    assert_eq!(config.target_url, "http://localhost:3000");
    assert_eq!(config.connect_retries, 5);
    assert_eq!(config.connect_retry_delay(), Duration::from_secs(2));
    assert_eq!(config.selector_timeout(), Duration::from_millis(10000));
    assert_eq!(config.visible_timeout(), Duration::from_millis(5000));
    assert_eq!(config.output_dir, PathBuf::from("verification"));
    assert!(!config.browser.visible);
    assert!(ConfigLoader::validate(&config).is_ok());
}

#[tokio::test]
async fn test_load_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
targetUrl: "http://127.0.0.1:8080"
connectRetries: 3
selectorTimeoutMs: 2500
browser:
  visible: true
  chromeBin: /usr/bin/chromium
"#
    )
    .unwrap();

    let config = ConfigLoader::load_from(file.path())
        .await
        .expect("Failed to load config from file");

    assert_eq!(config.target_url, "http://127.0.0.1:8080");
    assert_eq!(config.connect_retries, 3);
    assert_eq!(config.selector_timeout_ms, 2500);
    // Unset keys keep their defaults.
    assert_eq!(config.connect_retry_delay_seconds, 2);
    assert_eq!(config.visible_timeout_ms, 5000);
    assert!(config.browser.visible);
    assert_eq!(
        config.browser.chrome_bin,
        Some(PathBuf::from("/usr/bin/chromium"))
    );
}

#[tokio::test]
async fn test_load_from_nonexistent_file() {
    let result =
        ConfigLoader::load_from(std::path::Path::new("/nonexistent/path/vitals.yaml")).await;
    assert!(matches!(result, Err(ConfigError::Io(_))));
}

#[tokio::test]
async fn test_load_malformed_yaml() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "connectRetries: [not, a, number]").unwrap();

    let result = ConfigLoader::load_from(file.path()).await;
    assert!(matches!(result, Err(ConfigError::Parse(_))));
}

#[test]
fn test_rejects_bad_url() {
    let config = VerifyConfig {
        target_url: "localhost 3000".into(),
        ..VerifyConfig::default()
    };
    assert!(matches!(
        ConfigLoader::validate(&config),
        Err(ConfigError::InvalidUrl(_))
    ));

    let config = VerifyConfig {
        target_url: "ftp://localhost/".into(),
        ..VerifyConfig::default()
    };
    assert!(matches!(
        ConfigLoader::validate(&config),
        Err(ConfigError::Invalid(_))
    ));
}

#[test]
fn test_rejects_zero_retries() {
    let config = VerifyConfig {
        connect_retries: 0,
        ..VerifyConfig::default()
    };
    assert!(matches!(
        ConfigLoader::validate(&config),
        Err(ConfigError::Invalid(_))
    ));
}
