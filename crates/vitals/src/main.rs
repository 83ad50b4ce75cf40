use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use vitals_engine::cli::{OutputHandlers, summary_line};
use vitals_engine::config::{ConfigLoader, VerifyConfig};
use vitals_engine::verifier::Verifier;
use vitals_h::backend::HeadlessBackend;

#[derive(Parser, Debug)]
#[command(
    name = "vitals",
    version,
    about = "Verify the exam timer progress bar of a running Code Blue instance"
)]
struct Args {
    /// Config file (defaults: ./vitals.yaml, then ~/.vitals/config.yaml)
    #[arg(long, env = "VITALS_CONFIG")]
    config: Option<PathBuf>,

    /// Application URL to verify
    #[arg(long)]
    url: Option<String>,

    /// Directory the screenshot is written to
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Connection attempts before giving up
    #[arg(long)]
    retries: Option<u32>,

    /// Launch browser in visible mode (not headless)
    #[arg(long)]
    visible: bool,
}

impl Args {
    fn apply(&self, config: &mut VerifyConfig) {
        if let Some(url) = &self.url {
            config.target_url = url.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(retries) = self.retries {
            config.connect_retries = retries;
        }
        if self.visible {
            config.browser.visible = true;
        }
    }
}

async fn load_config(args: &Args) -> anyhow::Result<VerifyConfig> {
    let mut config = match &args.config {
        Some(path) => ConfigLoader::load_from(path)
            .await
            .with_context(|| format!("loading {}", path.display()))?,
        None => ConfigLoader::load_default().await?,
    };
    args.apply(&mut config);
    ConfigLoader::validate(&config)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Logs go to stderr; stdout carries the progress and result lines.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = load_config(&args).await?;
    tracing::info!("Verifying {}", config.target_url);

    let backend = HeadlessBackend::with_settings(config.browser.clone());
    let mut verifier = Verifier::new(backend, config).with_output(OutputHandlers::stdout());
    let outcome = verifier.run().await;

    println!("{}", summary_line(&outcome));
    Ok(outcome.process_exit_code())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let args = Args::parse_from([
            "vitals",
            "--url",
            "http://127.0.0.1:4000",
            "--output-dir",
            "shots",
            "--retries",
            "2",
            "--visible",
        ]);
        let mut config = VerifyConfig::default();
        args.apply(&mut config);

        assert_eq!(config.target_url, "http://127.0.0.1:4000");
        assert_eq!(config.output_dir, PathBuf::from("shots"));
        assert_eq!(config.connect_retries, 2);
        assert!(config.browser.visible);
    }

    #[test]
    fn test_no_flags_keep_config() {
        let args = Args::parse_from(["vitals"]);
        let mut config = VerifyConfig::default();
        args.apply(&mut config);

        assert_eq!(config.target_url, "http://localhost:3000");
        assert_eq!(config.connect_retries, 5);
        assert!(!config.browser.visible);
    }
}
