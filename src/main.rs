use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use feedwash::config::{BodyMode, Config};
use feedwash::fetch::HttpFetcher;
use feedwash::publish::write_atomic;
use feedwash::serialize::error_payload;

/// feedwash - rewrite a third-party RSS feed into a clean static feed
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Source feed URL (defaults to the built-in source)
    #[arg(short = 's', long = "source")]
    source: Option<String>,

    /// Where to write the feed (defaults to public/feed.xml)
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Canonical address of the published feed
    #[arg(long = "self-url")]
    self_url: Option<String>,

    /// Timeout in milliseconds for network requests (default: 10000)
    #[arg(short = 't', long = "timeout-ms")]
    timeout_ms: Option<u64>,

    /// Emit item bodies as sanitized HTML instead of plain text
    #[arg(long = "html-body")]
    html_body: bool,
}

impl Args {
    fn into_config(self) -> Config {
        let mut config = Config::default();
        if let Some(source) = self.source {
            config.source_url = source;
        }
        if let Some(output) = self.output {
            config.output_path = output;
        }
        if let Some(self_url) = self.self_url {
            config.self_url = self_url;
        }
        if let Some(ms) = self.timeout_ms {
            config.timeout = Duration::from_millis(ms);
        }
        if self.html_body {
            config.body_mode = BodyMode::Html;
        }
        config
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = Args::parse().into_config();

    match run(&config) {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            let message = format!("{e:#}");
            error!(error = %message, "feed rewrite failed");
            if let Err(write_err) = write_atomic(&config.output_path, &error_payload(&message)) {
                error!(error = %write_err, path = %config.output_path.display(), "could not write error payload");
            }
            std::process::exit(4);
        }
    }
}

fn run(config: &Config) -> Result<()> {
    let fetcher = HttpFetcher::new(config).context("failed to build HTTP client")?;
    let feed = feedwash::run(config, &fetcher)?;
    write_atomic(&config.output_path, &feed)
        .with_context(|| format!("failed to write '{}'", config.output_path.display()))?;
    info!(path = %config.output_path.display(), bytes = feed.len(), "feed published");
    Ok(())
}
