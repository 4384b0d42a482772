//! # Headline Digest
//!
//! Scrapes a news index page, summarizes every linked article through a
//! text-completion API and labels the sentiment of each summary.
//!
//! ## Usage
//!
//! ```sh
//! OPENAI_API_KEY=sk-... headline_digest -j ./json -m ./markdown
//! ```
//!
//! ## Architecture
//!
//! The application follows a strictly sequential pipeline:
//! 1. **Indexing**: collect the article links of the index page that contain the filter token
//! 2. **Fetching**: download each article, one at a time
//! 3. **Summarizing**: one completion request per article
//! 4. **Sentiment**: one completion request per summary, last summary first
//! 5. **Output**: JSON report and optional Markdown digest
//!
//! Progress is published through [`state::StateHandle`] and printed live.

use chrono::Local;
use clap::Parser;
use reqwest::Client;
use std::error::Error;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod api;
mod cli;
mod config;
mod error;
mod models;
mod outputs;
mod pipeline;
mod retry;
mod scrapers;
mod state;
#[cfg(test)]
mod test_server;
mod utils;

use api::CompletionClient;
use cli::Cli;
use config::Config;
use error::DigestError;
use models::DigestReport;
use outputs::{json, markdown, progress};
use pipeline::{Pipeline, PipelineSettings};
use retry::{RetryPolicy, Retrying};
use scrapers::HttpFetcher;
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("headline_digest starting up");

    let args = Cli::parse();
    debug!(?args.json_output_dir, ?args.markdown_output_dir, "Parsed CLI arguments");

    // --- Configuration ---
    let config_path = args.config.clone().or_else(Config::default_path);
    let mut config = match &config_path {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    config.apply_cli(&args);
    info!(
        api_url = %config.api_url,
        index_url = %config.index_url,
        model = %config.model,
        "Configuration ready"
    );

    let api_key = args
        .api_key
        .clone()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| {
            DigestError::Config("no API key: pass --api-key or set OPENAI_API_KEY".into())
        })?;

    // Early check: output dirs must be writable before spending API calls
    if let Err(e) = ensure_writable_dir(&args.json_output_dir).await {
        error!(path = %args.json_output_dir, error = %e, "JSON output directory is not writable");
        return Err(e.into());
    }

    // --- Transports ---
    let http = Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()?;
    let policy = RetryPolicy::from(&config);
    let fetcher = Retrying::new(HttpFetcher::new(http.clone()), policy);
    let completions = Retrying::new(CompletionClient::new(http, &config.api_url, api_key), policy);

    // --- Cancellation on Ctrl-C ---
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received; cancelling run");
                cancel.cancel();
            }
        });
    }

    // --- Run ---
    let settings = PipelineSettings::from_config(&config)?;
    let pipeline = Pipeline::new(fetcher, completions, settings, cancel);
    let reporter = tokio::spawn(progress::report_progress(
        pipeline.state().subscribe(),
        std::io::stdout(),
    ));

    let snapshot = pipeline.run().await;
    drop(pipeline);
    if let Err(e) = reporter.await {
        warn!(error = %e, "Progress reporter ended abnormally");
    }

    // --- Output ---
    let report = DigestReport::from_snapshot(snapshot, Local::now());
    if let Err(e) = json::write_report(&report, &args.json_output_dir).await {
        error!(error = %e, "Failed to write JSON report");
    }

    if let Some(dir) = &args.markdown_output_dir {
        if let Err(e) = markdown::write_markdown(&report, dir).await {
            error!(path = %dir, error = %e, "Failed to write Markdown digest");
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        stage = %report.stage,
        records = report.records.len(),
        failures = report.failures.len(),
        "Execution complete"
    );

    Ok(())
}
