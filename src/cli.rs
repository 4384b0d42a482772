//! Command-line interface definitions for Headline Digest.
//!
//! Flags override the values of `config.yaml`. The completion API key is only
//! ever read from the command line or the `OPENAI_API_KEY` environment variable.

use crate::config::SentimentOrder;
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the Headline Digest application.
///
/// # Examples
///
/// ```sh
/// # Defaults from config.yaml, key from the environment
/// OPENAI_API_KEY=sk-... headline_digest -j ./json
///
/// # Local completion server, keep links from 2023, also write Markdown
/// headline_digest --api-url http://localhost:8080/v1/completions -f 2023 -j ./json -m ./md
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to config.yaml (defaults to the platform config directory)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Completion API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Completion API endpoint
    #[arg(long, env = "OPENAI_API_URL")]
    pub api_url: Option<String>,

    /// Completion model name
    #[arg(long)]
    pub model: Option<String>,

    /// News index page to scrape links from
    #[arg(long)]
    pub index_url: Option<String>,

    /// Substring a link must contain to be fetched
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Order of the sentiment pass over the summaries
    #[arg(long, value_enum)]
    pub sentiment_order: Option<SentimentOrder>,

    /// Output directory for the JSON report
    #[arg(short, long, default_value = "./digest")]
    pub json_output_dir: String,

    /// Output directory for the Markdown digest
    #[arg(short, long)]
    pub markdown_output_dir: Option<String>,
}
