//! Data models for scraped articles, summaries and the observable run state.
//!
//! This module defines the core data structures used throughout the application:
//! - [`LinkEntry`]: an article URL discovered on the index page
//! - [`Article`]: a fetched article before it reaches the completion API
//! - [`Summary`]: a summarized article, later labelled with a sentiment
//! - [`Stage`], [`LogLine`], [`ItemFailure`], [`Snapshot`]: the live state of a run
//! - [`DigestReport`]: the serialized form written to disk at the end of a run

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentiment value of a summary that has not been through the sentiment stage.
pub const NOT_ANALYZED: &str = "Not analyzed";

/// Stored in place of completion text when the API yields nothing usable.
pub const EMPTY_RESPONSE: &str = "empty response";

/// An absolute article URL produced by the index fetch.
pub type LinkEntry = String;

/// A fetched article.
///
/// Produced by the article fetch stage and consumed by summarization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    /// The URL the article was fetched from.
    pub source: String,
    /// Text of the page's `<title>` element, empty when the page has none.
    pub title: String,
    /// Whitespace-normalised text of the article body region.
    pub content: String,
}

/// A summarized article.
///
/// Everything but `sentiment` is fixed once summarization appends the record;
/// the sentiment stage only ever rewrites `sentiment`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// The URL of the article this summary was produced from.
    pub source: String,
    /// Cleaned article title.
    pub title: String,
    /// Summary text returned by the completion API.
    pub content: String,
    /// Sentiment label, [`NOT_ANALYZED`] until labelled.
    pub sentiment: String,
}

impl Summary {
    pub fn new(
        source: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            title: title.into(),
            content: content.into(),
            sentiment: NOT_ANALYZED.to_string(),
        }
    }
}

/// Where a run currently is.
///
/// The counted variants carry the number of items still queued for the
/// stage, including the one in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stage", content = "remaining", rename_all = "snake_case")]
pub enum Stage {
    Idle,
    FetchingIndex,
    FetchingArticles(usize),
    Summarizing(usize),
    AnalyzingSentiment(usize),
    Done,
    /// The index fetch failed; nothing else ran.
    Aborted,
    Cancelled,
}

impl Stage {
    /// Short stable name, used when recording failures.
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Idle => "idle",
            Stage::FetchingIndex => "fetching_index",
            Stage::FetchingArticles(_) => "fetching_articles",
            Stage::Summarizing(_) => "summarizing",
            Stage::AnalyzingSentiment(_) => "analyzing_sentiment",
            Stage::Done => "done",
            Stage::Aborted => "aborted",
            Stage::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Done | Stage::Aborted | Stage::Cancelled)
    }

    pub fn is_running(&self) -> bool {
        !self.is_terminal() && *self != Stage::Idle
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::FetchingArticles(n) | Stage::Summarizing(n) | Stage::AnalyzingSentiment(n) => {
                write!(f, "{} ({} left)", self.name(), n)
            }
            _ => f.write_str(self.name()),
        }
    }
}

/// One line of the status/progress log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogLine {
    pub at: DateTime<Utc>,
    pub message: String,
}

/// A per-item error that was recorded instead of stopping the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFailure {
    /// [`Stage::name`] of the stage the item failed in.
    pub stage: String,
    /// The URL or title identifying the item.
    pub item: String,
    pub error: String,
}

/// The full observable state of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub stage: Stage,
    pub log: Vec<LogLine>,
    pub records: Vec<Summary>,
    pub failures: Vec<ItemFailure>,
    pub in_progress: bool,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            stage: Stage::Idle,
            log: Vec::new(),
            records: Vec::new(),
            failures: Vec::new(),
            in_progress: false,
        }
    }
}

/// The result of one run as written to the JSON and Markdown outputs.
#[derive(Debug, Serialize, Deserialize)]
pub struct DigestReport {
    /// The date of the run in `YYYY-MM-DD` format.
    pub local_date: String,
    /// The local time the report was produced, `HH:MM:SS`.
    pub local_time: String,
    pub stage: Stage,
    pub records: Vec<Summary>,
    pub failures: Vec<ItemFailure>,
    pub log: Vec<LogLine>,
}

impl DigestReport {
    pub fn from_snapshot(snapshot: Snapshot, now: DateTime<Local>) -> Self {
        Self {
            local_date: now.date_naive().to_string(),
            local_time: now.format("%H:%M:%S").to_string(),
            stage: snapshot.stage,
            records: snapshot.records,
            failures: snapshot.failures,
            log: snapshot.log,
        }
    }
}
