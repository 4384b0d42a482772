//! The sequential digest pipeline.
//!
//! ```text
//! Idle → FetchingIndex → FetchingArticles(n…0) → Summarizing(n…0)
//!      → AnalyzingSentiment(n…0) → Done
//! ```
//!
//! A counted stage is published with the number of queued items including the
//! one in flight, and with `0` once its queue is drained.
//!
//! Each stage moves its input into a `VecDeque` and drains it front to back in
//! a single loop: exactly one request is in flight at any time, and the next
//! stage starts only once the queue is empty. A failed index fetch ends the
//! run as [`Stage::Aborted`]; every other failure is recorded against its
//! item and the queue moves on. Cancelling the token ends the run as
//! [`Stage::Cancelled`] with whatever was produced so far.

use crate::api::{self, AskAsync};
use crate::config::{Config, SentimentOrder};
use crate::error::{DigestError, Result};
use crate::models::{Article, LinkEntry, Snapshot, Stage, Summary, EMPTY_RESPONSE};
use crate::scrapers::cnn::CnnSite;
use crate::scrapers::PageFetch;
use crate::state::StateHandle;
use std::collections::VecDeque;
use std::future::Future;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument};

/// Settings the driver needs besides its two transports.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub site: CnnSite,
    pub model: String,
    pub sentiment_order: SentimentOrder,
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            site: CnnSite::from_config(config)?,
            model: config.model.clone(),
            sentiment_order: config.sentiment_order,
        })
    }
}

pub struct Pipeline<F, A> {
    fetcher: F,
    api: A,
    settings: PipelineSettings,
    state: StateHandle,
    cancel: CancellationToken,
}

impl<F: PageFetch, A: AskAsync> Pipeline<F, A> {
    pub fn new(fetcher: F, api: A, settings: PipelineSettings, cancel: CancellationToken) -> Self {
        Self {
            fetcher,
            api,
            settings,
            state: StateHandle::new(),
            cancel,
        }
    }

    pub fn state(&self) -> &StateHandle {
        &self.state
    }

    /// Run every stage once and return the final state.
    #[instrument(level = "info", skip_all, fields(index_url = %self.settings.site.index_url()))]
    pub async fn run(&self) -> Snapshot {
        let t0 = Instant::now();
        let final_stage = match self.drive().await {
            Ok(()) => Stage::Done,
            Err(DigestError::Cancelled) => {
                self.state.log("run cancelled");
                Stage::Cancelled
            }
            Err(e) => {
                error!(error = %e, "Index fetch failed; aborting run");
                self.state.log(format!("could not get the news links: {e}"));
                Stage::Aborted
            }
        };
        self.state.set_stage(final_stage);

        let snapshot = self.state.snapshot();
        info!(
            stage = %final_stage,
            records = snapshot.records.len(),
            failures = snapshot.failures.len(),
            elapsed_ms = t0.elapsed().as_millis(),
            "Pipeline finished"
        );
        snapshot
    }

    async fn drive(&self) -> Result<()> {
        self.state.set_stage(Stage::FetchingIndex);
        self.state.log("getting latest news links...");
        let links = self
            .cancellable(self.settings.site.index_articles(&self.fetcher))
            .await?;
        for link in &links {
            self.state.log(link.clone());
        }
        self.state.log("latest news links added...");

        let articles = self.fetch_articles(links).await?;
        self.summarize_articles(articles).await?;
        self.analyze_sentiment().await
    }

    /// Race `fut` against the run's cancellation token.
    async fn cancellable<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(DigestError::Cancelled),
            result = fut => result,
        }
    }

    async fn fetch_articles(&self, links: Vec<LinkEntry>) -> Result<Vec<Article>> {
        self.state.log("getting the articles...");
        let mut queue = VecDeque::from(links);
        let mut articles = Vec::with_capacity(queue.len());

        while let Some(url) = queue.pop_front() {
            let stage = Stage::FetchingArticles(queue.len() + 1);
            self.state.set_stage(stage);

            match self
                .cancellable(self.settings.site.fetch_article(&self.fetcher, &url))
                .await
            {
                Ok(article) => {
                    if article.title.is_empty() {
                        self.state.log(format!("title not found for {url}"));
                    } else {
                        self.state.log(article.title.clone());
                    }
                    articles.push(article);
                }
                Err(DigestError::Cancelled) => return Err(DigestError::Cancelled),
                Err(e) => self.state.record_failure(stage, &url, &e),
            }
        }
        self.state.set_stage(Stage::FetchingArticles(0));

        self.state.log("articles added...");
        Ok(articles)
    }

    async fn summarize_articles(&self, articles: Vec<Article>) -> Result<()> {
        self.state.log("start article summarization...");
        let mut queue = VecDeque::from(articles);

        while let Some(article) = queue.pop_front() {
            let stage = Stage::Summarizing(queue.len() + 1);
            self.state.set_stage(stage);

            let summary = api::summarize(&self.api, &self.settings.model, &article.content);
            let content = match self.cancellable(summary).await {
                Ok(text) => text,
                Err(DigestError::Cancelled) => return Err(DigestError::Cancelled),
                Err(e) => {
                    self.state.record_failure(stage, &article.source, &e);
                    EMPTY_RESPONSE.to_string()
                }
            };

            let title = self.settings.site.clean_title(&article.title);
            self.state.push_record(Summary::new(article.source, title, content));
        }
        self.state.set_stage(Stage::Summarizing(0));

        self.state.log("articles summarized...");
        Ok(())
    }

    async fn analyze_sentiment(&self) -> Result<()> {
        self.state.log("start sentiment analysis...");
        let count = self.state.snapshot().records.len();
        let mut queue: VecDeque<usize> = match self.settings.sentiment_order {
            SentimentOrder::Reverse => (0..count).rev().collect(),
            SentimentOrder::Forward => (0..count).collect(),
        };

        while let Some(index) = queue.pop_front() {
            let stage = Stage::AnalyzingSentiment(queue.len() + 1);
            self.state.set_stage(stage);

            let Some(record) = self.state.record(index) else {
                continue;
            };
            let label = api::classify_sentiment(&self.api, &self.settings.model, &record.content);
            let sentiment = match self.cancellable(label).await {
                Ok(text) => text,
                Err(DigestError::Cancelled) => return Err(DigestError::Cancelled),
                Err(e) => {
                    self.state.record_failure(stage, &record.source, &e);
                    EMPTY_RESPONSE.to_string()
                }
            };
            self.state.set_sentiment(index, sentiment);
        }
        self.state.set_stage(Stage::AnalyzingSentiment(0));

        self.state.log("sentiment analysis done...");
        Ok(())
    }
}
