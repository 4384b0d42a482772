//! Observable run state.
//!
//! The pipeline driver owns a [`StateHandle`] and is the only writer. Any
//! number of observers [`subscribe`](StateHandle::subscribe) and read
//! [`Snapshot`]s when they are notified of a change.

use crate::error::DigestError;
use crate::models::{ItemFailure, LogLine, Snapshot, Stage, Summary};
use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, warn};

#[derive(Debug)]
pub struct StateHandle {
    tx: watch::Sender<Snapshot>,
}

impl Default for StateHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl StateHandle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Snapshot::default());
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.tx.subscribe()
    }

    /// A copy of the current state.
    pub fn snapshot(&self) -> Snapshot {
        self.tx.borrow().clone()
    }

    /// Append a line to the status log.
    pub fn log(&self, message: impl Into<String>) {
        let message = message.into();
        debug!(%message, "status");
        self.tx.send_modify(|s| {
            s.log.push(LogLine {
                at: Utc::now(),
                message,
            })
        });
    }

    pub fn set_stage(&self, stage: Stage) {
        self.tx.send_if_modified(|s| {
            if s.stage == stage {
                return false;
            }
            s.stage = stage;
            s.in_progress = stage.is_running();
            true
        });
    }

    pub fn push_record(&self, record: Summary) {
        self.tx.send_modify(|s| s.records.push(record));
    }

    /// A copy of record `index`, if it exists.
    pub fn record(&self, index: usize) -> Option<Summary> {
        self.tx.borrow().records.get(index).cloned()
    }

    /// Set the sentiment of record `index`. Returns `false` if there is no such record.
    pub fn set_sentiment(&self, index: usize, sentiment: impl Into<String>) -> bool {
        let sentiment = sentiment.into();
        self.tx.send_if_modified(|s| match s.records.get_mut(index) {
            Some(record) => {
                record.sentiment = sentiment;
                true
            }
            None => false,
        })
    }

    /// Record a per-item failure and mention it in the status log.
    pub fn record_failure(&self, stage: Stage, item: &str, error: &DigestError) {
        warn!(stage = stage.name(), %item, %error, "Item failed; continuing");
        let failure = ItemFailure {
            stage: stage.name().to_string(),
            item: item.to_string(),
            error: error.to_string(),
        };
        self.tx.send_modify(|s| {
            s.log.push(LogLine {
                at: Utc::now(),
                message: format!("{}: {} failed: {}", stage.name(), failure.item, failure.error),
            });
            s.failures.push(failure);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_progress_follows_stage() {
        let state = StateHandle::new();
        assert!(!state.snapshot().in_progress);

        state.set_stage(Stage::FetchingIndex);
        assert!(state.snapshot().in_progress);

        state.set_stage(Stage::Summarizing(2));
        assert!(state.snapshot().in_progress);

        state.set_stage(Stage::Done);
        let snapshot = state.snapshot();
        assert!(!snapshot.in_progress);
        assert_eq!(snapshot.stage, Stage::Done);
    }

    #[test]
    fn test_set_sentiment_only_touches_sentiment() {
        let state = StateHandle::new();
        state.push_record(Summary::new("u", "Title", "Body"));

        assert!(state.set_sentiment(0, "Positive"));
        assert!(!state.set_sentiment(1, "Negative"));
        assert!(state.record(1).is_none());

        let records = state.snapshot().records;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].sentiment, "Positive");
        assert_eq!(records[0].title, "Title");
        assert_eq!(records[0].content, "Body");
    }

    #[test]
    fn test_record_failure_is_logged() {
        let state = StateHandle::new();
        state.record_failure(
            Stage::FetchingArticles(1),
            "https://x/a",
            &DigestError::Transport("timed out".into()),
        );

        let snapshot = state.snapshot();
        assert_eq!(snapshot.failures.len(), 1);
        assert_eq!(snapshot.failures[0].stage, "fetching_articles");
        assert!(snapshot.log[0].message.contains("https://x/a failed"));
    }

    #[tokio::test]
    async fn test_subscribers_are_notified() {
        let state = StateHandle::new();
        let mut rx = state.subscribe();

        state.log("getting latest news links...");
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().log.len(), 1);

        state.set_stage(Stage::FetchingIndex);
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().in_progress);
    }
}
