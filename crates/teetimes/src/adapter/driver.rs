//! The page-driving collaborator and the bounded waits built on top of it.

use super::error::AdapterError;
use async_trait::async_trait;
use scraper::Html;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::trace;

/// A single stateful browser session.
///
/// Calls take `&mut self`: the session has one navigation state and must
/// never see two calls in flight.
#[async_trait]
pub trait PageDriver: Send {
    /// Navigates to `url` and waits for the load to settle.
    async fn goto(&mut self, url: &str) -> Result<(), AdapterError>;

    /// Serialized HTML of the current document.
    async fn content(&mut self) -> Result<String, AdapterError>;

    /// Clicks the first element matching `selector`; `false` if none matched.
    async fn click(&mut self, selector: &str) -> Result<bool, AdapterError>;

    /// Clicks the first element matching `selector` whose text contains `text`.
    async fn click_by_text(&mut self, selector: &str, text: &str) -> Result<bool, AdapterError>;

    /// Runs a script in the page and returns its JSON result.
    async fn evaluate(&mut self, script: &str) -> Result<serde_json::Value, AdapterError>;
}

/// Upper bounds for every adapter suspension point, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Loading the entry page
    pub navigation_ms: u64,
    /// Waiting for a scaffold, label or tee sheet to render
    pub ready_ms: u64,
    /// Waiting for the day label to change after a next-day request
    pub advance_ms: u64,
    /// A single click or script evaluation
    pub action_ms: u64,
    /// Delay between document polls while waiting
    pub poll_interval_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            navigation_ms: 60_000,
            ready_ms: 15_000,
            advance_ms: 10_000,
            action_ms: 5_000,
            poll_interval_ms: 250,
        }
    }
}

impl Timeouts {
    pub fn navigation(&self) -> Duration {
        Duration::from_millis(self.navigation_ms)
    }

    pub fn ready(&self) -> Duration {
        Duration::from_millis(self.ready_ms)
    }

    pub fn advance(&self) -> Duration {
        Duration::from_millis(self.advance_ms)
    }

    pub fn action(&self) -> Duration {
        Duration::from_millis(self.action_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Runs `fut` with an upper bound, turning an elapsed deadline into
/// [`AdapterError::Timeout`].
pub async fn bounded<T, F>(operation: &'static str, limit: Duration, fut: F) -> Result<T, AdapterError>
where
    F: Future<Output = Result<T, AdapterError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(AdapterError::Timeout {
            operation,
            waited: limit,
        }),
    }
}

/// Polls the current document until `probe` yields a value or `timeout`
/// elapses.
///
/// The document is re-read every `poll` interval; each snapshot is parsed
/// and dropped before the next suspension point.
pub async fn wait_for_document<T, F>(
    driver: &mut dyn PageDriver,
    operation: &'static str,
    timeout: Duration,
    poll: Duration,
    mut probe: F,
) -> Result<T, AdapterError>
where
    F: FnMut(&Html) -> Option<T> + Send,
    T: Send,
{
    let start = Instant::now();
    let mut polls = 0u32;

    let waiting = async {
        loop {
            let html = driver.content().await?;
            polls += 1;
            let found = {
                let document = Html::parse_document(&html);
                probe(&document)
            };
            if let Some(found) = found {
                trace!(operation, polls, "Document condition met");
                return Ok(found);
            }
            if start.elapsed() >= timeout {
                return Err(AdapterError::Timeout {
                    operation,
                    waited: start.elapsed(),
                });
            }
            tokio::time::sleep(poll).await;
        }
    };

    // The hard cap also covers a driver call that never returns.
    bounded(operation, timeout + poll, waiting).await
}
