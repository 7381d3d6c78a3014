//! Sequential task runner with a fixed pause between items.
//!
//! Items run one at a time, each awaited to completion before the next
//! starts. A failing item is logged and counted; it never stops the run.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Outcome counts of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Runs async work over a list of items, strictly in order.
#[derive(Debug, Clone)]
pub struct SequentialRunner {
    delay: Duration,
}

impl SequentialRunner {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    /// Run `f` for every item in order, pausing `delay` between attempts.
    pub async fn run<T, F, Fut, E>(&self, items: Vec<T>, mut f: F) -> RunSummary
    where
        F: FnMut(T) -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: Display,
    {
        let total = items.len();
        let mut summary = RunSummary::default();

        for (index, item) in items.into_iter().enumerate() {
            summary.attempted += 1;
            match f(item).await {
                Ok(()) => summary.succeeded += 1,
                Err(e) => {
                    summary.failed += 1;
                    tracing::warn!("⚠️ Item {}/{} failed: {e}", index + 1, total);
                }
            }

            if index + 1 < total && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }

        summary
    }
}

impl Default for SequentialRunner {
    fn default() -> Self {
        Self::from_millis(100)
    }
}
