//! Cooperative cancellation and per-query deadlines
//!
//! Pipeline stages are not interrupted mid-call; the query context is
//! checked between stages.

use crate::error::{Result, RetrievalError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Cancellation token shared between a caller and a running query
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Cancellation token plus optional deadline for one query
#[derive(Debug, Clone)]
pub struct QueryContext {
    cancel: CancellationToken,
    started: Instant,
    budget: Option<Duration>,
}

impl Default for QueryContext {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryContext {
    /// Context with no deadline
    pub fn new() -> Self {
        Self {
            cancel: CancellationToken::new(),
            started: Instant::now(),
            budget: None,
        }
    }

    pub fn with_timeout(mut self, budget: Duration) -> Self {
        self.budget = Some(budget);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Fail if the query was cancelled or ran past its deadline
    pub fn checkpoint(&self, stage: &str) -> Result<()> {
        if self.cancel.is_cancelled() {
            debug!("Query cancelled before {}", stage);
            return Err(RetrievalError::Cancelled);
        }
        if let Some(budget) = self.budget {
            let elapsed = self.started.elapsed();
            if elapsed > budget {
                debug!("Query deadline exceeded before {}", stage);
                return Err(RetrievalError::Timeout {
                    elapsed_ms: elapsed.as_millis() as u64,
                    budget_ms: budget.as_millis() as u64,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_clones_share_state() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_checkpoint_reports_cancellation() {
        let token = CancellationToken::new();
        let ctx = QueryContext::new().with_cancellation(token.clone());
        assert!(ctx.checkpoint("dense").is_ok());
        token.cancel();
        assert!(matches!(ctx.checkpoint("dense"), Err(RetrievalError::Cancelled)));
    }

    #[test]
    fn test_checkpoint_reports_timeout() {
        let ctx = QueryContext::new().with_timeout(Duration::from_millis(1));
        std::thread::sleep(Duration::from_millis(5));
        match ctx.checkpoint("rerank") {
            Err(RetrievalError::Timeout { budget_ms, elapsed_ms }) => {
                assert_eq!(budget_ms, 1);
                assert!(elapsed_ms >= 1);
            }
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[test]
    fn test_no_budget_never_times_out() {
        let ctx = QueryContext::new();
        assert!(ctx.checkpoint("fusion").is_ok());
    }
}
