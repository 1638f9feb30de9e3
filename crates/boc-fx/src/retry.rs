//! Bounded retries for the site's "rejected" responses.
//!
//! The site occasionally refuses a perfectly valid search or page change.
//! Every loop that resubmits in response draws from an [`Attempts`] budget:
//! each retry waits an exponentially growing backoff, and the budget ends
//! with [`ScrapeError::RecoveryExhausted`]. A [`CancellationToken`] interrupts
//! the wait at any point.

use crate::error::{ScrapeError, ScrapeResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// How many times, and how patiently, to retry a rejected action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries allowed for one search or one page-recovery episode.
    pub max_attempts: u32,
    /// Backoff before the first retry.
    pub initial_backoff_ms: u64,
    /// Upper bound for the doubled backoff.
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 50,
            initial_backoff_ms: 250,
            max_backoff_ms: 5_000,
        }
    }
}

impl RetryPolicy {
    /// Retry without waiting between attempts.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_backoff_ms: 0,
            max_backoff_ms: 0,
        }
    }

    /// Backoff before the `attempt`-th retry (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(20);
        let ms = self
            .initial_backoff_ms
            .saturating_mul(1u64 << shift)
            .min(self.max_backoff_ms);
        Duration::from_millis(ms)
    }

    /// Start a fresh budget for one episode.
    pub fn attempts(&self, during: impl Into<String>, cancel: &CancellationToken) -> Attempts {
        Attempts {
            policy: *self,
            cancel: cancel.clone(),
            during: during.into(),
            used: 0,
        }
    }
}

/// Retry budget of a single episode.
#[derive(Debug)]
pub struct Attempts {
    policy: RetryPolicy,
    cancel: CancellationToken,
    during: String,
    used: u32,
}

impl Attempts {
    /// Consume one retry, waiting out its backoff.
    pub async fn next(&mut self) -> ScrapeResult<()> {
        ensure_not_cancelled(&self.cancel)?;
        if self.used >= self.policy.max_attempts {
            return Err(ScrapeError::RecoveryExhausted {
                during: self.during.clone(),
                attempts: self.used,
            });
        }
        self.used += 1;

        let delay = self.policy.backoff(self.used);
        if !delay.is_zero() {
            tokio::select! {
                _ = self.cancel.cancelled() => return Err(ScrapeError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }
        Ok(())
    }

    pub fn used(&self) -> u32 {
        self.used
    }
}

/// Fail with [`ScrapeError::Cancelled`] once the token has fired.
pub fn ensure_not_cancelled(cancel: &CancellationToken) -> ScrapeResult<()> {
    if cancel.is_cancelled() {
        Err(ScrapeError::Cancelled)
    } else {
        Ok(())
    }
}
