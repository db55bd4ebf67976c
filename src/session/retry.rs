// src/session/retry.rs
// =============================================================================
// Bounded retry for idempotent GETs.
//
// A request is attempted again when:
// - the server answers with one of the transient statuses (500/502/503/504)
// - the transport fails in a way that might not happen twice (timeout,
//   refused/reset connection)
//
// Backoff doubles per retry: the first retry goes out immediately, retry n
// waits backoff_factor * 2^(n-1). Once the budget is spent the last response
// or error is handed back unchanged.
// =============================================================================

use super::Page;
use crate::error::FetchError;
use std::future::Future;
use std::time::Duration;
use tracing::trace;

pub const TRANSIENT_STATUSES: [u16; 4] = [500, 502, 503, 504];

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Additional attempts after the first one.
    pub max_retries: u32,
    pub backoff_factor: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            backoff_factor: Duration::from_millis(300),
            max_backoff: Duration::from_secs(120),
        }
    }
}

impl RetryPolicy {
    pub fn with_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (1-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        if retry <= 1 {
            return Duration::ZERO;
        }
        let factor = 2u32.saturating_pow(retry - 1);
        self.backoff_factor
            .saturating_mul(factor)
            .min(self.max_backoff)
    }

    fn retries_status(status: u16) -> bool {
        TRANSIENT_STATUSES.contains(&status)
    }

    /// Runs `attempt` until it gives a final answer or the budget runs out.
    pub async fn run<Op, Fut>(&self, mut attempt: Op) -> Result<Page, FetchError>
    where
        Op: FnMut() -> Fut,
        Fut: Future<Output = Result<Page, FetchError>>,
    {
        let mut retry = 0;
        loop {
            let result = attempt().await;

            let again = match &result {
                Ok(page) => Self::retries_status(page.status),
                Err(err) => err.is_transient(),
            };
            if !again || retry >= self.max_retries {
                return result;
            }

            retry += 1;
            let delay = self.backoff(retry);
            trace!(retry, ?delay, "retrying request");
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
    }
}
