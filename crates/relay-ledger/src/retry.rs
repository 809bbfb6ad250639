//! Bounded retry for ledger sub-queries.
//!
//! Retries only `LedgerError::Transient` failures. Permanent failures are
//! returned immediately as `RelayError::Ledger`. After the configured number
//! of attempts the last transient error is surfaced as
//! `RelayError::FetchExhausted` together with the failing scope.
//!
//! The back-off sleep and the gap before each attempt both observe the
//! cancellation token.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use relay_core::{FetchScope, LedgerError, RelayError};

/// Default total number of attempts per sub-query.
pub const DEFAULT_ATTEMPTS: u32 = 5;

/// Default delay between attempts.
pub const DEFAULT_INTERVAL_MS: u64 = 1000;

/// Fixed-count, fixed-delay retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Always at least one.
    attempts: u32,
    /// Delay between consecutive attempts.
    interval: Duration,
}

impl RetryPolicy {
    /// Create a policy.
    ///
    /// # Errors
    ///
    /// Returns `RelayError::Config` if `attempts` is zero.
    pub fn new(attempts: u32, interval: Duration) -> Result<Self, RelayError> {
        if attempts == 0 {
            return Err(RelayError::Config(
                "retry attempts must be at least 1".to_string(),
            ));
        }
        Ok(Self { attempts, interval })
    }

    /// A single attempt with no back-off.
    pub fn no_retry() -> Self {
        Self {
            attempts: 1,
            interval: Duration::ZERO,
        }
    }

    /// Total attempts per sub-query.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Delay between attempts.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run `op` until it succeeds, fails permanently, exhausts the attempt
    /// budget, or `cancel` fires.
    pub async fn run<T, F, Fut>(
        &self,
        scope: FetchScope,
        cancel: &CancellationToken,
        mut op: F,
    ) -> Result<T, RelayError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, LedgerError>>,
    {
        let mut attempt: u32 = 0;
        loop {
            if cancel.is_cancelled() {
                return Err(RelayError::Cancelled);
            }
            attempt += 1;
            let err = match op().await {
                Ok(value) => return Ok(value),
                Err(err) if !err.is_transient() => {
                    tracing::error!(%scope, error = %err, "ledger query failed permanently");
                    return Err(RelayError::Ledger { scope, source: err });
                }
                Err(err) => err,
            };

            if attempt >= self.attempts {
                tracing::error!(
                    %scope,
                    attempts = attempt,
                    error = %err,
                    "ledger query retries exhausted"
                );
                return Err(RelayError::FetchExhausted {
                    scope,
                    attempts: attempt,
                    last_error: err,
                });
            }

            tracing::warn!(
                %scope,
                attempt,
                max_attempts = self.attempts,
                "ledger query failed, retrying in {:?}: {err}",
                self.interval
            );
            tokio::select! {
                _ = cancel.cancelled() => return Err(RelayError::Cancelled),
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_ATTEMPTS,
            interval: Duration::from_millis(DEFAULT_INTERVAL_MS),
        }
    }
}
