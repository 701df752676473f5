// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! Bounded exponential backoff for transient read failures.
//!
//! Only reads go through here. Transaction submissions are never retried since
//! a resubmitted approve/burn/mint moves funds a second time.

use backon::{ExponentialBuilder, Retryable};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::warn;

use crate::config::PollingConfig;
use crate::error::{CctpError, Result};
use crate::traits::Clock;

/// Boxed `Send` future returned by [`RetryPolicy`]
pub type RetryFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Retry budget shared by balance queries, block-height reads and
/// attestation polls.
#[derive(Clone)]
pub struct RetryPolicy {
    clock: Arc<dyn Clock>,
    backoff: ExponentialBuilder,
}

impl RetryPolicy {
    pub fn new(clock: Arc<dyn Clock>, polling: &PollingConfig) -> Self {
        let backoff = ExponentialBuilder::default()
            .with_max_times(polling.max_retries)
            .with_min_delay(polling.min_backoff)
            .with_max_delay(polling.max_backoff);

        Self { clock, backoff }
    }

    /// Runs `operation`, retrying while the error is transient and the
    /// budget lasts. Sleeps go through the injected clock.
    pub fn run<'a, T, F, Fut>(&'a self, operation: &'static str, f: F) -> RetryFuture<'a, T>
    where
        T: Send + 'a,
        F: FnMut() -> Fut + Send + 'a,
        Fut: Future<Output = Result<T>> + Send + 'a,
    {
        self.run_if(operation, CctpError::is_transient, f)
    }

    /// Like [`RetryPolicy::run`] with a caller-chosen retry predicate.
    ///
    /// The retry future is erased here so callers inside spawned tasks only
    /// see a `Send` box.
    pub fn run_if<'a, T, F, Fut>(
        &'a self,
        operation: &'static str,
        retryable: fn(&CctpError) -> bool,
        f: F,
    ) -> RetryFuture<'a, T>
    where
        T: Send + 'a,
        F: FnMut() -> Fut + Send + 'a,
        Fut: Future<Output = Result<T>> + Send + 'a,
    {
        let clock = self.clock.clone();

        let retry = f
            .retry(self.backoff)
            .sleep(move |delay: std::time::Duration| {
                let clock = clock.clone();
                async move { clock.sleep(delay).await }
            })
            .when(move |e: &CctpError| retryable(e))
            .notify(move |e: &CctpError, delay: std::time::Duration| {
                warn!(
                    operation,
                    error = %e,
                    retry_in_ms = delay.as_millis() as u64,
                    event = "transient_error_retry"
                );
            });

        Box::pin(retry)
    }
}

impl std::fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("backoff", &self.backoff)
            .finish_non_exhaustive()
    }
}
