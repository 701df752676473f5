// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! Block-confirmation polling.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, Instrument};

use super::{ChainConnector, TxReceipt};
use crate::error::{CctpError, Result};
use crate::retry::RetryPolicy;
use crate::spans;
use crate::traits::Clock;

/// Waits until a transaction is buried under enough blocks.
///
/// Confirmations count the inclusion block itself: a transaction mined in
/// block 100 has 1 confirmation at height 100 and 3 at height 102.
///
/// The wait stops with [`CctpError::Cancelled`] at the next height read or
/// sleep once its cancellation token fires. The transaction itself stays on
/// chain.
#[derive(Clone)]
pub struct ConfirmationWaiter {
    clock: Arc<dyn Clock>,
    retry: RetryPolicy,
    cancellation: CancellationToken,
}

impl std::fmt::Debug for ConfirmationWaiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfirmationWaiter")
            .field("retry", &self.retry)
            .field("cancellation", &self.cancellation)
            .finish_non_exhaustive()
    }
}

impl ConfirmationWaiter {
    pub fn new(clock: Arc<dyn Clock>, retry: RetryPolicy) -> Self {
        Self {
            clock,
            retry,
            cancellation: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Waits for the connector chain's own confirmation count and timeout
    pub async fn confirm(&self, connector: &dyn ChainConnector, tx: &TxReceipt) -> Result<u64> {
        let config = connector.config();
        self.wait(
            connector,
            tx,
            config.required_confirmations,
            config.confirmation_timeout,
        )
        .await
    }

    /// Polls block height every `block_time` of the connector's chain until
    /// `required` confirmations are observed or `timeout` elapses.
    ///
    /// Returns the confirmation count observed.
    pub async fn wait(
        &self,
        connector: &dyn ChainConnector,
        tx: &TxReceipt,
        required: u64,
        timeout: Duration,
    ) -> Result<u64> {
        let config = connector.config();
        let span = spans::wait_for_confirmations(tx.tx_hash, &config.chain, required);

        async {
            let start = self.clock.now();
            let poll_interval = config.block_time.max(Duration::from_millis(100));

            loop {
                let height = cancellable(
                    &self.cancellation,
                    self.retry.run("block_number", || connector.block_number()),
                )
                .await?;
                let observed = confirmations(tx.block_number, height);

                if observed >= required {
                    info!(
                        chain = %config.chain,
                        tx_hash = %tx.tx_hash,
                        confirmations = observed,
                        event = "confirmations_reached"
                    );
                    return Ok(observed);
                }

                if self.clock.now().duration_since(start) >= timeout {
                    let err = CctpError::ConfirmationTimeout {
                        chain: config.chain,
                        tx_hash: tx.tx_hash,
                        required,
                        observed,
                    };
                    spans::record_error(&err);
                    return Err(err);
                }

                debug!(
                    chain = %config.chain,
                    tx_hash = %tx.tx_hash,
                    confirmations = observed,
                    required,
                    event = "waiting_for_confirmations"
                );
                cancellable(&self.cancellation, async {
                    self.clock.sleep(poll_interval).await;
                    Ok(())
                })
                .await?;
            }
        }
        .instrument(span)
        .await
    }
}

/// Races `work` against `token`; a fired token wins.
pub(crate) async fn cancellable<T>(
    token: &CancellationToken,
    work: impl Future<Output = Result<T>>,
) -> Result<T> {
    if token.is_cancelled() {
        return Err(CctpError::Cancelled);
    }
    tokio::select! {
        biased;
        _ = token.cancelled() => {
            debug!(event = "wait_cancelled");
            Err(CctpError::Cancelled)
        }
        result = work => result,
    }
}

fn confirmations(inclusion_block: u64, height: u64) -> u64 {
    if height < inclusion_block {
        0
    } else {
        height - inclusion_block + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PollingConfig;
    use crate::testing::{FakeChainConnector, FakeClock};
    use alloy_chains::NamedChain;
    use alloy_primitives::TxHash;
    use rstest::rstest;

    fn waiter(clock: &FakeClock) -> ConfirmationWaiter {
        let clock: Arc<dyn Clock> = Arc::new(clock.clone());
        let retry = RetryPolicy::new(clock.clone(), &PollingConfig::default());
        ConfirmationWaiter::new(clock, retry)
    }

    #[rstest]
    #[case(100, 99, 0)]
    #[case(100, 100, 1)]
    #[case(100, 102, 3)]
    fn test_confirmation_count(#[case] block: u64, #[case] height: u64, #[case] expected: u64) {
        assert_eq!(confirmations(block, height), expected);
    }

    #[tokio::test]
    async fn test_waits_until_required_confirmations() {
        let clock = FakeClock::new();
        let connector = FakeChainConnector::new(NamedChain::Sepolia).with_block_height(100);
        let tx = TxReceipt {
            tx_hash: TxHash::from([1u8; 32]),
            block_number: 100,
        };

        let observed = waiter(&clock)
            .wait(&connector, &tx, 5, Duration::from_secs(3600))
            .await
            .unwrap();

        assert!(observed >= 5);
        assert!(clock.sleep_count() >= 1);
    }

    #[tokio::test]
    async fn test_times_out() {
        let clock = FakeClock::new();
        let connector = FakeChainConnector::new(NamedChain::Sepolia)
            .with_block_height(100)
            .with_blocks_per_read(0);
        let tx = TxReceipt {
            tx_hash: TxHash::from([1u8; 32]),
            block_number: 100,
        };

        let err = waiter(&clock)
            .wait(&connector, &tx, 5, Duration::from_secs(60))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CctpError::ConfirmationTimeout {
                required: 5,
                observed: 1,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_confirm_uses_chain_settings() {
        let clock = FakeClock::new();
        let connector = FakeChainConnector::new(NamedChain::AvalancheFuji)
            .with_block_height(100)
            .with_blocks_per_read(1);
        let tx = TxReceipt {
            tx_hash: TxHash::from([1u8; 32]),
            block_number: 100,
        };

        let observed = waiter(&clock).confirm(&connector, &tx).await.unwrap();

        assert_eq!(observed, connector.config().required_confirmations);
    }

    #[tokio::test]
    async fn test_cancelled_token_stops_the_wait() {
        let clock = FakeClock::new();
        let connector = FakeChainConnector::new(NamedChain::Sepolia)
            .with_block_height(100)
            .with_blocks_per_read(0);
        let tx = TxReceipt {
            tx_hash: TxHash::from([1u8; 32]),
            block_number: 100,
        };
        let token = CancellationToken::new();
        token.cancel();

        let err = waiter(&clock)
            .with_cancellation(token)
            .wait(&connector, &tx, 5, Duration::from_secs(3600))
            .await
            .unwrap_err();

        assert!(matches!(err, CctpError::Cancelled));
        assert_eq!(clock.sleep_count(), 0);
        assert_eq!(connector.call_count(crate::testing::ConnectorCall::BlockNumber), 0);
    }
}
