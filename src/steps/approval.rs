// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
use alloy_primitives::U256;
use tracing::info;

use crate::connector::{ChainConnector, ConfirmationWaiter, TxReceipt};
use crate::credential::Credential;
use crate::error::{CctpError, Result};
use crate::retry::RetryPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalOutcome {
    /// Existing allowance already covers the amount; nothing was submitted
    Sufficient { allowance: U256 },
    Approved(TxReceipt),
}

/// Grants the source TokenMessenger allowance over the transfer amount.
#[derive(Debug, Clone)]
pub struct ApprovalStep {
    retry: RetryPolicy,
    waiter: ConfirmationWaiter,
}

impl ApprovalStep {
    pub fn new(retry: RetryPolicy, waiter: ConfirmationWaiter) -> Self {
        Self { retry, waiter }
    }

    pub async fn execute(
        &self,
        source: &dyn ChainConnector,
        credential: &Credential,
        amount: U256,
    ) -> Result<ApprovalOutcome> {
        let chain = source.config().chain;
        let owner = credential.address();
        let spender = source.config().token_messenger;

        let allowance = self
            .retry
            .run("allowance", || source.allowance(owner, spender))
            .await?;

        if allowance >= amount {
            info!(
                chain = %chain,
                allowance = %allowance,
                amount = %amount,
                event = "approval_skipped"
            );
            return Ok(ApprovalOutcome::Sufficient { allowance });
        }

        let receipt = source
            .approve(credential, spender, amount)
            .await
            .map_err(approval_failed)?;
        self.waiter
            .confirm(source, &receipt)
            .await
            .map_err(approval_failed)?;

        info!(
            chain = %chain,
            tx_hash = %receipt.tx_hash,
            event = "approval_confirmed"
        );
        Ok(ApprovalOutcome::Approved(receipt))
    }
}

fn approval_failed(err: CctpError) -> CctpError {
    match err {
        CctpError::TransactionReverted { .. } | CctpError::ConfirmationTimeout { .. } => {
            CctpError::ApprovalFailed {
                reason: err.to_string(),
            }
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PollingConfig;
    use crate::testing::{test_credential, ConnectorCall, FakeChainConnector, FakeClock};
    use alloy_chains::NamedChain;
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    fn step_with(clock: &FakeClock, token: CancellationToken) -> ApprovalStep {
        let clock: Arc<dyn crate::traits::Clock> = Arc::new(clock.clone());
        let retry = RetryPolicy::new(clock.clone(), &PollingConfig::default());
        let waiter = ConfirmationWaiter::new(clock, retry.clone()).with_cancellation(token);
        ApprovalStep::new(retry, waiter)
    }

    fn step() -> ApprovalStep {
        step_with(&FakeClock::new(), CancellationToken::new())
    }

    #[tokio::test]
    async fn test_skips_when_allowance_covers_amount() {
        let source = FakeChainConnector::new(NamedChain::Sepolia).with_allowance(U256::from(100u64));

        let outcome = step()
            .execute(&source, &test_credential(), U256::from(100u64))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            ApprovalOutcome::Sufficient {
                allowance: U256::from(100u64)
            }
        );
        assert!(!source.calls().contains(&ConnectorCall::Approve));
    }

    #[tokio::test]
    async fn test_approves_when_allowance_is_short() {
        let source = FakeChainConnector::new(NamedChain::Sepolia);

        let outcome = step()
            .execute(&source, &test_credential(), U256::from(100u64))
            .await
            .unwrap();

        assert!(matches!(outcome, ApprovalOutcome::Approved(_)));
        assert_eq!(source.allowance_value(), U256::from(100u64));
    }

    #[tokio::test]
    async fn test_revert_becomes_approval_failed() {
        let source = FakeChainConnector::new(NamedChain::Sepolia).with_approve_revert();

        let err = step()
            .execute(&source, &test_credential(), U256::from(100u64))
            .await
            .unwrap_err();

        assert!(matches!(err, CctpError::ApprovalFailed { .. }));
    }

    #[tokio::test]
    async fn test_approval_waits_for_confirmations() {
        let source = FakeChainConnector::new(NamedChain::AvalancheFuji).with_blocks_per_read(1);

        step()
            .execute(&source, &test_credential(), U256::from(100u64))
            .await
            .unwrap();

        assert_eq!(
            source.call_count(ConnectorCall::BlockNumber) as u64,
            source.config().required_confirmations
        );
    }

    #[tokio::test]
    async fn test_unconfirmed_approval_times_out() {
        let source = FakeChainConnector::new(NamedChain::Sepolia).with_blocks_per_read(0);

        let err = step()
            .execute(&source, &test_credential(), U256::from(100u64))
            .await
            .unwrap_err();

        assert!(matches!(err, CctpError::ApprovalFailed { .. }));
    }

    #[tokio::test]
    async fn test_cancel_abandons_the_wait_not_the_approval() {
        let source = FakeChainConnector::new(NamedChain::Sepolia).with_blocks_per_read(0);
        let token = CancellationToken::new();
        token.cancel();

        let err = step_with(&FakeClock::new(), token)
            .execute(&source, &test_credential(), U256::from(100u64))
            .await
            .unwrap_err();

        assert!(matches!(err, CctpError::Cancelled));
        assert_eq!(source.allowance_value(), U256::from(100u64));
    }
}
