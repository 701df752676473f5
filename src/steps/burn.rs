// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
use alloy_primitives::U256;
use tracing::info;

use crate::chain::ChainConfig;
use crate::connector::{BurnReceipt, BurnRequest, ChainConnector, ConfirmationWaiter};
use crate::credential::Credential;
use crate::error::{CctpError, Result};
use crate::protocol::TransferMode;

/// Burns USDC on the source chain and returns the emitted message.
///
/// Split in two so the caller can record recovery identifiers between
/// inclusion ([`BurnStep::execute`]) and confirmation ([`BurnStep::confirm`]).
#[derive(Debug, Clone)]
pub struct BurnStep {
    fast_max_fee: U256,
    waiter: ConfirmationWaiter,
}

impl BurnStep {
    pub fn new(fast_max_fee: U256, waiter: ConfirmationWaiter) -> Self {
        Self {
            fast_max_fee,
            waiter,
        }
    }

    /// Fee ceiling passed to `depositForBurn`; standard transfers pay none
    pub fn max_fee(&self, mode: TransferMode) -> U256 {
        if mode.is_fast() {
            self.fast_max_fee
        } else {
            U256::ZERO
        }
    }

    /// Submits the burn and returns once it is included
    pub async fn execute(
        &self,
        source: &dyn ChainConnector,
        destination: &ChainConfig,
        credential: &Credential,
        amount: U256,
        mode: TransferMode,
    ) -> Result<BurnReceipt> {
        let request = BurnRequest {
            amount,
            destination_domain: destination.domain,
            mint_recipient: credential.address(),
            max_fee: self.max_fee(mode),
            min_finality_threshold: mode.finality_policy().min_finality_threshold(),
        };

        let burn = source
            .burn(credential, &request)
            .await
            .map_err(|e| match e {
                CctpError::TransactionReverted { .. } => CctpError::BurnFailed {
                    reason: e.to_string(),
                },
                other => other,
            })?;

        info!(
            chain = %source.config().chain,
            tx_hash = %burn.receipt.tx_hash,
            message_hash = %burn.message.message_hash(),
            block_number = burn.receipt.block_number,
            event = "burn_included"
        );
        Ok(burn)
    }

    /// Checks the emitted message routes to `destination`, then waits for
    /// the source chain's confirmations. Returns the count observed.
    pub async fn confirm(
        &self,
        source: &dyn ChainConnector,
        destination: &ChainConfig,
        burn: &BurnReceipt,
    ) -> Result<u64> {
        let message = &burn.message;
        if message.source_domain() != source.config().domain
            || message.destination_domain() != destination.domain
        {
            return Err(CctpError::MessageParseFailed {
                reason: format!(
                    "message routes {} -> {}, expected {} -> {}",
                    message.source_domain(),
                    message.destination_domain(),
                    source.config().domain,
                    destination.domain
                ),
            });
        }

        let confirmations = self.waiter.confirm(source, &burn.receipt).await?;

        info!(
            chain = %source.config().chain,
            tx_hash = %burn.receipt.tx_hash,
            message_hash = %message.message_hash(),
            nonce = %message.nonce(),
            confirmations,
            event = "burn_confirmed"
        );
        Ok(confirmations)
    }
}
