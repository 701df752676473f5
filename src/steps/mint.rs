// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
use tracing::{info, warn, Instrument};

use crate::connector::{ChainConnector, ConfirmationWaiter, TxReceipt};
use crate::credential::Credential;
use crate::error::{CctpError, Result};
use crate::orchestrator::RecoveryInfo;
use crate::protocol::{Attestation, ProtocolMessage};
use crate::retry::RetryPolicy;
use crate::spans;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MintOutcome {
    Minted(TxReceipt),
    /// The destination had already consumed this message's nonce
    AlreadyReceived,
}

/// Delivers the attested message to the destination MessageTransmitter.
///
/// Every failure here happens after funds left the source chain, so all of
/// them except cancellation surface as [`CctpError::MintFailed`] carrying the
/// recovery identifiers.
#[derive(Debug, Clone)]
pub struct MintStep {
    retry: RetryPolicy,
    waiter: ConfirmationWaiter,
}

impl MintStep {
    pub fn new(retry: RetryPolicy, waiter: ConfirmationWaiter) -> Self {
        Self { retry, waiter }
    }

    pub async fn execute(
        &self,
        destination: &dyn ChainConnector,
        credential: &Credential,
        message: &ProtocolMessage,
        attestation: &Attestation,
        recovery: &RecoveryInfo,
    ) -> Result<MintOutcome> {
        let span = spans::mint(
            &message.message_hash(),
            &destination.config().chain,
            attestation.signature().len(),
        );

        self.mint(destination, credential, message, attestation)
            .instrument(span)
            .await
            .map_err(|e| {
                spans::record_error(&e);
                if matches!(e, CctpError::Cancelled) {
                    return e;
                }
                CctpError::MintFailed {
                    source_chain: recovery.source_chain,
                    destination_chain: recovery.destination_chain,
                    message_hash: recovery.message_hash,
                    burn_tx_hash: recovery.burn_tx_hash,
                    reason: e.to_string(),
                }
            })
    }

    async fn mint(
        &self,
        destination: &dyn ChainConnector,
        credential: &Credential,
        message: &ProtocolMessage,
        attestation: &Attestation,
    ) -> Result<MintOutcome> {
        let deliverable = match attestation.attested_message() {
            Some(bytes) => attested_message(message, bytes.clone())?,
            None => message.clone(),
        };

        let received = self
            .retry
            .run("is_message_received", || {
                destination.is_message_received(deliverable.nonce())
            })
            .await?;
        if received {
            warn!(
                chain = %destination.config().chain,
                nonce = %deliverable.nonce(),
                event = "message_already_received"
            );
            return Ok(MintOutcome::AlreadyReceived);
        }

        let receipt = destination
            .mint(credential, deliverable.message_bytes(), attestation.signature())
            .await?;
        info!(
            chain = %destination.config().chain,
            tx_hash = %receipt.tx_hash,
            event = "mint_included"
        );

        let confirmations = self.waiter.confirm(destination, &receipt).await?;
        info!(
            chain = %destination.config().chain,
            tx_hash = %receipt.tx_hash,
            confirmations,
            event = "mint_confirmed"
        );
        Ok(MintOutcome::Minted(receipt))
    }
}

/// The service may return the message with fields finalized after the burn
/// (the v2 nonce). It must still route between the same domains.
fn attested_message(
    burned: &ProtocolMessage,
    bytes: alloy_primitives::Bytes,
) -> Result<ProtocolMessage> {
    let attested = ProtocolMessage::decode(bytes)?;
    if attested.source_domain() != burned.source_domain()
        || attested.destination_domain() != burned.destination_domain()
    {
        return Err(CctpError::MessageParseFailed {
            reason: format!(
                "attested message routes {} -> {}, burn routed {} -> {}",
                attested.source_domain(),
                attested.destination_domain(),
                burned.source_domain(),
                burned.destination_domain()
            ),
        });
    }
    Ok(attested)
}
