// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! Alloy-backed chain connector.

use alloy_contract::Error as ContractError;
use alloy_json_rpc::RpcError;
use alloy_network::Ethereum;
use alloy_primitives::{Address, Bytes, FixedBytes, U256};
use alloy_provider::{
    DynProvider, PendingTransactionBuilder, PendingTransactionError, Provider, ProviderBuilder,
};
use alloy_rpc_types::TransactionReceipt;
use alloy_sol_types::{sol, SolEvent};
use alloy_transport::TransportErrorKind;
use async_trait::async_trait;
use tracing::{debug, info, Instrument};

use super::{BurnReceipt, BurnRequest, ChainConnector, TxReceipt};
use crate::chain::ChainConfig;
use crate::credential::Credential;
use crate::error::{CctpError, Result};
use crate::protocol::ProtocolMessage;
use crate::spans;

sol!(
    #[allow(missing_docs)]
    #[sol(rpc)]
    contract Erc20 {
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
        function balanceOf(address account) external view returns (uint256);
    }
);

sol!(
    #[allow(missing_docs)]
    #[sol(rpc)]
    contract TokenMessengerV2 {
        function depositForBurn(
            uint256 amount,
            uint32 destinationDomain,
            bytes32 mintRecipient,
            address burnToken,
            bytes32 destinationCaller,
            uint256 maxFee,
            uint32 minFinalityThreshold
        ) external;
    }
);

sol!(
    #[allow(missing_docs)]
    #[sol(rpc)]
    contract MessageTransmitterV2 {
        event MessageSent(bytes message);

        function receiveMessage(bytes message, bytes attestation) external returns (bool);
        function usedNonces(bytes32 nonce) external view returns (uint256);
    }
);

/// [`ChainConnector`] over JSON-RPC.
///
/// Reads use a shared HTTP provider. Each write builds a short-lived signing
/// provider from the supplied credential, so no key material outlives the call.
/// Inclusion waits are bounded by the chain's `confirmation_timeout`.
pub struct AlloyChainConnector {
    config: ChainConfig,
    provider: DynProvider,
}

impl AlloyChainConnector {
    pub fn new(config: ChainConfig) -> Self {
        let provider = ProviderBuilder::new()
            .connect_http(config.rpc_url.clone())
            .erased();

        debug!(
            chain = %config.chain,
            rpc_url = %config.rpc_url,
            event = "chain_connector_initialized"
        );

        Self { config, provider }
    }

    fn signing_provider(&self, credential: &Credential) -> DynProvider {
        ProviderBuilder::new()
            .wallet(credential.wallet())
            .connect_http(self.config.rpc_url.clone())
            .erased()
    }

    fn unavailable(&self, reason: impl ToString) -> CctpError {
        CctpError::ChainUnavailable {
            chain: self.config.chain,
            reason: reason.to_string(),
        }
    }

    fn rpc_error(&self, err: RpcError<TransportErrorKind>) -> CctpError {
        self.unavailable(err)
    }

    /// Reverts surface as [`CctpError::TransactionReverted`]; anything else
    /// means the chain could not be reached.
    fn contract_error(&self, err: ContractError) -> CctpError {
        if err.as_revert_data().is_some() {
            return CctpError::TransactionReverted {
                chain: self.config.chain,
                tx_hash: None,
                reason: err.to_string(),
            };
        }
        match err {
            ContractError::TransportError(rpc) => self.rpc_error(rpc),
            other => self.unavailable(other),
        }
    }

    /// Waits for inclusion of a submitted transaction and fetches its receipt
    async fn receipt(
        &self,
        pending: PendingTransactionBuilder<Ethereum>,
    ) -> Result<TransactionReceipt> {
        let tx_hash = *pending.tx_hash();
        pending
            .with_timeout(Some(self.config.confirmation_timeout))
            .get_receipt()
            .await
            .map_err(|e| match e {
                PendingTransactionError::TxWatcher(_) => self.unavailable(format!(
                    "transaction {tx_hash} not included within {}s",
                    self.config.confirmation_timeout.as_secs()
                )),
                other => self.unavailable(format!("receipt for {tx_hash} unavailable: {other}")),
            })
    }

    /// Checks status and inclusion block of a receipt
    fn included(&self, receipt: &TransactionReceipt) -> Result<TxReceipt> {
        let tx_hash = receipt.transaction_hash;

        if !receipt.status() {
            return Err(CctpError::TransactionReverted {
                chain: self.config.chain,
                tx_hash: Some(tx_hash),
                reason: "receipt status 0".to_string(),
            });
        }

        let block_number = receipt
            .block_number
            .ok_or_else(|| self.unavailable(format!("receipt for {tx_hash} has no block number")))?;

        debug!(
            chain = %self.config.chain,
            tx_hash = %tx_hash,
            block_number,
            event = "transaction_included"
        );
        Ok(TxReceipt {
            tx_hash,
            block_number,
        })
    }

    fn message_from_receipt(&self, receipt: &TransactionReceipt) -> Result<ProtocolMessage> {
        let event = receipt
            .inner
            .logs()
            .iter()
            .filter(|log| log.address() == self.config.message_transmitter)
            .find_map(|log| MessageTransmitterV2::MessageSent::decode_log(log.as_ref()).ok())
            .ok_or_else(|| CctpError::MessageParseFailed {
                reason: format!(
                    "no MessageSent event in burn transaction {}",
                    receipt.transaction_hash
                ),
            })?;

        ProtocolMessage::decode(event.data.message.clone())
    }
}

#[async_trait]
impl ChainConnector for AlloyChainConnector {
    fn config(&self) -> &ChainConfig {
        &self.config
    }

    async fn get_balance(&self, owner: Address) -> Result<U256> {
        let usdc = Erc20::new(self.config.usdc, &self.provider);
        usdc.balanceOf(owner)
            .call()
            .await
            .map_err(|e| self.contract_error(e))
    }

    async fn allowance(&self, owner: Address, spender: Address) -> Result<U256> {
        let usdc = Erc20::new(self.config.usdc, &self.provider);
        usdc.allowance(owner, spender)
            .call()
            .await
            .map_err(|e| self.contract_error(e))
    }

    async fn approve(
        &self,
        credential: &Credential,
        spender: Address,
        amount: U256,
    ) -> Result<TxReceipt> {
        let span = spans::approve(&self.config.chain, &credential.address(), &spender, &amount);

        async {
            let provider = self.signing_provider(credential);
            let usdc = Erc20::new(self.config.usdc, &provider);

            let pending = usdc
                .approve(spender, amount)
                .send()
                .await
                .map_err(|e| self.contract_error(e))?;
            info!(tx_hash = %pending.tx_hash(), event = "approve_submitted");

            let receipt = self.receipt(pending).await?;
            self.included(&receipt)
        }
        .instrument(span)
        .await
    }

    async fn burn(&self, credential: &Credential, request: &BurnRequest) -> Result<BurnReceipt> {
        let span = spans::burn(
            &self.config.chain,
            &credential.address(),
            &request.mint_recipient,
            request.destination_domain.as_u32(),
            &request.amount,
        );

        async {
            let provider = self.signing_provider(credential);
            let messenger = TokenMessengerV2::new(self.config.token_messenger, &provider);

            let pending = messenger
                .depositForBurn(
                    request.amount,
                    request.destination_domain.as_u32(),
                    request.mint_recipient.into_word(),
                    self.config.usdc,
                    FixedBytes::ZERO,
                    request.max_fee,
                    request.min_finality_threshold,
                )
                .send()
                .await
                .map_err(|e| self.contract_error(e))?;
            info!(tx_hash = %pending.tx_hash(), event = "burn_submitted");

            let receipt = self.receipt(pending).await?;
            let tx = self.included(&receipt)?;
            let message = self.message_from_receipt(&receipt)?;

            Ok(BurnReceipt {
                receipt: tx,
                message,
            })
        }
        .instrument(span)
        .await
    }

    async fn block_number(&self) -> Result<u64> {
        self.provider
            .get_block_number()
            .await
            .map_err(|e| self.rpc_error(e))
    }

    async fn mint(
        &self,
        credential: &Credential,
        message: &Bytes,
        attestation: &Bytes,
    ) -> Result<TxReceipt> {
        let provider = self.signing_provider(credential);
        let transmitter = MessageTransmitterV2::new(self.config.message_transmitter, &provider);

        let pending = transmitter
            .receiveMessage(message.clone(), attestation.clone())
            .send()
            .await
            .map_err(|e| self.contract_error(e))?;
        info!(tx_hash = %pending.tx_hash(), event = "mint_submitted");

        let receipt = self.receipt(pending).await?;
        self.included(&receipt)
    }

    async fn is_message_received(&self, nonce: FixedBytes<32>) -> Result<bool> {
        let transmitter = MessageTransmitterV2::new(self.config.message_transmitter, &self.provider);
        let used = transmitter
            .usedNonces(nonce)
            .call()
            .await
            .map_err(|e| self.contract_error(e))?;
        Ok(!used.is_zero())
    }
}
