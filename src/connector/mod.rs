// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! Per-chain RPC surface used by the transfer steps.
//!
//! A [`ChainConnector`] wraps one chain's reads (balance, allowance, block
//! height, replay status) and writes (approve, burn, mint). Write operations
//! return as soon as the transaction is included with a success status; the
//! steps then wait for the chain's confirmation count with a
//! [`ConfirmationWaiter`], which can be cancelled without losing the receipt.
//! Connectors hold no per-transfer state and are shared freely between
//! orchestrators.

mod alloy;
mod confirmations;

use alloy_chains::NamedChain;
use alloy_primitives::{Address, Bytes, FixedBytes, TxHash, U256};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::chain::{ChainConfig, ChainRegistry};
use crate::credential::Credential;
use crate::error::{CctpError, Result};
use crate::protocol::{DomainId, ProtocolMessage};

pub use self::alloy::AlloyChainConnector;
pub(crate) use self::confirmations::cancellable;
pub use self::confirmations::ConfirmationWaiter;

/// Inclusion data of a submitted transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_hash: TxHash,
    pub block_number: u64,
}

/// Arguments of `depositForBurn` beyond the token and amount owner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BurnRequest {
    pub amount: U256,
    pub destination_domain: DomainId,
    /// Recipient on the destination chain, left-padded to 32 bytes on-chain
    pub mint_recipient: Address,
    pub max_fee: U256,
    pub min_finality_threshold: u32,
}

/// An included burn and the message it emitted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BurnReceipt {
    pub receipt: TxReceipt,
    pub message: ProtocolMessage,
}

/// RPC surface of a single chain.
///
/// Fails with [`CctpError::ChainUnavailable`] on RPC or network failure and
/// [`CctpError::TransactionReverted`] when the chain rejects a transaction.
/// Does not deduplicate: callers must not resubmit a write whose receipt
/// already exists.
#[async_trait]
pub trait ChainConnector: Send + Sync {
    fn config(&self) -> &ChainConfig;

    /// USDC balance of `owner`, in base units
    async fn get_balance(&self, owner: Address) -> Result<U256>;

    /// USDC allowance granted by `owner` to `spender`
    async fn allowance(&self, owner: Address, spender: Address) -> Result<U256>;

    async fn approve(
        &self,
        credential: &Credential,
        spender: Address,
        amount: U256,
    ) -> Result<TxReceipt>;

    /// Submits `depositForBurn` and extracts the emitted `MessageSent` message
    /// from the inclusion receipt
    ///
    /// An included burn without a decodable event fails with
    /// [`CctpError::MessageParseFailed`].
    async fn burn(&self, credential: &Credential, request: &BurnRequest) -> Result<BurnReceipt>;

    async fn block_number(&self) -> Result<u64>;

    /// Submits `receiveMessage` on this chain's MessageTransmitter
    async fn mint(
        &self,
        credential: &Credential,
        message: &Bytes,
        attestation: &Bytes,
    ) -> Result<TxReceipt>;

    /// Whether the MessageTransmitter has already consumed `nonce`
    async fn is_message_received(&self, nonce: FixedBytes<32>) -> Result<bool>;
}

/// Connectors keyed by chain; the dispatch point for a request's chain ids.
#[derive(Clone, Default)]
pub struct ConnectorSet {
    connectors: HashMap<NamedChain, Arc<dyn ChainConnector>>,
}

impl ConnectorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// One [`AlloyChainConnector`] per registry entry
    pub fn connect(registry: &ChainRegistry) -> Self {
        registry.iter().fold(Self::new(), |set, config| {
            set.with_connector(Arc::new(AlloyChainConnector::new(config.clone())))
        })
    }

    pub fn with_connector(mut self, connector: Arc<dyn ChainConnector>) -> Self {
        self.insert(connector);
        self
    }

    pub fn insert(&mut self, connector: Arc<dyn ChainConnector>) {
        self.connectors.insert(connector.config().chain, connector);
    }

    pub fn get(&self, chain: NamedChain) -> Result<Arc<dyn ChainConnector>> {
        self.connectors
            .get(&chain)
            .cloned()
            .ok_or(CctpError::UnsupportedChain(chain))
    }

    pub fn contains(&self, chain: NamedChain) -> bool {
        self.connectors.contains_key(&chain)
    }
}

impl fmt::Debug for ConnectorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.connectors.keys()).finish()
    }
}
