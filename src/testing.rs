// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! Fakes for driving the transfer engine without chains or network access.
//!
//! Every I/O seam of the orchestrator has an in-memory stand-in here:
//! - [`FakeChainConnector`] for one chain's balance, allowance, block height
//!   and approve/burn/mint transactions
//! - [`FakeAttestationProvider`] for scripted attestation service answers
//! - [`FakeClock`] for instant sleeps and controllable time
//!
//! Fakes are cheap to clone and clones share state, so a test can hand one
//! copy to the orchestrator and inspect another afterwards.

use alloy_chains::NamedChain;
use alloy_primitives::{keccak256, Address, Bytes, FixedBytes, TxHash, U256};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::chain::{ChainConfig, ChainRegistry};
use crate::connector::{BurnReceipt, BurnRequest, ChainConnector, TxReceipt};
use crate::credential::Credential;
use crate::error::{CctpError, Result};
use crate::protocol::{
    AttestationRequest, AttestationResponse, AttestationStatus, MessageHeader, ProtocolMessage,
};
use crate::traits::{AttestationProvider, Clock};

/// First anvil development key; never holds real funds
pub const TEST_PRIVATE_KEY: &str =
    "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

/// Credential for [`TEST_PRIVATE_KEY`]
pub fn test_credential() -> Credential {
    Credential::from_private_key(TEST_PRIVATE_KEY).expect("anvil key is a valid private key")
}

// ============================================================================
// Fake Chain Connector
// ============================================================================

/// Connector operations, recorded in call order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectorCall {
    GetBalance,
    Allowance,
    Approve,
    Burn,
    BlockNumber,
    Mint,
    IsMessageReceived,
}

#[derive(Debug, Default)]
struct FakeChainState {
    balance: U256,
    allowance: U256,
    approve_reverts: bool,
    burn_reverts: bool,
    mint_reverts: bool,
    missing_message_event: bool,
    message_received: bool,
    unavailable_reads: u32,
    calls: Vec<ConnectorCall>,
    last_burn_request: Option<BurnRequest>,
    checked_nonces: Vec<FixedBytes<32>>,
}

/// An in-memory chain.
///
/// Block height advances by `blocks_per_read` on every
/// [`ChainConnector::block_number`] call, so confirmation waits terminate
/// without a clock. Writes succeed immediately unless a failure is
/// configured.
///
/// Scenarios:
/// - reverted approve, burn or mint
/// - confirmed burn without a `MessageSent` event
/// - RPC outages on reads
/// - a message the destination has already received
#[derive(Clone, Debug)]
pub struct FakeChainConnector {
    config: ChainConfig,
    height: Arc<AtomicU64>,
    blocks_per_read: u64,
    tx_counter: Arc<AtomicU64>,
    state: Arc<Mutex<FakeChainState>>,
}

impl FakeChainConnector {
    /// A connector configured like the testnet registry entry for `chain`
    ///
    /// # Panics
    ///
    /// If `chain` is not a supported testnet.
    pub fn new(chain: NamedChain) -> Self {
        let config = ChainRegistry::testnet()
            .and_then(|registry| registry.get(chain).cloned())
            .expect("chain must be in the testnet registry");
        Self::with_config(config)
    }

    pub fn with_config(config: ChainConfig) -> Self {
        Self {
            config,
            height: Arc::new(AtomicU64::new(1_000)),
            blocks_per_read: 100,
            tx_counter: Arc::new(AtomicU64::new(0)),
            state: Arc::new(Mutex::new(FakeChainState::default())),
        }
    }

    pub fn with_balance(self, balance: U256) -> Self {
        self.state.lock().unwrap().balance = balance;
        self
    }

    pub fn with_allowance(self, allowance: U256) -> Self {
        self.state.lock().unwrap().allowance = allowance;
        self
    }

    pub fn with_block_height(self, height: u64) -> Self {
        self.height.store(height, Ordering::SeqCst);
        self
    }

    pub fn with_blocks_per_read(mut self, blocks: u64) -> Self {
        self.blocks_per_read = blocks;
        self
    }

    pub fn with_approve_revert(self) -> Self {
        self.state.lock().unwrap().approve_reverts = true;
        self
    }

    pub fn with_burn_revert(self) -> Self {
        self.state.lock().unwrap().burn_reverts = true;
        self
    }

    pub fn with_mint_revert(self) -> Self {
        self.state.lock().unwrap().mint_reverts = true;
        self
    }

    /// Burns confirm but their receipt carries no `MessageSent` log
    pub fn with_missing_message_event(self) -> Self {
        self.state.lock().unwrap().missing_message_event = true;
        self
    }

    pub fn with_message_received(self) -> Self {
        self.state.lock().unwrap().message_received = true;
        self
    }

    /// The next `count` reads fail with [`CctpError::ChainUnavailable`]
    pub fn with_unavailable_reads(self, count: u32) -> Self {
        self.state.lock().unwrap().unavailable_reads = count;
        self
    }

    /// Every read fails with [`CctpError::ChainUnavailable`]
    pub fn with_unavailable(self) -> Self {
        self.with_unavailable_reads(u32::MAX)
    }

    pub fn calls(&self) -> Vec<ConnectorCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn call_count(&self, call: ConnectorCall) -> usize {
        self.calls().iter().filter(|c| **c == call).count()
    }

    /// Height the next [`ChainConnector::block_number`] call will return
    pub fn current_height(&self) -> u64 {
        self.height.load(Ordering::SeqCst)
    }

    pub fn balance_value(&self) -> U256 {
        self.state.lock().unwrap().balance
    }

    pub fn allowance_value(&self) -> U256 {
        self.state.lock().unwrap().allowance
    }

    pub fn last_burn_request(&self) -> Option<BurnRequest> {
        self.state.lock().unwrap().last_burn_request.clone()
    }

    /// Nonces passed to [`ChainConnector::is_message_received`]
    pub fn checked_nonces(&self) -> Vec<FixedBytes<32>> {
        self.state.lock().unwrap().checked_nonces.clone()
    }

    fn record(&self, call: ConnectorCall) {
        self.state.lock().unwrap().calls.push(call);
    }

    fn read(&self, call: ConnectorCall) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        if state.unavailable_reads > 0 {
            state.unavailable_reads = state.unavailable_reads.saturating_sub(1);
            return Err(CctpError::ChainUnavailable {
                chain: self.config.chain,
                reason: "simulated RPC outage".to_string(),
            });
        }
        Ok(())
    }

    fn next_receipt(&self) -> TxReceipt {
        let n = self.tx_counter.fetch_add(1, Ordering::SeqCst);
        let seed = [
            self.config.domain.as_u32().to_be_bytes().as_slice(),
            n.to_be_bytes().as_slice(),
        ]
        .concat();
        TxReceipt {
            tx_hash: TxHash::from(keccak256(seed)),
            block_number: self.height.load(Ordering::SeqCst),
        }
    }

    fn revert(&self, tx_hash: TxHash) -> CctpError {
        CctpError::TransactionReverted {
            chain: self.config.chain,
            tx_hash: Some(tx_hash),
            reason: "execution reverted".to_string(),
        }
    }
}

#[async_trait]
impl ChainConnector for FakeChainConnector {
    fn config(&self) -> &ChainConfig {
        &self.config
    }

    async fn get_balance(&self, _owner: Address) -> Result<U256> {
        self.read(ConnectorCall::GetBalance)?;
        Ok(self.balance_value())
    }

    async fn allowance(&self, _owner: Address, _spender: Address) -> Result<U256> {
        self.read(ConnectorCall::Allowance)?;
        Ok(self.allowance_value())
    }

    async fn approve(
        &self,
        _credential: &Credential,
        _spender: Address,
        amount: U256,
    ) -> Result<TxReceipt> {
        self.record(ConnectorCall::Approve);
        let receipt = self.next_receipt();

        let mut state = self.state.lock().unwrap();
        if state.approve_reverts {
            return Err(self.revert(receipt.tx_hash));
        }
        state.allowance = amount;
        Ok(receipt)
    }

    async fn burn(&self, _credential: &Credential, request: &BurnRequest) -> Result<BurnReceipt> {
        self.record(ConnectorCall::Burn);
        let receipt = self.next_receipt();

        let mut state = self.state.lock().unwrap();
        state.last_burn_request = Some(request.clone());
        if state.burn_reverts {
            return Err(self.revert(receipt.tx_hash));
        }
        state.balance = state.balance.saturating_sub(request.amount);
        state.allowance = state.allowance.saturating_sub(request.amount);
        if state.missing_message_event {
            return Err(CctpError::MessageParseFailed {
                reason: format!("no MessageSent event in receipt {}", receipt.tx_hash),
            });
        }

        // v2 leaves the nonce zeroed until the attestation service fills it in
        let header = MessageHeader {
            version: 1,
            source_domain: self.config.domain,
            destination_domain: request.destination_domain,
            nonce: FixedBytes::ZERO,
            sender: self.config.token_messenger.into_word(),
            recipient: self.config.token_messenger.into_word(),
            destination_caller: FixedBytes::ZERO,
            min_finality_threshold: request.min_finality_threshold,
            finality_threshold_executed: 0,
        };
        let mut bytes = header.encode().to_vec();
        bytes.extend_from_slice(request.mint_recipient.into_word().as_slice());
        bytes.extend_from_slice(&request.amount.to_be_bytes::<32>());
        let message = ProtocolMessage::decode(Bytes::from(bytes))?;

        Ok(BurnReceipt { receipt, message })
    }

    async fn block_number(&self) -> Result<u64> {
        self.read(ConnectorCall::BlockNumber)?;
        Ok(self.height.fetch_add(self.blocks_per_read, Ordering::SeqCst))
    }

    async fn mint(
        &self,
        _credential: &Credential,
        _message: &Bytes,
        _attestation: &Bytes,
    ) -> Result<TxReceipt> {
        self.record(ConnectorCall::Mint);
        let receipt = self.next_receipt();

        let mut state = self.state.lock().unwrap();
        if state.mint_reverts {
            return Err(self.revert(receipt.tx_hash));
        }
        state.message_received = true;
        Ok(receipt)
    }

    async fn is_message_received(&self, nonce: FixedBytes<32>) -> Result<bool> {
        self.read(ConnectorCall::IsMessageReceived)?;
        let mut state = self.state.lock().unwrap();
        state.checked_nonces.push(nonce);
        Ok(state.message_received)
    }
}

// ============================================================================
// Fake Attestation Provider
// ============================================================================

/// One scripted answer of the attestation service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedResponse {
    Pending,
    PendingConfirmations,
    Complete(Bytes),
    /// Complete, with the service-finalized message alongside the signature
    CompleteWithMessage { attestation: Bytes, message: Bytes },
    Failed,
    /// HTTP 404
    NotFound,
    /// HTTP 429
    RateLimited { retry_after_seconds: u64 },
    /// HTTP 503
    ServerError,
}

impl ScriptedResponse {
    fn resolve(&self) -> Result<AttestationResponse> {
        match self {
            Self::Pending => Ok(AttestationResponse::pending()),
            Self::PendingConfirmations => Ok(AttestationResponse {
                status: AttestationStatus::PendingConfirmations,
                attestation: None,
                message: None,
            }),
            Self::Complete(attestation) => Ok(AttestationResponse::complete(attestation.clone())),
            Self::CompleteWithMessage {
                attestation,
                message,
            } => Ok(AttestationResponse {
                message: Some(message.clone()),
                ..AttestationResponse::complete(attestation.clone())
            }),
            Self::Failed => Ok(AttestationResponse::failed()),
            Self::NotFound => Err(CctpError::AttestationNotFound),
            Self::RateLimited {
                retry_after_seconds,
            } => Err(CctpError::RateLimitExceeded {
                retry_after_seconds: *retry_after_seconds,
            }),
            Self::ServerError => Err(CctpError::AttestationUnavailable { status: 503 }),
        }
    }
}

/// Attestation service that plays back a script.
///
/// Each call consumes the next entry; the last entry repeats forever. An
/// empty script answers `pending` forever. Requests are recorded but do not
/// influence the answer.
#[derive(Clone, Debug, Default)]
pub struct FakeAttestationProvider {
    script: Arc<Mutex<Vec<ScriptedResponse>>>,
    calls: Arc<AtomicUsize>,
    requested: Arc<Mutex<Vec<AttestationRequest>>>,
}

impl FakeAttestationProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_script(self, script: Vec<ScriptedResponse>) -> Self {
        *self.script.lock().unwrap() = script;
        self
    }

    /// Answers `complete` on the first call
    pub fn completing_with(attestation: Bytes) -> Self {
        Self::new().with_script(vec![ScriptedResponse::Complete(attestation)])
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Message hashes queried, in call order
    pub fn requested_hashes(&self) -> Vec<FixedBytes<32>> {
        self.requests()
            .iter()
            .map(AttestationRequest::message_hash)
            .collect()
    }

    /// Full requests, in call order
    pub fn requests(&self) -> Vec<AttestationRequest> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl AttestationProvider for FakeAttestationProvider {
    async fn get_attestation(&self, request: &AttestationRequest) -> Result<AttestationResponse> {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().unwrap().push(request.clone());

        let script = self.script.lock().unwrap();
        match script.get(index).or_else(|| script.last()) {
            Some(entry) => entry.resolve(),
            None => Ok(AttestationResponse::pending()),
        }
    }
}

// ============================================================================
// Fake Clock
// ============================================================================

/// A clock whose sleeps return immediately after advancing its time.
///
/// Each sleep still yields to the scheduler once, so a concurrent task (for
/// example one calling `cancel`) gets to run between polls.
#[derive(Clone, Debug)]
pub struct FakeClock {
    current_time: Arc<Mutex<Instant>>,
    sleep_log: Arc<Mutex<Vec<Duration>>>,
}

impl Default for FakeClock {
    fn default() -> Self {
        Self {
            current_time: Arc::new(Mutex::new(Instant::now())),
            sleep_log: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl FakeClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, duration: Duration) {
        *self.current_time.lock().unwrap() += duration;
    }

    pub fn total_sleep_time(&self) -> Duration {
        self.sleep_log.lock().unwrap().iter().sum()
    }

    pub fn sleep_count(&self) -> usize {
        self.sleep_log.lock().unwrap().len()
    }

    pub fn clear_sleep_log(&self) {
        self.sleep_log.lock().unwrap().clear();
    }
}

#[async_trait]
impl Clock for FakeClock {
    async fn sleep(&self, duration: Duration) {
        self.sleep_log.lock().unwrap().push(duration);
        self.advance(duration);
        tokio::task::yield_now().await;
    }

    fn now(&self) -> Instant {
        *self.current_time.lock().unwrap()
    }
}
