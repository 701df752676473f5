// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! # cctp-transfer
//!
//! Cross-chain USDC transfer orchestration over Circle's Cross-Chain Transfer
//! Protocol (CCTP) v2.
//!
//! A transfer burns USDC on the source chain, waits for source-chain finality,
//! fetches a signed attestation from Circle's Iris service and mints on the
//! destination chain. [`TransferOrchestrator`] drives those steps as an
//! observable, cancellable state machine:
//!
//! ```text
//! Idle → Validating → Approving → Burning → WaitingAttestation → Minting → Completed
//!                                                                    any ──→ Error
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use alloy_chains::NamedChain;
//! use cctp_transfer::{Credential, TransferMode, TransferOrchestrator, TransferRequest};
//!
//! # async fn example() -> Result<(), cctp_transfer::CctpError> {
//! // Reads .env: PRIVATE_KEY, IRIS_API_URL, per-chain RPC overrides, ...
//! let orchestrator = TransferOrchestrator::from_env()?;
//! let credential = Credential::from_env()?;
//!
//! let balance = orchestrator
//!     .get_balance(&credential, NamedChain::Sepolia)
//!     .await?;
//! println!("Sepolia balance: {balance} USDC");
//!
//! let request = TransferRequest::builder()
//!     .credential(credential)
//!     .source_chain(NamedChain::Sepolia)
//!     .destination_chain(NamedChain::ArbitrumSepolia)
//!     .amount("5")
//!     .mode(TransferMode::Fast)
//!     .build();
//!
//! let outcome = orchestrator.execute_transfer(request).await?;
//! for entry in orchestrator.current_state().logs {
//!     println!("[{}] {}", entry.step, entry.message);
//! }
//! println!("burn {} mint {:?}", outcome.burn_tx_hash, outcome.mint_tx_hash);
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing Without Chains
//!
//! Every I/O seam has a fake in [`testing`]:
//!
//! ```rust
//! use alloy_chains::NamedChain;
//! use alloy_primitives::{Bytes, U256};
//! use cctp_transfer::testing::{
//!     test_credential, FakeAttestationProvider, FakeChainConnector, FakeClock,
//! };
//! use cctp_transfer::{ConnectorSet, TransferOrchestrator};
//! use std::sync::Arc;
//!
//! let source = FakeChainConnector::new(NamedChain::Sepolia).with_balance(U256::from(50_000_000u64));
//! let destination = FakeChainConnector::new(NamedChain::BaseSepolia);
//!
//! let orchestrator = TransferOrchestrator::builder()
//!     .connectors(
//!         ConnectorSet::new()
//!             .with_connector(Arc::new(source))
//!             .with_connector(Arc::new(destination)),
//!     )
//!     .attestation_provider(Arc::new(FakeAttestationProvider::completing_with(
//!         Bytes::from_static(&[1u8; 65]),
//!     )))
//!     .clock(Arc::new(FakeClock::new()))
//!     .build();
//! ```
//!
//! ## Public API
//!
//! - [`TransferOrchestrator`], [`TransferRequest`], [`TransferOutcome`] - the state machine
//! - [`TransferState`], [`TransferStep`], [`LogEntry`] - observable progress
//! - [`ChainRegistry`] and [`ChainConfig`] - supported chains
//! - [`ChainConnector`] and [`AlloyChainConnector`] - per-chain RPC surface
//! - [`CctpError`], [`ErrorKind`] and [`Result`] - error taxonomy

mod balance;
mod chain;
mod config;
mod connector;
mod credential;
mod error;
mod orchestrator;
mod protocol;
mod retry;
mod steps;

pub mod providers;
pub mod spans;
pub mod testing;
pub mod traits;

pub use balance::BalanceQuery;
pub use chain::{
    ChainConfig, ChainRegistry, ARBITRUM_SEPOLIA_USDC, AVALANCHE_FUJI_USDC, BASE_SEPOLIA_USDC,
    CCTP_V2_MESSAGE_TRANSMITTER_TESTNET, CCTP_V2_TOKEN_MESSENGER_TESTNET, ETHEREUM_SEPOLIA_USDC,
    OPTIMISM_SEPOLIA_USDC,
};
pub use config::{
    PollingConfig, TransferSettings, DEFAULT_FAST_TRANSFER_MAX_FEE, IRIS_API, IRIS_API_SANDBOX,
};
pub use connector::{
    AlloyChainConnector, BurnReceipt, BurnRequest, ChainConnector, ConfirmationWaiter,
    ConnectorSet, TxReceipt,
};
pub use credential::Credential;
pub use error::{CctpError, ErrorKind, Result};
pub use orchestrator::{
    LogEntry, LogKind, RecoveryInfo, TransferOrchestrator, TransferOutcome, TransferRequest,
    TransferState, TransferStep,
};
pub use protocol::{
    Attestation, AttestationRequest, AttestationResponse, AttestationStatus, DomainId,
    FinalityPolicy, MessageHeader, MessagesResponse, ProtocolMessage, TransferMode, UsdcAmount,
    FAST_FINALITY_THRESHOLD, STANDARD_FINALITY_THRESHOLD, USDC_DECIMALS,
};
pub use retry::{RetryFuture, RetryPolicy};
pub use steps::{
    ApprovalOutcome, ApprovalStep, AttestationOutcome, AttestationPoller, BurnStep, MintOutcome,
    MintStep,
};
