// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
use alloy_chains::NamedChain;
use alloy_primitives::{FixedBytes, TxHash};
use std::fmt;
use thiserror::Error;

use crate::orchestrator::{RecoveryInfo, TransferStep};
use crate::protocol::UsdcAmount;

#[derive(Error, Debug)]
pub enum CctpError {
    #[error("Invalid amount: {reason}")]
    InvalidAmount { reason: String },

    #[error("Source and destination chain must differ (both are {chain})")]
    SameChain { chain: NamedChain },

    #[error("Insufficient balance: requested {requested} USDC but only {available} USDC available")]
    InsufficientBalance {
        requested: UsdcAmount,
        available: UsdcAmount,
    },

    #[error("Chain not supported: {0}")]
    UnsupportedChain(NamedChain),

    #[error("Invalid credential: {0}")]
    InvalidCredential(String),

    #[error("A transfer is already in flight")]
    TransferInFlight,

    #[error("Reset is only allowed once a transfer has completed or failed (current step: {step})")]
    InvalidReset { step: TransferStep },

    #[error("Transfer cancelled")]
    Cancelled,

    #[error("Chain {chain} unavailable: {reason}")]
    ChainUnavailable { chain: NamedChain, reason: String },

    #[error("Transaction reverted on {chain}{}: {reason}", fmt_tx(.tx_hash))]
    TransactionReverted {
        chain: NamedChain,
        tx_hash: Option<TxHash>,
        reason: String,
    },

    #[error("Timed out waiting for {required} confirmations of {tx_hash} on {chain} (observed {observed})")]
    ConfirmationTimeout {
        chain: NamedChain,
        tx_hash: TxHash,
        required: u64,
        observed: u64,
    },

    #[error("Approval failed: {reason}")]
    ApprovalFailed { reason: String },

    #[error("Burn failed: {reason}")]
    BurnFailed { reason: String },

    #[error("MessageSent parse failed: {reason}")]
    MessageParseFailed { reason: String },

    #[error("Attestation rejected for message {message_hash}")]
    AttestationRejected { message_hash: FixedBytes<32> },

    #[error("Attestation not found (will retry)")]
    AttestationNotFound,

    #[error("Attestation service unavailable (HTTP {status})")]
    AttestationUnavailable { status: u16 },

    #[error("Timeout waiting for attestation after {attempts} attempts")]
    AttestationTimeout { attempts: u32 },

    #[error("Rate limit exceeded, retry after {retry_after_seconds} seconds")]
    RateLimitExceeded { retry_after_seconds: u64 },

    #[error(
        "Mint failed on {destination_chain} after burn on {source_chain}: {reason} \
         (funds burned but not minted; message hash {message_hash}, burn tx {burn_tx_hash})"
    )]
    MintFailed {
        source_chain: NamedChain,
        destination_chain: NamedChain,
        message_hash: FixedBytes<32>,
        burn_tx_hash: TxHash,
        reason: String,
    },

    #[error(
        "Transfer stopped at {step} after burn on {source_chain}: {source} \
         (message hash {message_hash}, burn tx {burn_tx_hash})"
    )]
    PostBurnFailure {
        step: TransferStep,
        source_chain: NamedChain,
        destination_chain: NamedChain,
        message_hash: FixedBytes<32>,
        burn_tx_hash: TxHash,
        source: Box<CctpError>,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid URL: {reason}")]
    InvalidUrl { reason: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn fmt_tx(tx_hash: &Option<TxHash>) -> String {
    tx_hash.map(|hash| format!(" (tx {hash})")).unwrap_or_default()
}

/// Failure classes surfaced to callers.
///
/// The presentation layer only renders text, so the kind label is prefixed to
/// the observable error message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Rejected before any chain interaction.
    Validation,
    /// Network or RPC hiccup; retried with bounded backoff.
    Transient,
    /// Revert, attestation rejection or malformed event. Never retried.
    ProtocolFatal,
    /// Burn landed but the transfer did not complete.
    PartialFailure,
    /// The caller cancelled the transfer.
    Cancelled,
}

impl ErrorKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Transient => "transient",
            Self::ProtocolFatal => "protocol",
            Self::PartialFailure => "partial failure",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl CctpError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidAmount { .. }
            | Self::SameChain { .. }
            | Self::InsufficientBalance { .. }
            | Self::UnsupportedChain(_)
            | Self::InvalidCredential(_) => ErrorKind::Validation,

            Self::ChainUnavailable { .. }
            | Self::AttestationNotFound
            | Self::AttestationUnavailable { .. }
            | Self::AttestationTimeout { .. }
            | Self::RateLimitExceeded { .. }
            | Self::ConfirmationTimeout { .. }
            | Self::Network(_)
            | Self::Json(_) => ErrorKind::Transient,

            Self::MintFailed { .. } => ErrorKind::PartialFailure,

            Self::PostBurnFailure { source, .. } => match source.kind() {
                ErrorKind::Cancelled => ErrorKind::Cancelled,
                _ => ErrorKind::PartialFailure,
            },

            Self::Cancelled => ErrorKind::Cancelled,

            Self::TransferInFlight
            | Self::InvalidReset { .. }
            | Self::TransactionReverted { .. }
            | Self::ApprovalFailed { .. }
            | Self::BurnFailed { .. }
            | Self::MessageParseFailed { .. }
            | Self::AttestationRejected { .. }
            | Self::InvalidConfig(_)
            | Self::InvalidUrl { .. } => ErrorKind::ProtocolFatal,
        }
    }

    /// Whether a single retry of the failed read may succeed.
    ///
    /// Exhausted budgets (`AttestationTimeout`, `ConfirmationTimeout`) are
    /// transient in kind but are never retried again.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::ChainUnavailable { .. }
            | Self::AttestationNotFound
            | Self::AttestationUnavailable { .. }
            | Self::RateLimitExceeded { .. }
            | Self::Json(_) => true,
            Self::Network(e) => !e.status().is_some_and(|s| s.is_client_error()),
            _ => false,
        }
    }

    /// Attaches recovery identifiers to a failure that happened once the burn
    /// was on chain. Errors that already carry them are returned unchanged.
    pub fn after_burn(self, step: TransferStep, recovery: &RecoveryInfo) -> Self {
        match self {
            Self::MintFailed { .. } | Self::PostBurnFailure { .. } => self,
            source => Self::PostBurnFailure {
                step,
                source_chain: recovery.source_chain,
                destination_chain: recovery.destination_chain,
                message_hash: recovery.message_hash,
                burn_tx_hash: recovery.burn_tx_hash,
                source: Box::new(source),
            },
        }
    }

    /// Renders the message shown to callers, prefixed with the failure class.
    pub fn user_message(&self) -> String {
        format!("[{}] {}", self.kind(), self)
    }
}

pub type Result<T> = std::result::Result<T, CctpError>;
