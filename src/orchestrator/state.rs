// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! Observable transfer state.

use alloy_chains::NamedChain;
use alloy_primitives::{FixedBytes, TxHash};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Steps of the transfer state machine, in progression order.
///
/// ```text
/// Idle → Validating → Approving → Burning → WaitingAttestation → Minting → Completed
///              └──────────┴──────────┴──────────────┴──────────────┴──→ Error
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferStep {
    #[default]
    Idle,
    Validating,
    Approving,
    Burning,
    WaitingAttestation,
    Minting,
    Completed,
    Error,
}

impl TransferStep {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Validating => "validating",
            Self::Approving => "approving",
            Self::Burning => "burning",
            Self::WaitingAttestation => "waiting_attestation",
            Self::Minting => "minting",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }

    /// Whether a new transfer may start from this step
    pub const fn accepts_start(self) -> bool {
        matches!(self, Self::Idle | Self::Completed | Self::Error)
    }

    /// Whether `reset` is permitted from this step
    pub const fn accepts_reset(self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }
}

impl fmt::Display for TransferStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogKind {
    Info,
    Warning,
    Error,
}

/// One line of the transfer log
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub step: TransferStep,
    pub message: String,
    pub kind: LogKind,
}

/// Identifiers needed to finish a transfer by hand once funds are burned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryInfo {
    pub source_chain: NamedChain,
    pub destination_chain: NamedChain,
    pub burn_tx_hash: TxHash,
    pub message_hash: FixedBytes<32>,
    pub nonce: FixedBytes<32>,
}

/// Snapshot published to subscribers after every change
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferState {
    pub step: TransferStep,
    /// Append-only for the lifetime of one transfer; cleared on reset
    pub logs: Vec<LogEntry>,
    pub error: Option<String>,
    /// Set as soon as the burn is included on the source chain
    pub recovery: Option<RecoveryInfo>,
}

impl TransferState {
    pub(crate) fn push(&mut self, step: TransferStep, kind: LogKind, message: impl Into<String>) {
        self.logs.push(LogEntry {
            timestamp: Utc::now(),
            step,
            message: message.into(),
            kind,
        });
    }

    /// Steps of log entries in order, for quick inspection
    pub fn logged_steps(&self) -> Vec<TransferStep> {
        self.logs.iter().map(|entry| entry.step).collect()
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.step, TransferStep::Completed | TransferStep::Error)
    }
}
