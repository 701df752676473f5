// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! CCTP protocol types and definitions
//!
//! Protocol-level types shared by every step of a transfer: domain
//! identifiers, finality policies, the burn message, attestation responses and
//! USDC amounts.

mod amount;
mod attestation;
mod domain_id;
mod finality;
mod message;

pub use amount::{UsdcAmount, USDC_DECIMALS};
pub use attestation::{
    Attestation, AttestationRequest, AttestationResponse, AttestationStatus, MessagesResponse,
};
pub use domain_id::DomainId;
pub use finality::{
    FinalityPolicy, TransferMode, FAST_FINALITY_THRESHOLD, STANDARD_FINALITY_THRESHOLD,
};
pub use message::{MessageHeader, ProtocolMessage};
