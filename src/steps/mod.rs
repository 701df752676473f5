// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! The four chain-facing steps of a transfer, in execution order.

mod approval;
mod attestation;
mod burn;
mod mint;

pub use approval::{ApprovalOutcome, ApprovalStep};
pub use attestation::{AttestationOutcome, AttestationPoller};
pub use burn::BurnStep;
pub use mint::{MintOutcome, MintStep};
