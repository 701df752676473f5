// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! I/O seams of the transfer engine that are not chain specific.
//!
//! The attestation service and time are abstracted behind traits so the whole
//! state machine can run against fakes (see [`crate::testing`]). The per-chain
//! seam lives in [`crate::connector::ChainConnector`].

use async_trait::async_trait;
use std::time::{Duration, Instant};

use crate::error::Result;
use crate::protocol::{AttestationRequest, AttestationResponse};

/// Attestation retrieval keyed by the burn message hash.
///
/// The request also carries the source domain and burn transaction, which
/// services that index by transaction need for the lookup.
///
/// Implementations report "not yet indexed" as [`CctpError::AttestationNotFound`]
/// and rate limiting as [`CctpError::RateLimitExceeded`]; both are retried by
/// the poller.
///
/// [`CctpError::AttestationNotFound`]: crate::CctpError::AttestationNotFound
/// [`CctpError::RateLimitExceeded`]: crate::CctpError::RateLimitExceeded
#[async_trait]
pub trait AttestationProvider: Send + Sync {
    async fn get_attestation(&self, request: &AttestationRequest) -> Result<AttestationResponse>;
}

/// Sleep and time queries.
///
/// Polling loops, retry backoff and confirmation timeouts all go through this
/// trait, which lets tests fast-forward without waiting.
#[async_trait]
pub trait Clock: Send + Sync {
    async fn sleep(&self, duration: Duration);

    fn now(&self) -> Instant;
}
