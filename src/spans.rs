// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! OpenTelemetry span helpers for transfer operations
//!
//! Span names are static and attributes are structured, so traces group by
//! operation regardless of the chains involved. Error attributes are left
//! empty on creation and filled by [`record_error`] when an operation fails.
//!
//! # Example
//!
//! ```rust,no_run
//! use cctp_transfer::spans;
//! use alloy_chains::NamedChain;
//! use alloy_primitives::FixedBytes;
//!
//! let message_hash = FixedBytes::from([0u8; 32]);
//! let span = spans::poll_attestation(&message_hash, &NamedChain::Sepolia, 300, 2);
//! let _guard = span.enter();
//! ```

use alloy_chains::NamedChain;
use alloy_primitives::{Address, FixedBytes, TxHash, U256};
use tracing::Span;

/// Root span of one transfer.
///
/// Parent: caller's span
/// Children: every step span below
#[inline]
pub fn execute_transfer(
    source_chain: &NamedChain,
    destination_chain: &NamedChain,
    amount: &str,
    mode: &str,
) -> Span {
    tracing::info_span!(
        "cctp_transfer.execute_transfer",
        source_chain = %source_chain,
        destination_chain = %destination_chain,
        amount = amount,
        mode = mode,
        error.type = tracing::field::Empty,
        error.message = tracing::field::Empty,
        error.context = tracing::field::Empty,
        otel.status_code = "OK",
    )
}

/// Parent: cctp_transfer.execute_transfer
/// Children: cctp_transfer.wait_for_confirmations
#[inline]
pub fn approve(chain: &NamedChain, owner: &Address, spender: &Address, amount: &U256) -> Span {
    tracing::info_span!(
        "cctp_transfer.approve",
        chain = %chain,
        owner = %owner,
        spender = %spender,
        amount = %amount,
        error.type = tracing::field::Empty,
        error.message = tracing::field::Empty,
        otel.status_code = "OK",
    )
}

/// Span for the `depositForBurn` submission.
///
/// Parent: cctp_transfer.execute_transfer
/// Children: cctp_transfer.wait_for_confirmations
#[inline]
pub fn burn(
    chain: &NamedChain,
    from_address: &Address,
    recipient: &Address,
    destination_domain: u32,
    amount: &U256,
) -> Span {
    tracing::info_span!(
        "cctp_transfer.burn",
        chain = %chain,
        from_address = %from_address,
        recipient = %recipient,
        destination_domain = destination_domain,
        amount = %amount,
        error.type = tracing::field::Empty,
        error.message = tracing::field::Empty,
        otel.status_code = "OK",
    )
}

/// Wait for source-chain finality before the attestation is actionable.
///
/// Parent: cctp_transfer.execute_transfer
/// Children: cctp_transfer.wait_for_confirmations
#[inline]
pub fn await_finality(tx_hash: TxHash, chain: &NamedChain, required_confirmations: u64) -> Span {
    tracing::info_span!(
        "cctp_transfer.await_finality",
        tx_hash = %tx_hash,
        chain = %chain,
        required_confirmations = required_confirmations,
        error.type = tracing::field::Empty,
        error.message = tracing::field::Empty,
        otel.status_code = "OK",
    )
}

/// Parent: cctp_transfer.execute_transfer
/// Children: cctp_transfer.get_attestation (one per attempt)
#[inline]
pub fn poll_attestation(
    message_hash: &FixedBytes<32>,
    source_chain: &NamedChain,
    max_attempts: u32,
    poll_interval_secs: u64,
) -> Span {
    tracing::info_span!(
        "cctp_transfer.poll_attestation",
        message_hash = %message_hash,
        source_chain = %source_chain,
        max_attempts = max_attempts,
        poll_interval_secs = poll_interval_secs,
        error.type = tracing::field::Empty,
        error.message = tracing::field::Empty,
        otel.status_code = "OK",
    )
}

/// Parent: cctp_transfer.poll_attestation
#[inline]
pub fn get_attestation(message_hash: &FixedBytes<32>, attempt: u32) -> Span {
    tracing::debug_span!(
        "cctp_transfer.get_attestation",
        message_hash = %message_hash,
        attempt = attempt,
    )
}

/// Parent: cctp_transfer.execute_transfer
/// Children: cctp_transfer.wait_for_confirmations
#[inline]
pub fn mint(message_hash: &FixedBytes<32>, destination_chain: &NamedChain, attestation_length: usize) -> Span {
    tracing::info_span!(
        "cctp_transfer.mint",
        message_hash = %message_hash,
        destination_chain = %destination_chain,
        attestation_length_bytes = attestation_length,
        error.type = tracing::field::Empty,
        error.message = tracing::field::Empty,
        otel.status_code = "OK",
    )
}

/// Parent: approve, burn, mint or await_finality
/// Children: block-number RPC calls
#[inline]
pub fn wait_for_confirmations(tx_hash: TxHash, chain: &NamedChain, required_confirmations: u64) -> Span {
    tracing::debug_span!(
        "cctp_transfer.wait_for_confirmations",
        tx_hash = %tx_hash,
        chain = %chain,
        required_confirmations = required_confirmations,
        error.type = tracing::field::Empty,
        error.message = tracing::field::Empty,
        otel.status_code = "OK",
    )
}

/// Record error attributes on the current span.
///
/// - error.type: leading segment of the error message
/// - error.message: full message
pub fn record_error<E: std::error::Error>(error: &E) {
    let current_span = Span::current();
    let message = error.to_string();
    current_span.record(
        "error.type",
        message.split(':').next().unwrap_or("Unknown"),
    );
    current_span.record("error.message", message.as_str());
    current_span.record("otel.status_code", "ERROR");
}

/// Record error attributes with custom context on the current span.
pub fn record_error_with_context(
    error_type: &str,
    error_message: &str,
    additional_context: Option<&str>,
) {
    let current_span = Span::current();
    current_span.record("error.type", error_type);
    current_span.record("error.message", error_message);
    current_span.record("otel.status_code", "ERROR");

    if let Some(context) = additional_context {
        current_span.record("error.context", context);
    }
}
