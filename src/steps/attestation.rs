// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! Finality wait and attestation polling.

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn, Instrument};

use crate::config::PollingConfig;
use crate::connector::{cancellable, BurnReceipt, ChainConnector, ConfirmationWaiter, TxReceipt};
use crate::error::{CctpError, ErrorKind, Result};
use crate::protocol::{
    Attestation, AttestationRequest, AttestationResponse, AttestationStatus, FinalityPolicy,
};
use crate::retry::RetryPolicy;
use crate::spans;
use crate::traits::{AttestationProvider, Clock};

/// An actionable attestation and the source confirmations seen before it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestationOutcome {
    pub attestation: Attestation,
    pub confirmations: u64,
}

/// Turns a confirmed burn into an actionable attestation.
///
/// First waits until the burn has as many source-chain confirmations as the
/// transfer's finality policy demands, then polls the attestation service on
/// a fixed interval. An attestation reported complete earlier is never used
/// before that threshold. A fired cancellation token ends the wait or the
/// poll at its next boundary.
#[derive(Clone)]
pub struct AttestationPoller {
    provider: Arc<dyn AttestationProvider>,
    clock: Arc<dyn Clock>,
    retry: RetryPolicy,
    waiter: ConfirmationWaiter,
    polling: PollingConfig,
    cancellation: CancellationToken,
}

impl AttestationPoller {
    pub fn new(
        provider: Arc<dyn AttestationProvider>,
        clock: Arc<dyn Clock>,
        polling: PollingConfig,
    ) -> Self {
        let retry = RetryPolicy::new(clock.clone(), &polling);
        let waiter = ConfirmationWaiter::new(clock.clone(), retry.clone());
        Self {
            provider,
            clock,
            retry,
            waiter,
            polling,
            cancellation: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.waiter = self.waiter.with_cancellation(token.clone());
        self.cancellation = token;
        self
    }

    pub async fn execute(
        &self,
        source: &dyn ChainConnector,
        burn: &BurnReceipt,
        policy: FinalityPolicy,
    ) -> Result<AttestationOutcome> {
        let confirmations = self.await_finality(source, &burn.receipt, policy).await?;
        let request = AttestationRequest::new(burn.message.clone(), burn.receipt.tx_hash);
        let attestation = self.poll(&request, source).await?;

        Ok(AttestationOutcome {
            attestation,
            confirmations,
        })
    }

    /// Returns the confirmation count observed once the threshold is met
    pub async fn await_finality(
        &self,
        source: &dyn ChainConnector,
        burn: &TxReceipt,
        policy: FinalityPolicy,
    ) -> Result<u64> {
        let chain = source.config().chain;
        let required = policy.required_confirmations();
        let span = spans::await_finality(burn.tx_hash, &chain, required);

        async {
            info!(
                chain = %chain,
                tx_hash = %burn.tx_hash,
                required_confirmations = required,
                event = "awaiting_finality"
            );
            self.waiter
                .wait(source, burn, required, self.polling.finality_timeout)
                .await
        }
        .instrument(span)
        .await
    }

    /// Polls until the service returns a signed attestation.
    ///
    /// - `pending` / `pending_confirmations` / 404 → poll again
    /// - `complete` → done
    /// - `failed` → [`CctpError::AttestationRejected`]
    /// - 429 → wait `Retry-After`, counts as an attempt
    /// - other transient errors → bounded backoff, then
    ///   [`CctpError::AttestationTimeout`]
    pub async fn poll(
        &self,
        request: &AttestationRequest,
        source: &dyn ChainConnector,
    ) -> Result<Attestation> {
        let message_hash = request.message_hash();
        let span = spans::poll_attestation(
            &message_hash,
            &source.config().chain,
            self.polling.max_attempts,
            self.polling.poll_interval.as_secs(),
        );

        async {
            let mut attempt: u32 = 0;

            loop {
                attempt = attempt.saturating_add(1);
                let mut delay = self.polling.poll_interval;

                match cancellable(&self.cancellation, self.fetch(request, attempt)).await {
                    Ok(response) => match response.status {
                        AttestationStatus::Complete => match response.attestation {
                            Some(signature) => {
                                info!(
                                    message_hash = %message_hash,
                                    attempt,
                                    attestation_length_bytes = signature.len(),
                                    event = "attestation_complete"
                                );
                                return Ok(Attestation::new(message_hash, signature)
                                    .with_attested_message(response.message));
                            }
                            None => {
                                warn!(
                                    message_hash = %message_hash,
                                    attempt,
                                    event = "attestation_complete_without_signature"
                                );
                            }
                        },
                        AttestationStatus::Failed => {
                            let err = CctpError::AttestationRejected { message_hash };
                            spans::record_error(&err);
                            return Err(err);
                        }
                        AttestationStatus::Pending | AttestationStatus::PendingConfirmations => {
                            debug!(
                                message_hash = %message_hash,
                                attempt,
                                status = ?response.status,
                                event = "attestation_pending"
                            );
                        }
                    },
                    Err(CctpError::AttestationNotFound) => {
                        debug!(message_hash = %message_hash, attempt, event = "attestation_not_found");
                    }
                    Err(CctpError::RateLimitExceeded {
                        retry_after_seconds,
                    }) => {
                        warn!(
                            message_hash = %message_hash,
                            retry_after_seconds,
                            event = "attestation_rate_limited"
                        );
                        delay = Duration::from_secs(retry_after_seconds).max(delay);
                    }
                    Err(CctpError::Cancelled) => return Err(CctpError::Cancelled),
                    Err(err) if err.kind() == ErrorKind::Transient => {
                        warn!(
                            message_hash = %message_hash,
                            attempt,
                            error = %err,
                            event = "attestation_retries_exhausted"
                        );
                        let err = CctpError::AttestationTimeout { attempts: attempt };
                        spans::record_error(&err);
                        return Err(err);
                    }
                    Err(err) => {
                        spans::record_error(&err);
                        return Err(err);
                    }
                }

                if attempt >= self.polling.max_attempts {
                    let err = CctpError::AttestationTimeout { attempts: attempt };
                    spans::record_error(&err);
                    return Err(err);
                }

                cancellable(&self.cancellation, async {
                    self.clock.sleep(delay).await;
                    Ok(())
                })
                .await?;
            }
        }
        .instrument(span)
        .await
    }

    /// One poll, with backoff for network-level failures only
    async fn fetch(&self, request: &AttestationRequest, attempt: u32) -> Result<AttestationResponse> {
        let span = spans::get_attestation(&request.message_hash(), attempt);

        self.retry
            .run_if(
                "get_attestation",
                |e| {
                    e.is_transient()
                        && !matches!(
                            e,
                            CctpError::AttestationNotFound | CctpError::RateLimitExceeded { .. }
                        )
                },
                || self.provider.get_attestation(request),
            )
            .instrument(span)
            .await
    }
}

impl std::fmt::Debug for AttestationPoller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttestationPoller")
            .field("polling", &self.polling)
            .finish_non_exhaustive()
    }
}
