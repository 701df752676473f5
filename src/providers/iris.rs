// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! Circle Iris API attestation provider implementation.

use alloy_primitives::TxHash;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, instrument, trace};

use crate::config::{IRIS_API, IRIS_API_SANDBOX};
use crate::error::{CctpError, Result};
use crate::protocol::{AttestationRequest, AttestationResponse, DomainId, MessagesResponse};
use crate::traits::AttestationProvider;

/// Seconds to wait when a 429 carries no usable `Retry-After` header
const DEFAULT_RETRY_AFTER_SECS: u64 = 30;

/// Attestation provider backed by Circle's Iris API.
///
/// Queries `GET /v2/messages/{sourceDomain}?transactionHash={burnTx}` and
/// picks the entry for the requested burn message.
///
/// Status handling:
/// - `404`, or no entry for the message → [`CctpError::AttestationNotFound`]
///   (not indexed yet)
/// - `429` → [`CctpError::RateLimitExceeded`] using `Retry-After`
/// - `5xx` → [`CctpError::AttestationUnavailable`]
/// - other non-success codes → [`CctpError::Network`]
///
/// # Examples
///
/// ```rust,no_run
/// use cctp_transfer::providers::IrisAttestationProvider;
/// use cctp_transfer::traits::AttestationProvider;
/// use cctp_transfer::{AttestationRequest, BurnReceipt};
///
/// # async fn example(burn: BurnReceipt) -> Result<(), cctp_transfer::CctpError> {
/// let provider = IrisAttestationProvider::sandbox();
/// let request = AttestationRequest::new(burn.message, burn.receipt.tx_hash);
/// let response = provider.get_attestation(&request).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct IrisAttestationProvider {
    base_url: String,
    client: Client,
}

impl IrisAttestationProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    pub fn production() -> Self {
        Self::new(IRIS_API)
    }

    pub fn sandbox() -> Self {
        Self::new(IRIS_API_SANDBOX)
    }

    fn messages_url(&self, source_domain: DomainId, transaction_hash: TxHash) -> String {
        format!(
            "{}/v2/messages/{}?transactionHash={transaction_hash}",
            self.base_url,
            source_domain.as_u32()
        )
    }
}

#[async_trait]
impl AttestationProvider for IrisAttestationProvider {
    #[instrument(
        skip(self, request),
        fields(
            message_hash = %request.message_hash(),
            transaction_hash = %request.transaction_hash()
        )
    )]
    async fn get_attestation(&self, request: &AttestationRequest) -> Result<AttestationResponse> {
        let url = self.messages_url(request.source_domain(), request.transaction_hash());
        trace!(url = %url, event = "attestation_request");

        let response = self.client.get(&url).send().await?;
        let status_code = response.status();
        trace!(status_code = %status_code, event = "attestation_response");

        if status_code == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);

            debug!(retry_after_seconds = retry_after, event = "attestation_rate_limited");
            return Err(CctpError::RateLimitExceeded {
                retry_after_seconds: retry_after,
            });
        }

        if status_code == StatusCode::NOT_FOUND {
            debug!(event = "attestation_not_found");
            return Err(CctpError::AttestationNotFound);
        }

        if status_code.is_server_error() {
            debug!(status_code = %status_code, event = "attestation_service_error");
            return Err(CctpError::AttestationUnavailable {
                status: status_code.as_u16(),
            });
        }

        response.error_for_status_ref()?;

        let body = response.text().await?;
        let messages: MessagesResponse = serde_json::from_str(&body)?;
        let count = messages.messages.len();
        let attestation = messages.into_entry_for(request.message()).ok_or_else(|| {
            debug!(messages = count, event = "attestation_message_not_listed");
            CctpError::AttestationNotFound
        })?;
        debug!(status = ?attestation.status, event = "attestation_response_parsed");

        Ok(attestation)
    }
}
