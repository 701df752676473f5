// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! Attestation service request and response types

use alloy_primitives::{hex::FromHex, Bytes, FixedBytes, TxHash};
use serde::{Deserialize, Deserializer};

use super::{DomainId, ProtocolMessage};

/// Identifies one burn message to the attestation service.
///
/// Keyed by the burn message hash. The service indexes v2 messages by source
/// domain and burn transaction, so both travel with the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestationRequest {
    message: ProtocolMessage,
    transaction_hash: TxHash,
}

impl AttestationRequest {
    pub fn new(message: ProtocolMessage, transaction_hash: TxHash) -> Self {
        Self {
            message,
            transaction_hash,
        }
    }

    pub fn message_hash(&self) -> FixedBytes<32> {
        self.message.message_hash()
    }

    pub fn source_domain(&self) -> DomainId {
        self.message.source_domain()
    }

    pub fn transaction_hash(&self) -> TxHash {
        self.transaction_hash
    }

    /// The message as emitted by the burn
    pub fn message(&self) -> &ProtocolMessage {
        &self.message
    }
}

/// Response body of `GET /v2/messages/{sourceDomain}?transactionHash={tx}`
///
/// A transaction can emit several `MessageSent` events, so the service
/// answers with a list.
///
/// ```json
/// {
///   "messages": [
///     { "status": "complete", "message": "0x...", "attestation": "0x...", "eventNonce": "..." }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct MessagesResponse {
    #[serde(default)]
    pub messages: Vec<AttestationResponse>,
}

impl MessagesResponse {
    /// The entry for `burned`, or `None` when the service has not indexed it.
    ///
    /// Entries without message bytes are still pending; one of them stands in
    /// for the burn when nothing matches by content.
    pub fn into_entry_for(self, burned: &ProtocolMessage) -> Option<AttestationResponse> {
        let mut pending = None;

        for entry in self.messages {
            match entry.message.clone().map(ProtocolMessage::decode) {
                Some(Ok(message)) if burned.matches_attested(&message) => return Some(entry),
                Some(Ok(_)) => {}
                // no message yet, or a placeholder such as "0x"
                _ => {
                    pending.get_or_insert(entry);
                }
            }
        }

        pending
    }
}

/// One message's attestation status
///
/// # Example Response
///
/// ```json
/// {
///   "status": "complete",
///   "attestation": "0x...",
///   "message": "0x..."
/// }
/// ```
///
/// **API Quirk**: Circle's Iris API sometimes returns the string `"PENDING"` for
/// the attestation field instead of `null` when the attestation is not yet
/// ready. Both are treated as `None`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttestationResponse {
    pub status: AttestationStatus,
    #[serde(default, deserialize_with = "deserialize_optional_bytes_or_pending")]
    pub attestation: Option<Bytes>,
    /// The message as finalized by the service (v2 fills in the nonce)
    #[serde(default, deserialize_with = "deserialize_optional_bytes_or_pending")]
    pub message: Option<Bytes>,
}

impl AttestationResponse {
    pub fn pending() -> Self {
        Self {
            status: AttestationStatus::Pending,
            attestation: None,
            message: None,
        }
    }

    pub fn complete(attestation: Bytes) -> Self {
        Self {
            status: AttestationStatus::Complete,
            attestation: Some(attestation),
            message: None,
        }
    }

    pub fn failed() -> Self {
        Self {
            status: AttestationStatus::Failed,
            attestation: None,
            message: None,
        }
    }
}

/// Handles the following cases:
/// - Valid hex string (with or without "0x") → `Some(Bytes)`
/// - "PENDING" or "pending" → `None`
/// - null, missing field or empty string → `None`
/// - Invalid hex → error
fn deserialize_optional_bytes_or_pending<'de, D>(deserializer: D) -> Result<Option<Bytes>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;

    match opt {
        None => Ok(None),
        Some(s) if s.is_empty() => Ok(None),
        Some(s) if s.eq_ignore_ascii_case("pending") => Ok(None),
        Some(s) => {
            let bytes = Bytes::from_hex(s).map_err(serde::de::Error::custom)?;
            Ok(Some(bytes))
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AttestationStatus {
    Complete,
    Pending,
    PendingConfirmations,
    Failed,
}

/// A complete attestation for a burn message
///
/// Only constructed from a `complete` response that carried a signature, so
/// `status` is always [`AttestationStatus::Complete`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attestation {
    message_hash: FixedBytes<32>,
    signature: Bytes,
    status: AttestationStatus,
    attested_message: Option<Bytes>,
}

impl Attestation {
    pub fn new(message_hash: FixedBytes<32>, signature: Bytes) -> Self {
        Self {
            message_hash,
            signature,
            status: AttestationStatus::Complete,
            attested_message: None,
        }
    }

    pub fn with_attested_message(mut self, message: Option<Bytes>) -> Self {
        self.attested_message = message;
        self
    }

    pub fn message_hash(&self) -> FixedBytes<32> {
        self.message_hash
    }

    pub fn signature(&self) -> &Bytes {
        &self.signature
    }

    pub fn status(&self) -> AttestationStatus {
        self.status
    }

    /// Message bytes returned alongside the signature, if the service sent them
    pub fn attested_message(&self) -> Option<&Bytes> {
        self.attested_message.as_ref()
    }
}
