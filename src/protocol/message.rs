// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! CCTP v2 message format types
//!
//! The burn on the source chain emits `MessageSent(bytes message)`. The message
//! starts with a fixed 148-byte header followed by the burn body. Only the
//! header matters to the transfer engine: it names the domains and carries the
//! nonce used for replay protection on the destination chain.
//!
//! Reference: <https://developers.circle.com/cctp/technical-guide>

use alloy_primitives::{keccak256, Bytes, FixedBytes};

use super::DomainId;
use crate::error::{CctpError, Result};

/// CCTP v2 Message Header
///
/// # Format
///
/// - version: uint32 (4 bytes)
/// - sourceDomain: uint32 (4 bytes)
/// - destinationDomain: uint32 (4 bytes)
/// - nonce: bytes32 (32 bytes) - unique identifier assigned by Circle
/// - sender: bytes32 (32 bytes) - message sender address
/// - recipient: bytes32 (32 bytes) - message recipient address
/// - destinationCaller: bytes32 (32 bytes) - authorized caller on destination
/// - minFinalityThreshold: uint32 (4 bytes) - minimum required finality
/// - finalityThresholdExecuted: uint32 (4 bytes) - actual finality level
///
/// Total fixed size: 4 + 4 + 4 + 32 + 32 + 32 + 32 + 4 + 4 = 148 bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHeader {
    pub version: u32,
    pub source_domain: DomainId,
    pub destination_domain: DomainId,
    pub nonce: FixedBytes<32>,
    pub sender: FixedBytes<32>,
    pub recipient: FixedBytes<32>,
    pub destination_caller: FixedBytes<32>,
    pub min_finality_threshold: u32,
    pub finality_threshold_executed: u32,
}

impl MessageHeader {
    /// Size of the message header in bytes
    pub const SIZE: usize = 148;

    /// Encodes the message header to bytes
    pub fn encode(&self) -> Bytes {
        let mut bytes = Vec::with_capacity(Self::SIZE);

        bytes.extend_from_slice(&self.version.to_be_bytes());
        bytes.extend_from_slice(&self.source_domain.as_u32().to_be_bytes());
        bytes.extend_from_slice(&self.destination_domain.as_u32().to_be_bytes());
        bytes.extend_from_slice(self.nonce.as_slice());
        bytes.extend_from_slice(self.sender.as_slice());
        bytes.extend_from_slice(self.recipient.as_slice());
        bytes.extend_from_slice(self.destination_caller.as_slice());
        bytes.extend_from_slice(&self.min_finality_threshold.to_be_bytes());
        bytes.extend_from_slice(&self.finality_threshold_executed.to_be_bytes());

        Bytes::from(bytes)
    }

    /// Decodes a message header from the start of `bytes`
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < Self::SIZE {
            return Err(CctpError::MessageParseFailed {
                reason: format!(
                    "message is {} bytes, header needs {}",
                    bytes.len(),
                    Self::SIZE
                ),
            });
        }

        let word = |offset: usize| {
            u32::from_be_bytes([
                bytes[offset],
                bytes[offset + 1],
                bytes[offset + 2],
                bytes[offset + 3],
            ])
        };
        let domain = |offset: usize| {
            let value = word(offset);
            DomainId::from_u32(value).ok_or_else(|| CctpError::MessageParseFailed {
                reason: format!("unknown domain {value} at offset {offset}"),
            })
        };

        Ok(Self {
            version: word(0),
            source_domain: domain(4)?,
            destination_domain: domain(8)?,
            nonce: FixedBytes::from_slice(&bytes[12..44]),
            sender: FixedBytes::from_slice(&bytes[44..76]),
            recipient: FixedBytes::from_slice(&bytes[76..108]),
            destination_caller: FixedBytes::from_slice(&bytes[108..140]),
            min_finality_threshold: word(140),
            finality_threshold_executed: word(144),
        })
    }
}

/// The message produced by a burn, consumed unchanged by attestation and mint
///
/// Immutable once decoded; the hash is keccak256 over the raw message bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolMessage {
    source_domain: DomainId,
    destination_domain: DomainId,
    nonce: FixedBytes<32>,
    min_finality_threshold: u32,
    message_bytes: Bytes,
    message_hash: FixedBytes<32>,
}

impl ProtocolMessage {
    /// Decodes the raw `MessageSent` payload
    pub fn decode(message_bytes: Bytes) -> Result<Self> {
        let header = MessageHeader::decode(&message_bytes)?;
        let message_hash = keccak256(&message_bytes);

        Ok(Self {
            source_domain: header.source_domain,
            destination_domain: header.destination_domain,
            nonce: header.nonce,
            min_finality_threshold: header.min_finality_threshold,
            message_bytes,
            message_hash,
        })
    }

    pub fn source_domain(&self) -> DomainId {
        self.source_domain
    }

    pub fn destination_domain(&self) -> DomainId {
        self.destination_domain
    }

    pub fn nonce(&self) -> FixedBytes<32> {
        self.nonce
    }

    pub fn min_finality_threshold(&self) -> u32 {
        self.min_finality_threshold
    }

    pub fn message_bytes(&self) -> &Bytes {
        &self.message_bytes
    }

    pub fn message_hash(&self) -> FixedBytes<32> {
        self.message_hash
    }

    /// Whether `attested` is this burn message as returned by the attestation
    /// service.
    ///
    /// v2 fills in the nonce and the executed finality after the burn, so
    /// those header fields may differ; every other header field must match.
    pub fn matches_attested(&self, attested: &ProtocolMessage) -> bool {
        if self.message_hash == attested.message_hash {
            return true;
        }
        let burned = self.message_bytes.as_ref();
        let attested = attested.message_bytes.as_ref();
        burned[..NONCE_OFFSET] == attested[..NONCE_OFFSET]
            && burned[NONCE_OFFSET + 32..EXECUTED_OFFSET]
                == attested[NONCE_OFFSET + 32..EXECUTED_OFFSET]
    }
}

const NONCE_OFFSET: usize = 12;
const EXECUTED_OFFSET: usize = 144;

#[cfg(test)]
mod tests {
    use super::*;

    fn header(source: DomainId, destination: DomainId) -> MessageHeader {
        MessageHeader {
            version: 1,
            source_domain: source,
            destination_domain: destination,
            nonce: FixedBytes::from([1u8; 32]),
            sender: FixedBytes::from([2u8; 32]),
            recipient: FixedBytes::from([3u8; 32]),
            destination_caller: FixedBytes::ZERO,
            min_finality_threshold: 1000,
            finality_threshold_executed: 0,
        }
    }

    #[test]
    fn test_message_header_encode_decode() {
        let header = header(DomainId::Ethereum, DomainId::Avalanche);

        let encoded = header.encode();
        assert_eq!(encoded.len(), MessageHeader::SIZE);

        let decoded = MessageHeader::decode(&encoded).unwrap();
        assert_eq!(header, decoded);
    }

    #[test]
    fn test_message_header_decode_too_short() {
        let err = MessageHeader::decode(&[0u8; 100]).unwrap_err();
        assert!(matches!(err, CctpError::MessageParseFailed { .. }));
    }

    #[test]
    fn test_message_header_decode_invalid_domain() {
        let mut bytes = vec![0u8; MessageHeader::SIZE];
        bytes[4..8].copy_from_slice(&999u32.to_be_bytes());

        let err = MessageHeader::decode(&bytes).unwrap_err();
        insta::assert_snapshot!(err.to_string(), @"MessageSent parse failed: unknown domain 999 at offset 4");
    }

    #[test]
    fn test_protocol_message_decode_with_body() {
        let mut bytes = header(DomainId::Base, DomainId::Arbitrum).encode().to_vec();
        bytes.extend_from_slice(&[0xaa; 228]);
        let bytes = Bytes::from(bytes);

        let message = ProtocolMessage::decode(bytes.clone()).unwrap();

        assert_eq!(message.source_domain(), DomainId::Base);
        assert_eq!(message.destination_domain(), DomainId::Arbitrum);
        assert_eq!(message.nonce(), FixedBytes::from([1u8; 32]));
        assert_eq!(message.min_finality_threshold(), 1000);
        assert_eq!(message.message_bytes(), &bytes);
        assert_eq!(message.message_hash(), keccak256(&bytes));
    }

    #[test]
    fn test_attested_form_matches_despite_nonce() {
        let mut burned = header(DomainId::Ethereum, DomainId::Base);
        burned.nonce = FixedBytes::ZERO;
        let mut attested = burned.clone();
        attested.nonce = FixedBytes::from([9u8; 32]);
        attested.finality_threshold_executed = 1000;
        let mut other_route = attested.clone();
        other_route.destination_domain = DomainId::Arbitrum;

        let burned = ProtocolMessage::decode(burned.encode()).unwrap();

        assert!(burned.matches_attested(&burned));
        assert!(burned.matches_attested(&ProtocolMessage::decode(attested.encode()).unwrap()));
        assert!(!burned.matches_attested(&ProtocolMessage::decode(other_route.encode()).unwrap()));
    }
}
