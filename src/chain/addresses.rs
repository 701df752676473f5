// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! Contract addresses used by the testnet registry
//!
//! CCTP v2 deploys TokenMessengerV2 and MessageTransmitterV2 at the same
//! address on every testnet. USDC differs per chain.
//!
//! Reference: <https://developers.circle.com/cctp/evm-smart-contracts>

use alloy_primitives::{address, Address};

/// CCTP V2 TokenMessenger address (Testnet)
pub const CCTP_V2_TOKEN_MESSENGER_TESTNET: Address =
    address!("8FE6B999Dc680CcFDD5Bf7EB0974218be2542DAA");

/// CCTP V2 MessageTransmitter address (Testnet)
pub const CCTP_V2_MESSAGE_TRANSMITTER_TESTNET: Address =
    address!("E737e5cEBEEBa77EFE34D4aa090756590b1CE275");

// USDC Addresses
//
// <https://developers.circle.com/stablecoins/usdc-contract-addresses>

/// <https://sepolia.etherscan.io/address/0x1c7D4B196Cb0C7B01d743Fbc6116a902379C7238>
pub const ETHEREUM_SEPOLIA_USDC: Address = address!("1c7D4B196Cb0C7B01d743Fbc6116a902379C7238");

/// <https://testnet.snowtrace.io/address/0x5425890298aed601595a70AB815c96711a31Bc65>
pub const AVALANCHE_FUJI_USDC: Address = address!("5425890298aed601595a70AB815c96711a31Bc65");

/// <https://sepolia.basescan.org/address/0x036CbD53842c5426634e7929541eC2318f3dCF7e>
pub const BASE_SEPOLIA_USDC: Address = address!("036CbD53842c5426634e7929541eC2318f3dCF7e");

/// <https://sepolia.arbiscan.io/address/0x75faf114eafb1BDbe2F0316DF893fd58CE46AA4d>
pub const ARBITRUM_SEPOLIA_USDC: Address = address!("75faf114eafb1BDbe2F0316DF893fd58CE46AA4d");

/// <https://sepolia-optimism.etherscan.io/address/0x5fd84259d66Cd46123540766Be93DFE6D43130D7>
pub const OPTIMISM_SEPOLIA_USDC: Address = address!("5fd84259d66Cd46123540766Be93DFE6D43130D7");
