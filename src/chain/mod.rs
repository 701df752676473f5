// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! Chain configuration and contract addresses

mod addresses;
mod registry;

pub use addresses::{
    ARBITRUM_SEPOLIA_USDC, AVALANCHE_FUJI_USDC, BASE_SEPOLIA_USDC,
    CCTP_V2_MESSAGE_TRANSMITTER_TESTNET, CCTP_V2_TOKEN_MESSENGER_TESTNET, ETHEREUM_SEPOLIA_USDC,
    OPTIMISM_SEPOLIA_USDC,
};
pub use registry::{ChainConfig, ChainRegistry};
