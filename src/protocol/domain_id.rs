// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! CCTP domain identifiers
//!
//! A domain is the protocol-level identifier of a chain. It is distinct from the
//! chain's native network id: Ethereum mainnet and Sepolia share domain 0.
//!
//! Reference: <https://developers.circle.com/stablecoins/evm-smart-contracts>

use alloy_chains::NamedChain;
use std::fmt;

/// CCTP domain identifier for the EVM networks this crate can bridge between
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[repr(u32)]
#[non_exhaustive]
pub enum DomainId {
    Ethereum = 0,
    Avalanche = 1,
    Optimism = 2,
    Arbitrum = 3,
    Base = 6,
    Polygon = 7,
    Unichain = 10,
    Linea = 11,
    Sonic = 13,
    WorldChain = 14,
    Sei = 16,
}

impl DomainId {
    #[inline]
    pub const fn as_u32(self) -> u32 {
        self as u32
    }

    /// Attempts to create a DomainId from the value carried in a message header
    ///
    /// ```rust
    /// use cctp_transfer::DomainId;
    ///
    /// assert_eq!(DomainId::from_u32(1), Some(DomainId::Avalanche));
    /// assert_eq!(DomainId::from_u32(999), None);
    /// ```
    #[inline]
    pub const fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::Ethereum),
            1 => Some(Self::Avalanche),
            2 => Some(Self::Optimism),
            3 => Some(Self::Arbitrum),
            6 => Some(Self::Base),
            7 => Some(Self::Polygon),
            10 => Some(Self::Unichain),
            11 => Some(Self::Linea),
            13 => Some(Self::Sonic),
            14 => Some(Self::WorldChain),
            16 => Some(Self::Sei),
            _ => None,
        }
    }

    /// Returns the domain a named chain (mainnet or testnet) belongs to
    pub const fn for_chain(chain: NamedChain) -> Option<Self> {
        Some(match chain {
            NamedChain::Mainnet | NamedChain::Sepolia => Self::Ethereum,
            NamedChain::Avalanche | NamedChain::AvalancheFuji => Self::Avalanche,
            NamedChain::Optimism | NamedChain::OptimismSepolia => Self::Optimism,
            NamedChain::Arbitrum | NamedChain::ArbitrumSepolia => Self::Arbitrum,
            NamedChain::Base | NamedChain::BaseSepolia => Self::Base,
            NamedChain::Polygon | NamedChain::PolygonAmoy => Self::Polygon,
            NamedChain::Unichain => Self::Unichain,
            NamedChain::Linea => Self::Linea,
            NamedChain::Sonic => Self::Sonic,
            NamedChain::Sei => Self::Sei,
            _ => return None,
        })
    }

    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ethereum => "Ethereum",
            Self::Avalanche => "Avalanche",
            Self::Optimism => "Optimism",
            Self::Arbitrum => "Arbitrum",
            Self::Base => "Base",
            Self::Polygon => "Polygon",
            Self::Unichain => "Unichain",
            Self::Linea => "Linea",
            Self::Sonic => "Sonic",
            Self::WorldChain => "World Chain",
            Self::Sei => "Sei",
        }
    }
}

impl From<DomainId> for u32 {
    #[inline]
    fn from(domain: DomainId) -> Self {
        domain.as_u32()
    }
}

impl fmt::Display for DomainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.as_u32())
    }
}
