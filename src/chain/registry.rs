// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! Static chain registry
//!
//! Built once at startup and read-only afterwards. Each entry carries what a
//! connector needs to talk to one chain: RPC endpoint, contract addresses,
//! CCTP domain and the confirmation budget applied to every write.

use alloy_chains::NamedChain;
use alloy_primitives::Address;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::addresses::{
    ARBITRUM_SEPOLIA_USDC, AVALANCHE_FUJI_USDC, BASE_SEPOLIA_USDC,
    CCTP_V2_MESSAGE_TRANSMITTER_TESTNET, CCTP_V2_TOKEN_MESSENGER_TESTNET, ETHEREUM_SEPOLIA_USDC,
    OPTIMISM_SEPOLIA_USDC,
};
use crate::error::{CctpError, Result};
use crate::protocol::DomainId;

/// Everything the engine knows about one supported chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainConfig {
    pub chain: NamedChain,
    /// Human-readable name shown in logs
    pub name: &'static str,
    pub rpc_url: Url,
    pub usdc: Address,
    pub token_messenger: Address,
    pub message_transmitter: Address,
    pub domain: DomainId,
    /// Confirmations awaited after each approve/burn/mint transaction
    pub required_confirmations: u64,
    /// Average block time; used as the poll interval for block height
    pub block_time: Duration,
    /// Upper bound on waiting for `required_confirmations`
    pub confirmation_timeout: Duration,
    /// Environment variable that overrides `rpc_url`
    pub rpc_env_var: &'static str,
}

// (chain, name, rpc, usdc, confirmations, block time ms, timeout secs, env var)
type TestnetEntry = (
    NamedChain,
    &'static str,
    &'static str,
    Address,
    u64,
    u64,
    u64,
    &'static str,
);

const TESTNET_CHAINS: &[TestnetEntry] = &[
    (
        NamedChain::Sepolia,
        "Ethereum Sepolia",
        "https://ethereum-sepolia-rpc.publicnode.com",
        ETHEREUM_SEPOLIA_USDC,
        2,
        12_000,
        300,
        "SEPOLIA_RPC_URL",
    ),
    (
        NamedChain::AvalancheFuji,
        "Avalanche Fuji",
        "https://api.avax-test.network/ext/bc/C/rpc",
        AVALANCHE_FUJI_USDC,
        3,
        2_000,
        120,
        "AVALANCHE_FUJI_RPC_URL",
    ),
    (
        NamedChain::BaseSepolia,
        "Base Sepolia",
        "https://sepolia.base.org",
        BASE_SEPOLIA_USDC,
        1,
        2_000,
        120,
        "BASE_SEPOLIA_RPC_URL",
    ),
    (
        NamedChain::ArbitrumSepolia,
        "Arbitrum Sepolia",
        "https://sepolia-rollup.arbitrum.io/rpc",
        ARBITRUM_SEPOLIA_USDC,
        1,
        250,
        120,
        "ARBITRUM_SEPOLIA_RPC_URL",
    ),
    (
        NamedChain::OptimismSepolia,
        "OP Sepolia",
        "https://sepolia.optimism.io",
        OPTIMISM_SEPOLIA_USDC,
        1,
        2_000,
        120,
        "OPTIMISM_SEPOLIA_RPC_URL",
    ),
];

/// Ordered, read-only set of supported chains
///
/// ```rust
/// use alloy_chains::NamedChain;
/// use cctp_transfer::ChainRegistry;
///
/// let registry = ChainRegistry::testnet().unwrap();
/// assert_eq!(registry.supported_chains()[0], NamedChain::Sepolia);
/// assert_eq!(registry.name(NamedChain::BaseSepolia), Some("Base Sepolia"));
/// ```
#[derive(Debug, Clone)]
pub struct ChainRegistry {
    chains: Vec<ChainConfig>,
}

impl ChainRegistry {
    /// The five CCTP v2 testnets with public RPC endpoints
    pub fn testnet() -> Result<Self> {
        let chains = TESTNET_CHAINS
            .iter()
            .map(
                |&(chain, name, rpc, usdc, confirmations, block_ms, timeout_secs, env_var)| {
                    let domain =
                        DomainId::for_chain(chain).ok_or(CctpError::UnsupportedChain(chain))?;
                    Ok(ChainConfig {
                        chain,
                        name,
                        rpc_url: parse_rpc_url(rpc)?,
                        usdc,
                        token_messenger: CCTP_V2_TOKEN_MESSENGER_TESTNET,
                        message_transmitter: CCTP_V2_MESSAGE_TRANSMITTER_TESTNET,
                        domain,
                        required_confirmations: confirmations,
                        block_time: Duration::from_millis(block_ms),
                        confirmation_timeout: Duration::from_secs(timeout_secs),
                        rpc_env_var: env_var,
                    })
                },
            )
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { chains })
    }

    /// Builds a registry from explicit entries, keeping their order
    pub fn from_configs(chains: Vec<ChainConfig>) -> Self {
        Self { chains }
    }

    /// Replaces RPC URLs with values returned by `lookup` for each chain's
    /// `rpc_env_var`
    pub fn with_rpc_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        for config in &mut self.chains {
            if let Some(url) = lookup(config.rpc_env_var) {
                debug!(
                    chain = %config.chain,
                    env_var = config.rpc_env_var,
                    event = "rpc_url_override"
                );
                config.rpc_url = parse_rpc_url(&url)?;
            }
        }
        Ok(self)
    }

    /// Applies RPC overrides from the process environment (after `.env`)
    pub fn with_rpc_overrides_from_env(self) -> Result<Self> {
        dotenvy::dotenv().ok();
        self.with_rpc_overrides(|key| std::env::var(key).ok())
    }

    /// Chains in display order
    pub fn supported_chains(&self) -> Vec<NamedChain> {
        self.chains.iter().map(|config| config.chain).collect()
    }

    pub fn get(&self, chain: NamedChain) -> Result<&ChainConfig> {
        self.chains
            .iter()
            .find(|config| config.chain == chain)
            .ok_or(CctpError::UnsupportedChain(chain))
    }

    pub fn name(&self, chain: NamedChain) -> Option<&'static str> {
        self.get(chain).ok().map(|config| config.name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChainConfig> {
        self.chains.iter()
    }
}

fn parse_rpc_url(raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(|e| CctpError::InvalidUrl {
        reason: format!("{raw}: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_testnet_order() {
        let registry = ChainRegistry::testnet().unwrap();
        assert_eq!(
            registry.supported_chains(),
            vec![
                NamedChain::Sepolia,
                NamedChain::AvalancheFuji,
                NamedChain::BaseSepolia,
                NamedChain::ArbitrumSepolia,
                NamedChain::OptimismSepolia,
            ]
        );
    }

    #[rstest]
    #[case(NamedChain::Sepolia, DomainId::Ethereum, 2)]
    #[case(NamedChain::AvalancheFuji, DomainId::Avalanche, 3)]
    #[case(NamedChain::BaseSepolia, DomainId::Base, 1)]
    #[case(NamedChain::ArbitrumSepolia, DomainId::Arbitrum, 1)]
    #[case(NamedChain::OptimismSepolia, DomainId::Optimism, 1)]
    fn test_testnet_entries(
        #[case] chain: NamedChain,
        #[case] domain: DomainId,
        #[case] confirmations: u64,
    ) {
        let registry = ChainRegistry::testnet().unwrap();
        let config = registry.get(chain).unwrap();

        assert_eq!(config.domain, domain);
        assert_eq!(config.required_confirmations, confirmations);
        assert_eq!(config.token_messenger, CCTP_V2_TOKEN_MESSENGER_TESTNET);
        assert_eq!(config.message_transmitter, CCTP_V2_MESSAGE_TRANSMITTER_TESTNET);
    }

    #[test]
    fn test_unknown_chain() {
        let registry = ChainRegistry::testnet().unwrap();
        assert!(matches!(
            registry.get(NamedChain::Mainnet),
            Err(CctpError::UnsupportedChain(NamedChain::Mainnet))
        ));
        assert_eq!(registry.name(NamedChain::Mainnet), None);
    }

    #[test]
    fn test_rpc_override() {
        let registry = ChainRegistry::testnet()
            .unwrap()
            .with_rpc_overrides(|key| {
                (key == "BASE_SEPOLIA_RPC_URL").then(|| "http://localhost:8545".to_string())
            })
            .unwrap();

        assert_eq!(
            registry.get(NamedChain::BaseSepolia).unwrap().rpc_url.as_str(),
            "http://localhost:8545/"
        );
        assert_eq!(
            registry.get(NamedChain::Sepolia).unwrap().rpc_url.as_str(),
            "https://ethereum-sepolia-rpc.publicnode.com/"
        );
    }

    #[test]
    fn test_rpc_override_rejects_bad_url() {
        let result = ChainRegistry::testnet()
            .unwrap()
            .with_rpc_overrides(|_| Some("not a url".to_string()));
        assert!(matches!(result, Err(CctpError::InvalidUrl { .. })));
    }
}
