// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! Signing credential supplied per transfer.

use alloy_network::EthereumWallet;
use alloy_primitives::Address;
use alloy_signer_local::PrivateKeySigner;
use std::fmt;

use crate::error::{CctpError, Result};

/// A local private-key signer.
///
/// Connectors borrow it for the duration of one call and never keep it.
/// `Debug` only prints the address.
#[derive(Clone)]
pub struct Credential {
    signer: PrivateKeySigner,
}

impl Credential {
    /// Parses a hex private key, with or without `0x`.
    pub fn from_private_key(key: &str) -> Result<Self> {
        let signer = key
            .trim()
            .parse::<PrivateKeySigner>()
            .map_err(|e| CctpError::InvalidCredential(e.to_string()))?;
        Ok(Self { signer })
    }

    /// Reads `PRIVATE_KEY` from the environment (after `.env`).
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let key = std::env::var("PRIVATE_KEY")
            .map_err(|_| CctpError::InvalidCredential("PRIVATE_KEY is not set".to_string()))?;
        Self::from_private_key(&key)
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub fn wallet(&self) -> EthereumWallet {
        EthereumWallet::from(self.signer.clone())
    }
}

impl From<PrivateKeySigner> for Credential {
    fn from(signer: PrivateKeySigner) -> Self {
        Self { signer }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    const ANVIL_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn test_parse_with_and_without_prefix() {
        let expected = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");

        let plain = Credential::from_private_key(ANVIL_KEY).unwrap();
        let prefixed = Credential::from_private_key(&format!("0x{ANVIL_KEY}")).unwrap();

        assert_eq!(plain.address(), expected);
        assert_eq!(prefixed.address(), expected);
    }

    #[test]
    fn test_rejects_garbage() {
        let err = Credential::from_private_key("not-a-key").unwrap_err();
        assert!(matches!(err, CctpError::InvalidCredential(_)));
    }

    #[test]
    fn test_debug_redacts_key() {
        let credential = Credential::from_private_key(ANVIL_KEY).unwrap();
        let debug = format!("{credential:?}");

        assert!(!debug.contains(ANVIL_KEY));
        assert!(debug.contains("address"));
    }
}
