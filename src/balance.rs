// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
use alloy_chains::NamedChain;
use tracing::debug;

use crate::connector::ConnectorSet;
use crate::credential::Credential;
use crate::error::Result;
use crate::protocol::UsdcAmount;
use crate::retry::RetryPolicy;

/// Read-only USDC balance lookup, independent of any transfer.
#[derive(Debug, Clone)]
pub struct BalanceQuery {
    connectors: ConnectorSet,
    retry: RetryPolicy,
}

impl BalanceQuery {
    pub fn new(connectors: ConnectorSet, retry: RetryPolicy) -> Self {
        Self { connectors, retry }
    }

    /// Balance of the credential's address on `chain`.
    ///
    /// Transient RPC failures are retried within the policy's budget.
    pub async fn get_balance(&self, credential: &Credential, chain: NamedChain) -> Result<UsdcAmount> {
        let connector = self.connectors.get(chain)?;
        let owner = credential.address();

        let units = self
            .retry
            .run("get_balance", || connector.get_balance(owner))
            .await?;
        let balance = UsdcAmount::from_base_units(units);

        debug!(chain = %chain, owner = %owner, balance = %balance, event = "balance_fetched");
        Ok(balance)
    }
}
