// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! Engine configuration
//!
//! Values load from the process environment (after `.env` via `dotenvy`) or
//! from any `lookup` function, which keeps tests independent of the real
//! environment.

use alloy_primitives::U256;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

use crate::error::{CctpError, Result};

/// Circle Iris API environment URLs
///
/// See <https://developers.circle.com/stablecoins/cctp-apis>
pub const IRIS_API: &str = "https://iris-api.circle.com";
pub const IRIS_API_SANDBOX: &str = "https://iris-api-sandbox.circle.com";

/// Default `maxFee` for fast transfers, in USDC base units (0.0005 USDC)
pub const DEFAULT_FAST_TRANSFER_MAX_FEE: u64 = 500;

/// Polling and retry budgets for waits that outlive a single request.
///
/// ```rust
/// use cctp_transfer::PollingConfig;
/// use std::time::Duration;
///
/// let config = PollingConfig::default()
///     .with_max_attempts(20)
///     .with_poll_interval(Duration::from_secs(5));
/// assert_eq!(config.total_timeout(), Duration::from_secs(100));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingConfig {
    /// Delay between attestation polls
    pub poll_interval: Duration,
    /// Attestation polls answered "pending" before giving up
    pub max_attempts: u32,
    /// Retries of a single transient read failure
    pub max_retries: usize,
    pub min_backoff: Duration,
    pub max_backoff: Duration,
    /// Upper bound on waiting for source-chain finality before polling
    pub finality_timeout: Duration,
}

impl Default for PollingConfig {
    /// - `poll_interval`: 2 seconds
    /// - `max_attempts`: 300 (10 minutes of pending responses)
    /// - `max_retries`: 5, backing off from 500 ms up to 30 s
    /// - `finality_timeout`: 12 hours
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            max_attempts: 300,
            max_retries: 5,
            min_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
            finality_timeout: Duration::from_secs(12 * 60 * 60),
        }
    }
}

impl PollingConfig {
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn with_max_retries(mut self, retries: usize) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn with_backoff(mut self, min: Duration, max: Duration) -> Self {
        self.min_backoff = min;
        self.max_backoff = max;
        self
    }

    pub fn with_finality_timeout(mut self, timeout: Duration) -> Self {
        self.finality_timeout = timeout;
        self
    }

    /// Longest time spent polling pending attestations
    pub fn total_timeout(&self) -> Duration {
        self.poll_interval.saturating_mul(self.max_attempts)
    }

    /// Reads `ATTESTATION_POLL_INTERVAL_SECS` and `ATTESTATION_MAX_ATTEMPTS`
    pub fn from_env_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(secs) = parse_var::<u64, _>(&lookup, "ATTESTATION_POLL_INTERVAL_SECS")? {
            config.poll_interval = Duration::from_secs(secs);
        }
        if let Some(attempts) = parse_var::<u32, _>(&lookup, "ATTESTATION_MAX_ATTEMPTS")? {
            config.max_attempts = attempts;
        }
        Ok(config)
    }

    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_env_vars(|key| std::env::var(key).ok())
    }
}

/// Per-engine transfer settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferSettings {
    /// `maxFee` passed to `depositForBurn` in fast mode, in base units
    pub fast_max_fee: U256,
    /// Base URL of the attestation service
    pub attestation_api_url: String,
}

impl Default for TransferSettings {
    fn default() -> Self {
        Self {
            fast_max_fee: U256::from(DEFAULT_FAST_TRANSFER_MAX_FEE),
            attestation_api_url: IRIS_API_SANDBOX.to_string(),
        }
    }
}

impl TransferSettings {
    pub fn with_fast_max_fee(mut self, max_fee: U256) -> Self {
        self.fast_max_fee = max_fee;
        self
    }

    pub fn with_attestation_api_url(mut self, url: impl Into<String>) -> Self {
        self.attestation_api_url = url.into();
        self
    }

    /// Reads `IRIS_API_URL` and `FAST_TRANSFER_MAX_FEE`
    pub fn from_env_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();
        if let Some(raw) = lookup("IRIS_API_URL") {
            let url = Url::parse(raw.trim()).map_err(|e| CctpError::InvalidUrl {
                reason: format!("IRIS_API_URL={raw}: {e}"),
            })?;
            settings.attestation_api_url = url.as_str().trim_end_matches('/').to_string();
        }
        if let Some(fee) = parse_var::<u64, _>(&lookup, "FAST_TRANSFER_MAX_FEE")? {
            settings.fast_max_fee = U256::from(fee);
        }
        Ok(settings)
    }

    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_env_vars(|key| std::env::var(key).ok())
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| CctpError::InvalidConfig(format!("{key}={raw}: {e}")))
        })
        .transpose()
}
