// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! USDC amounts
//!
//! USDC uses 6 decimals on every supported chain. Callers supply amounts as
//! decimal strings ("10", "0.5", "12.345678"); on-chain calls use base units.

use alloy_primitives::U256;
use std::fmt;

use crate::error::{CctpError, Result};

/// Number of decimals of the USDC token
pub const USDC_DECIMALS: usize = 6;

const UNIT: u64 = 1_000_000;

/// An amount of USDC held as base units (1 USDC = 1_000_000)
///
/// ```rust
/// use cctp_transfer::UsdcAmount;
///
/// let amount = UsdcAmount::parse_decimal("10.5").unwrap();
/// assert_eq!(amount.base_units().to::<u64>(), 10_500_000);
/// assert_eq!(amount.to_string(), "10.500000");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, serde::Serialize)]
#[serde(transparent)]
pub struct UsdcAmount(U256);

impl UsdcAmount {
    pub const ZERO: Self = Self(U256::ZERO);

    #[inline]
    pub const fn from_base_units(units: U256) -> Self {
        Self(units)
    }

    #[inline]
    pub const fn base_units(&self) -> U256 {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Parses a positive decimal USDC amount
    ///
    /// Rejects empty input, signs, exponents, more than six fractional digits,
    /// values that overflow 256 bits and amounts that are not strictly positive.
    pub fn parse_decimal(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let invalid = |reason: String| CctpError::InvalidAmount { reason };

        if trimmed.is_empty() {
            return Err(invalid("amount is empty".to_string()));
        }

        let (whole, fraction) = match trimmed.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (trimmed, ""),
        };

        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid(format!("'{trimmed}' is not a number")));
        }
        if !whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit()) {
            return Err(invalid(format!("'{trimmed}' is not a positive decimal number")));
        }
        if fraction.len() > USDC_DECIMALS {
            return Err(invalid(format!(
                "'{trimmed}' has more than {USDC_DECIMALS} decimal places"
            )));
        }

        let mut digits = String::with_capacity(whole.len() + USDC_DECIMALS);
        digits.push_str(whole);
        digits.push_str(fraction);
        digits.extend(std::iter::repeat('0').take(USDC_DECIMALS - fraction.len()));

        let units = U256::from_str_radix(&digits, 10)
            .map_err(|_| invalid(format!("'{trimmed}' is too large")))?;

        if units.is_zero() {
            return Err(invalid("amount must be greater than zero".to_string()));
        }

        Ok(Self(units))
    }
}

impl From<U256> for UsdcAmount {
    fn from(units: U256) -> Self {
        Self(units)
    }
}

impl fmt::Display for UsdcAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = U256::from(UNIT);
        let whole = self.0 / unit;
        let fraction = (self.0 % unit).to::<u64>();
        write!(f, "{whole}.{fraction:0width$}", width = USDC_DECIMALS)
    }
}
