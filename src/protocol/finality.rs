// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! Transfer modes and their finality policies
//!
//! Circle's CCTP v2 lets a burn declare the minimum finality it needs before
//! Iris signs it. The engine additionally refuses to act on an attestation
//! until the source chain has produced the same number of confirmations on top
//! of the burn. Both values are part of the protocol's trust model and are
//! fixed per mode.
//!
//! Reference: <https://developers.circle.com/cctp/technical-guide>

use std::fmt;
use std::str::FromStr;

use crate::error::CctpError;

/// `minFinalityThreshold` for Fast Transfer ("confirmed" level)
pub const FAST_FINALITY_THRESHOLD: u32 = 1000;

/// `minFinalityThreshold` for Standard Transfer ("finalized" level)
pub const STANDARD_FINALITY_THRESHOLD: u32 = 2000;

/// How quickly a transfer settles, chosen by the caller per request
///
/// # Examples
///
/// ```rust
/// use cctp_transfer::TransferMode;
///
/// let policy = TransferMode::Fast.finality_policy();
/// assert_eq!(policy.min_finality_threshold(), 1000);
/// assert_eq!(policy.required_confirmations(), 1000);
///
/// let mode: TransferMode = "standard".parse().unwrap();
/// assert_eq!(mode.finality_policy().required_confirmations(), 2000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferMode {
    /// Attested at the confirmed block level; may carry a small fee
    Fast,
    /// Attested at the finalized block level; no fee
    #[default]
    Standard,
}

impl TransferMode {
    /// Pure lookup from mode to its finality policy
    #[inline]
    pub const fn finality_policy(self) -> FinalityPolicy {
        match self {
            Self::Fast => FinalityPolicy {
                min_finality_threshold: FAST_FINALITY_THRESHOLD,
                required_confirmations: FAST_FINALITY_THRESHOLD as u64,
            },
            Self::Standard => FinalityPolicy {
                min_finality_threshold: STANDARD_FINALITY_THRESHOLD,
                required_confirmations: STANDARD_FINALITY_THRESHOLD as u64,
            },
        }
    }

    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Fast => "Fast Transfer",
            Self::Standard => "Standard Transfer",
        }
    }

    #[inline]
    pub const fn is_fast(self) -> bool {
        matches!(self, Self::Fast)
    }
}

impl fmt::Display for TransferMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({})",
            self.name(),
            self.finality_policy().min_finality_threshold
        )
    }
}

impl FromStr for TransferMode {
    type Err = CctpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fast" => Ok(Self::Fast),
            "standard" => Ok(Self::Standard),
            other => Err(CctpError::InvalidConfig(format!(
                "unknown transfer mode '{other}' (expected 'fast' or 'standard')"
            ))),
        }
    }
}

/// Finality requirements attached to a transfer at request creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FinalityPolicy {
    min_finality_threshold: u32,
    required_confirmations: u64,
}

impl FinalityPolicy {
    /// Value passed as `minFinalityThreshold` to `depositForBurn`
    #[inline]
    pub const fn min_finality_threshold(&self) -> u32 {
        self.min_finality_threshold
    }

    /// Source-chain confirmations required before an attestation is actionable
    #[inline]
    pub const fn required_confirmations(&self) -> u64 {
        self.required_confirmations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(TransferMode::Fast, 1000, 1000)]
    #[case(TransferMode::Standard, 2000, 2000)]
    fn test_mode_to_policy(
        #[case] mode: TransferMode,
        #[case] threshold: u32,
        #[case] confirmations: u64,
    ) {
        let policy = mode.finality_policy();
        assert_eq!(policy.min_finality_threshold(), threshold);
        assert_eq!(policy.required_confirmations(), confirmations);
    }

    #[rstest]
    #[case("fast", TransferMode::Fast)]
    #[case("Fast", TransferMode::Fast)]
    #[case(" standard ", TransferMode::Standard)]
    fn test_parse_mode(#[case] input: &str, #[case] expected: TransferMode) {
        assert_eq!(input.parse::<TransferMode>().unwrap(), expected);
    }

    #[test]
    fn test_parse_unknown_mode() {
        assert!("instant".parse::<TransferMode>().is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(TransferMode::Fast.to_string(), "Fast Transfer (1000)");
        assert_eq!(TransferMode::Standard.to_string(), "Standard Transfer (2000)");
    }

    #[test]
    fn test_default_is_standard() {
        assert_eq!(TransferMode::default(), TransferMode::Standard);
        assert!(!TransferMode::default().is_fast());
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_string(&TransferMode::Fast).unwrap(), r#""fast""#);
        let mode: TransferMode = serde_json::from_str(r#""standard""#).unwrap();
        assert_eq!(mode, TransferMode::Standard);
    }
}
