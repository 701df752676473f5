// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! Production implementations of the [`crate::traits`] seams.
//!
//! The chain-facing implementation lives in [`crate::connector`].

mod iris;
mod tokio_clock;

pub use self::iris::IrisAttestationProvider;
pub use self::tokio_clock::TokioClock;
