// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! Transfer state machine.
//!
//! [`TransferOrchestrator`] sequences validation, approval, burn, attestation
//! and mint for one transfer at a time, publishing every step change and log
//! entry through a [`tokio::sync::watch`] channel.

mod state;

pub use state::{LogEntry, LogKind, RecoveryInfo, TransferState, TransferStep};

use alloy_chains::NamedChain;
use alloy_primitives::{FixedBytes, TxHash};
use bon::Builder;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn, Instrument};

use crate::balance::BalanceQuery;
use crate::chain::ChainRegistry;
use crate::config::{PollingConfig, TransferSettings};
use crate::connector::{ChainConnector, ConfirmationWaiter, ConnectorSet};
use crate::credential::Credential;
use crate::error::{CctpError, Result};
use crate::protocol::{TransferMode, UsdcAmount};
use crate::providers::{IrisAttestationProvider, TokioClock};
use crate::retry::RetryPolicy;
use crate::spans;
use crate::steps::{
    ApprovalOutcome, ApprovalStep, AttestationOutcome, AttestationPoller, BurnStep, MintOutcome,
    MintStep,
};
use crate::traits::{AttestationProvider, Clock};

/// One transfer as requested by the caller
///
/// `amount` is a human-readable USDC decimal such as `"10"` or `"0.25"`.
#[derive(Builder, Debug, Clone)]
pub struct TransferRequest {
    credential: Credential,
    source_chain: NamedChain,
    destination_chain: NamedChain,
    #[builder(into)]
    amount: String,
    #[builder(default)]
    mode: TransferMode,
}

impl TransferRequest {
    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    pub fn source_chain(&self) -> NamedChain {
        self.source_chain
    }

    pub fn destination_chain(&self) -> NamedChain {
        self.destination_chain
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }

    pub fn mode(&self) -> TransferMode {
        self.mode
    }
}

/// Result of a completed transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferOutcome {
    pub burn_tx_hash: TxHash,
    /// `None` when the destination had already received the message
    pub mint_tx_hash: Option<TxHash>,
    pub message_hash: FixedBytes<32>,
    pub amount: UsdcAmount,
    pub elapsed: Duration,
}

/// Drives one cross-chain transfer at a time.
///
/// # Examples
///
/// ```rust,no_run
/// use alloy_chains::NamedChain;
/// use cctp_transfer::{
///     ChainRegistry, Credential, PollingConfig, TransferMode, TransferOrchestrator,
///     TransferRequest, TransferSettings,
/// };
///
/// # async fn example() -> Result<(), cctp_transfer::CctpError> {
/// let registry = ChainRegistry::testnet()?.with_rpc_overrides_from_env()?;
/// let orchestrator = TransferOrchestrator::connect(
///     &registry,
///     TransferSettings::from_env()?,
///     PollingConfig::from_env()?,
/// );
///
/// let mut updates = orchestrator.subscribe();
/// tokio::spawn(async move {
///     while updates.changed().await.is_ok() {
///         println!("step: {}", updates.borrow().step);
///     }
/// });
///
/// let request = TransferRequest::builder()
///     .credential(Credential::from_env()?)
///     .source_chain(NamedChain::Sepolia)
///     .destination_chain(NamedChain::BaseSepolia)
///     .amount("10")
///     .mode(TransferMode::Fast)
///     .build();
/// let outcome = orchestrator.execute_transfer(request).await?;
/// println!("minted in {:?}", outcome.elapsed);
/// # Ok(())
/// # }
/// ```
#[derive(Builder)]
pub struct TransferOrchestrator {
    connectors: ConnectorSet,
    attestation_provider: Arc<dyn AttestationProvider>,
    #[builder(default = Arc::new(TokioClock::new()) as Arc<dyn Clock>)]
    clock: Arc<dyn Clock>,
    #[builder(default)]
    polling: PollingConfig,
    #[builder(default)]
    settings: TransferSettings,
    #[builder(skip = watch::Sender::new(TransferState::default()))]
    state: watch::Sender<TransferState>,
    #[builder(skip)]
    cancellation: Mutex<Option<CancellationToken>>,
}

impl TransferOrchestrator {
    /// Alloy connectors for every registry chain, Iris at the configured URL
    /// and the Tokio clock
    pub fn connect(
        registry: &ChainRegistry,
        settings: TransferSettings,
        polling: PollingConfig,
    ) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(TokioClock::new());
        let connectors = ConnectorSet::connect(registry);
        let provider = IrisAttestationProvider::new(settings.attestation_api_url.clone());

        Self::builder()
            .connectors(connectors)
            .attestation_provider(Arc::new(provider))
            .clock(clock)
            .polling(polling)
            .settings(settings)
            .build()
    }

    /// Testnet registry, settings and polling all read from the environment
    pub fn from_env() -> Result<Self> {
        let registry = ChainRegistry::testnet()?.with_rpc_overrides_from_env()?;
        Ok(Self::connect(
            &registry,
            TransferSettings::from_env()?,
            PollingConfig::from_env()?,
        ))
    }

    /// Receiver notified on every step change and log entry
    pub fn subscribe(&self) -> watch::Receiver<TransferState> {
        self.state.subscribe()
    }

    pub fn current_state(&self) -> TransferState {
        self.state.borrow().clone()
    }

    /// Runs a transfer to completion or failure.
    ///
    /// Rejected with [`CctpError::TransferInFlight`], leaving state untouched,
    /// while another transfer is running. Every other failure ends in
    /// [`TransferStep::Error`] with an error log entry.
    pub async fn execute_transfer(&self, request: TransferRequest) -> Result<TransferOutcome> {
        let token = self.begin()?;
        self.drive(request, token).await
    }

    /// Like [`execute_transfer`](Self::execute_transfer) but on a Tokio task.
    ///
    /// The re-entrancy check happens before spawning, so a rejected request
    /// never starts a task.
    pub fn spawn_transfer(
        self: &Arc<Self>,
        request: TransferRequest,
    ) -> Result<JoinHandle<Result<TransferOutcome>>> {
        let token = self.begin()?;
        let orchestrator = Arc::clone(self);
        Ok(tokio::spawn(async move {
            orchestrator.drive(request, token).await
        }))
    }

    /// Requests cooperative cancellation of the running transfer.
    ///
    /// Observed between steps, at every confirmation wait and at every
    /// attestation poll. Transactions already submitted are not undone.
    pub fn cancel(&self) {
        if let Some(token) = self.cancellation().as_ref() {
            info!(event = "transfer_cancel_requested");
            token.cancel();
        }
    }

    /// Returns to Idle and clears the log.
    ///
    /// Only valid from Completed or Error; rejected otherwise without side
    /// effects.
    pub fn reset(&self) -> Result<()> {
        let mut rejected = None;
        self.state.send_if_modified(|state| {
            if !state.step.accepts_reset() {
                rejected = Some(state.step);
                return false;
            }
            *state = TransferState::default();
            true
        });

        if let Some(step) = rejected {
            warn!(step = %step, event = "reset_rejected");
            return Err(CctpError::InvalidReset { step });
        }

        if let Some(token) = self.cancellation().take() {
            token.cancel();
        }
        info!(event = "transfer_reset");
        Ok(())
    }

    /// USDC balance of the credential on `chain`; usable mid-transfer
    pub async fn get_balance(&self, credential: &Credential, chain: NamedChain) -> Result<UsdcAmount> {
        self.balances().get_balance(credential, chain).await
    }

    fn balances(&self) -> BalanceQuery {
        BalanceQuery::new(self.connectors.clone(), self.retry())
    }

    fn retry(&self) -> RetryPolicy {
        RetryPolicy::new(self.clock.clone(), &self.polling)
    }

    fn cancellation(&self) -> MutexGuard<'_, Option<CancellationToken>> {
        self.cancellation
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Atomically claims the orchestrator for a new transfer
    fn begin(&self) -> Result<CancellationToken> {
        let mut claimed = false;
        self.state.send_if_modified(|state| {
            if !state.step.accepts_start() {
                return false;
            }
            *state = TransferState {
                step: TransferStep::Validating,
                ..TransferState::default()
            };
            claimed = true;
            true
        });

        if !claimed {
            warn!(event = "transfer_rejected_in_flight");
            return Err(CctpError::TransferInFlight);
        }

        let token = CancellationToken::new();
        *self.cancellation() = Some(token.clone());
        Ok(token)
    }

    async fn drive(&self, request: TransferRequest, token: CancellationToken) -> Result<TransferOutcome> {
        let span = spans::execute_transfer(
            &request.source_chain,
            &request.destination_chain,
            &request.amount,
            request.mode.name(),
        );

        async {
            let started = self.clock.now();
            let mut current = TransferStep::Validating;

            match self.run(&request, &token, &mut current).await {
                Ok(mut outcome) => {
                    outcome.elapsed = self.clock.now().duration_since(started);
                    let message = format!(
                        "Transfer of {} USDC completed in {}s",
                        outcome.amount,
                        outcome.elapsed.as_secs()
                    );
                    self.state.send_modify(|state| {
                        state.push(TransferStep::Completed, LogKind::Info, message);
                        state.step = TransferStep::Completed;
                    });
                    info!(
                        burn_tx_hash = %outcome.burn_tx_hash,
                        message_hash = %outcome.message_hash,
                        elapsed_secs = outcome.elapsed.as_secs(),
                        event = "transfer_completed"
                    );
                    Ok(outcome)
                }
                Err(err) => {
                    let recovery = self.state.borrow().recovery;
                    let err = match recovery {
                        Some(recovery) => err.after_burn(current, &recovery),
                        None => err,
                    };
                    let context = recovery.map(|r| {
                        format!("burn_tx_hash={} message_hash={}", r.burn_tx_hash, r.message_hash)
                    });
                    spans::record_error_with_context(
                        err.kind().label(),
                        &err.to_string(),
                        context.as_deref(),
                    );
                    error!(
                        step = %current,
                        kind = %err.kind(),
                        error = %err,
                        event = "transfer_failed"
                    );
                    self.fail(current, &err);
                    Err(err)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn run(
        &self,
        request: &TransferRequest,
        token: &CancellationToken,
        current: &mut TransferStep,
    ) -> Result<TransferOutcome> {
        let (amount, source, destination) = self.validate(request).await?;
        let source_name = source.config().name;
        let destination_name = destination.config().name;
        self.log(
            TransferStep::Validating,
            LogKind::Info,
            format!(
                "Validated {amount} USDC from {source_name} to {destination_name} ({})",
                request.mode
            ),
        );

        let retry = self.retry();
        let waiter = ConfirmationWaiter::new(self.clock.clone(), retry.clone())
            .with_cancellation(token.clone());
        let credential = &request.credential;

        self.advance(TransferStep::Approving, current, token)?;
        let approval = ApprovalStep::new(retry.clone(), waiter.clone())
            .execute(source.as_ref(), credential, amount.base_units())
            .await?;
        let message = match approval {
            ApprovalOutcome::Sufficient { allowance } => format!(
                "Existing allowance of {} USDC covers the transfer",
                UsdcAmount::from_base_units(allowance)
            ),
            ApprovalOutcome::Approved(receipt) => {
                format!("Approved {amount} USDC on {source_name} (tx {})", receipt.tx_hash)
            }
        };
        self.log(TransferStep::Approving, LogKind::Info, message);

        self.advance(TransferStep::Burning, current, token)?;
        let burn_step = BurnStep::new(self.settings.fast_max_fee, waiter.clone());
        let burn = burn_step
            .execute(
                source.as_ref(),
                destination.config(),
                credential,
                amount.base_units(),
                request.mode,
            )
            .await?;
        let recovery = RecoveryInfo {
            source_chain: request.source_chain,
            destination_chain: request.destination_chain,
            burn_tx_hash: burn.receipt.tx_hash,
            message_hash: burn.message.message_hash(),
            nonce: burn.message.nonce(),
        };
        self.state.send_modify(|state| state.recovery = Some(recovery));
        info!(
            burn_tx_hash = %recovery.burn_tx_hash,
            message_hash = %recovery.message_hash,
            event = "recovery_recorded"
        );

        let confirmations = burn_step
            .confirm(source.as_ref(), destination.config(), &burn)
            .await?;
        self.log(
            TransferStep::Burning,
            LogKind::Info,
            format!(
                "Burned {amount} USDC on {source_name} (tx {}, message {}, {confirmations} confirmations)",
                recovery.burn_tx_hash, recovery.message_hash
            ),
        );

        self.advance(TransferStep::WaitingAttestation, current, token)?;
        let policy = request.mode.finality_policy();
        let AttestationOutcome {
            attestation,
            confirmations,
        } = AttestationPoller::new(
            self.attestation_provider.clone(),
            self.clock.clone(),
            self.polling,
        )
        .with_cancellation(token.clone())
        .execute(source.as_ref(), &burn, policy)
        .await?;
        self.log(
            TransferStep::WaitingAttestation,
            LogKind::Info,
            format!(
                "Attestation received after {confirmations} confirmations (required {})",
                policy.required_confirmations()
            ),
        );

        self.advance(TransferStep::Minting, current, token)?;
        let mint_tx_hash = match MintStep::new(retry, waiter)
            .execute(destination.as_ref(), credential, &burn.message, &attestation, &recovery)
            .await?
        {
            MintOutcome::Minted(receipt) => {
                self.log(
                    TransferStep::Minting,
                    LogKind::Info,
                    format!("Minted {amount} USDC on {destination_name} (tx {})", receipt.tx_hash),
                );
                Some(receipt.tx_hash)
            }
            MintOutcome::AlreadyReceived => {
                self.log(
                    TransferStep::Minting,
                    LogKind::Warning,
                    format!("Message already received on {destination_name}; skipped mint"),
                );
                None
            }
        };

        *current = TransferStep::Completed;

        Ok(TransferOutcome {
            burn_tx_hash: recovery.burn_tx_hash,
            mint_tx_hash,
            message_hash: recovery.message_hash,
            amount,
            elapsed: Duration::ZERO,
        })
    }

    /// Local checks first, then one balance read. No writes happen here.
    async fn validate(
        &self,
        request: &TransferRequest,
    ) -> Result<(UsdcAmount, Arc<dyn ChainConnector>, Arc<dyn ChainConnector>)> {
        if request.source_chain == request.destination_chain {
            return Err(CctpError::SameChain {
                chain: request.source_chain,
            });
        }
        let source = self.connectors.get(request.source_chain)?;
        let destination = self.connectors.get(request.destination_chain)?;

        let amount = UsdcAmount::parse_decimal(&request.amount)?;
        if request.mode.is_fast() && amount.base_units() <= self.settings.fast_max_fee {
            return Err(CctpError::InvalidAmount {
                reason: format!(
                    "fast transfer amount must exceed the max fee of {} USDC",
                    UsdcAmount::from_base_units(self.settings.fast_max_fee)
                ),
            });
        }

        let available = self
            .balances()
            .get_balance(&request.credential, request.source_chain)
            .await?;
        if amount > available {
            return Err(CctpError::InsufficientBalance {
                requested: amount,
                available,
            });
        }

        Ok((amount, source, destination))
    }

    fn advance(
        &self,
        next: TransferStep,
        current: &mut TransferStep,
        token: &CancellationToken,
    ) -> Result<()> {
        if token.is_cancelled() {
            return Err(CctpError::Cancelled);
        }
        *current = next;
        self.set_step(next);
        info!(step = %next, event = "transfer_step");
        Ok(())
    }

    fn set_step(&self, step: TransferStep) {
        self.state.send_modify(|state| state.step = step);
    }

    fn log(&self, step: TransferStep, kind: LogKind, message: String) {
        self.state.send_modify(|state| state.push(step, kind, message));
    }

    fn fail(&self, step: TransferStep, err: &CctpError) {
        let message = err.user_message();
        self.state.send_modify(|state| {
            state.push(step, LogKind::Error, message.clone());
            state.error = Some(message);
            state.step = TransferStep::Error;
        });
    }
}

impl std::fmt::Debug for TransferOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferOrchestrator")
            .field("connectors", &self.connectors)
            .field("polling", &self.polling)
            .field("settings", &self.settings)
            .field("step", &self.state.borrow().step)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{test_credential, FakeAttestationProvider, FakeChainConnector, FakeClock};
    use alloy_primitives::{Bytes, U256};

    fn orchestrator(source_balance: u64) -> TransferOrchestrator {
        let connectors = ConnectorSet::new()
            .with_connector(Arc::new(
                FakeChainConnector::new(NamedChain::Sepolia)
                    .with_balance(U256::from(source_balance)),
            ))
            .with_connector(Arc::new(FakeChainConnector::new(NamedChain::AvalancheFuji)));

        TransferOrchestrator::builder()
            .connectors(connectors)
            .attestation_provider(Arc::new(FakeAttestationProvider::completing_with(
                Bytes::from_static(&[0xab; 65]),
            )))
            .clock(Arc::new(FakeClock::new()))
            .build()
    }

    fn request(source: NamedChain, destination: NamedChain, amount: &str) -> TransferRequest {
        TransferRequest::builder()
            .credential(test_credential())
            .source_chain(source)
            .destination_chain(destination)
            .amount(amount)
            .build()
    }

    #[test]
    fn test_request_defaults_to_standard() {
        let request = request(NamedChain::Sepolia, NamedChain::AvalancheFuji, "1");
        assert_eq!(request.mode(), TransferMode::Standard);
        assert_eq!(request.amount(), "1");
    }

    #[tokio::test]
    async fn test_same_chain_rejected_before_chain_calls() {
        let orchestrator = orchestrator(50_000_000);

        let err = orchestrator
            .execute_transfer(request(NamedChain::Sepolia, NamedChain::Sepolia, "1"))
            .await
            .unwrap_err();

        assert!(matches!(err, CctpError::SameChain { .. }));
        let state = orchestrator.current_state();
        assert_eq!(state.step, TransferStep::Error);
        assert_eq!(state.logged_steps(), vec![TransferStep::Validating]);
    }

    #[tokio::test]
    async fn test_zero_amount_rejected() {
        let orchestrator = orchestrator(50_000_000);

        let err = orchestrator
            .execute_transfer(request(NamedChain::Sepolia, NamedChain::AvalancheFuji, "0"))
            .await
            .unwrap_err();

        assert!(matches!(err, CctpError::InvalidAmount { .. }));
    }

    #[tokio::test]
    async fn test_fast_amount_must_exceed_fee() {
        let orchestrator = orchestrator(50_000_000);
        let request = TransferRequest::builder()
            .credential(test_credential())
            .source_chain(NamedChain::Sepolia)
            .destination_chain(NamedChain::AvalancheFuji)
            .amount("0.0005")
            .mode(TransferMode::Fast)
            .build();

        let err = orchestrator.execute_transfer(request).await.unwrap_err();

        insta::assert_snapshot!(
            err.user_message(),
            @"[validation] Invalid amount: fast transfer amount must exceed the max fee of 0.000500 USDC"
        );
    }

    #[tokio::test]
    async fn test_reset_from_idle_is_rejected() {
        let orchestrator = orchestrator(0);

        let err = orchestrator.reset().unwrap_err();

        assert!(matches!(
            err,
            CctpError::InvalidReset {
                step: TransferStep::Idle
            }
        ));
        assert_eq!(orchestrator.current_state(), TransferState::default());
    }

    #[tokio::test]
    async fn test_standard_transfer_completes() {
        let orchestrator = orchestrator(50_000_000);

        let outcome = orchestrator
            .execute_transfer(request(NamedChain::Sepolia, NamedChain::AvalancheFuji, "10"))
            .await
            .unwrap();

        assert!(outcome.mint_tx_hash.is_some());
        assert_eq!(outcome.amount.to_string(), "10.000000");
        let state = orchestrator.current_state();
        assert_eq!(state.step, TransferStep::Completed);
        assert_eq!(state.recovery.map(|r| r.message_hash), Some(outcome.message_hash));
        assert!(state.error.is_none());
    }
}
