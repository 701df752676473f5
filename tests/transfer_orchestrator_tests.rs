// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! End-to-end transfer scenarios against the in-memory fakes.

use alloy_chains::NamedChain;
use alloy_primitives::{Bytes, FixedBytes, U256};
use cctp_transfer::testing::{
    test_credential, ConnectorCall, FakeAttestationProvider, FakeChainConnector, FakeClock,
    ScriptedResponse,
};
use cctp_transfer::{
    CctpError, ConnectorSet, DomainId, ErrorKind, LogKind, MessageHeader, PollingConfig,
    TransferMode, TransferOrchestrator, TransferRequest, TransferState, TransferStep,
};
use std::sync::Arc;

const USDC: u64 = 1_000_000;
const BURN_BLOCK: u64 = 1_000;

struct Harness {
    source: FakeChainConnector,
    destination: FakeChainConnector,
    attestation: FakeAttestationProvider,
    clock: FakeClock,
    orchestrator: Arc<TransferOrchestrator>,
}

impl Harness {
    fn new(source: FakeChainConnector, attestation: FakeAttestationProvider) -> Self {
        Self::with_polling(source, attestation, PollingConfig::default())
    }

    fn with_polling(
        source: FakeChainConnector,
        attestation: FakeAttestationProvider,
        polling: PollingConfig,
    ) -> Self {
        Self::build(
            source,
            FakeChainConnector::new(NamedChain::AvalancheFuji),
            attestation,
            polling,
        )
    }

    fn build(
        source: FakeChainConnector,
        destination: FakeChainConnector,
        attestation: FakeAttestationProvider,
        polling: PollingConfig,
    ) -> Self {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let clock = FakeClock::new();
        let orchestrator = TransferOrchestrator::builder()
            .connectors(
                ConnectorSet::new()
                    .with_connector(Arc::new(source.clone()))
                    .with_connector(Arc::new(destination.clone())),
            )
            .attestation_provider(Arc::new(attestation.clone()))
            .clock(Arc::new(clock.clone()))
            .polling(polling)
            .build();

        Self {
            source,
            destination,
            attestation,
            clock,
            orchestrator: Arc::new(orchestrator),
        }
    }

    fn state(&self) -> TransferState {
        self.orchestrator.current_state()
    }
}

fn sepolia_with(usdc: u64) -> FakeChainConnector {
    FakeChainConnector::new(NamedChain::Sepolia)
        .with_balance(U256::from(usdc * USDC))
        .with_block_height(BURN_BLOCK)
}

fn signature() -> Bytes {
    Bytes::from_static(&[0xab; 65])
}

fn request(amount: &str, mode: TransferMode) -> TransferRequest {
    TransferRequest::builder()
        .credential(test_credential())
        .source_chain(NamedChain::Sepolia)
        .destination_chain(NamedChain::AvalancheFuji)
        .amount(amount)
        .mode(mode)
        .build()
}

#[tokio::test]
async fn test_fast_transfer_completes_with_one_entry_per_step() {
    let harness = Harness::new(
        sepolia_with(50),
        FakeAttestationProvider::completing_with(signature()),
    );

    let outcome = harness
        .orchestrator
        .execute_transfer(request("10", TransferMode::Fast))
        .await
        .unwrap();

    let state = harness.state();
    assert_eq!(state.step, TransferStep::Completed);
    assert!(state.error.is_none());
    assert_eq!(
        state.logged_steps(),
        vec![
            TransferStep::Validating,
            TransferStep::Approving,
            TransferStep::Burning,
            TransferStep::WaitingAttestation,
            TransferStep::Minting,
            TransferStep::Completed,
        ]
    );
    assert!(state.logs.iter().all(|entry| entry.kind == LogKind::Info));

    let attested = state
        .logs
        .iter()
        .find(|entry| entry.step == TransferStep::WaitingAttestation)
        .unwrap();
    assert_eq!(
        attested.message,
        "Attestation received after 1001 confirmations (required 1000)"
    );

    assert_eq!(outcome.amount.to_string(), "10.000000");
    assert!(outcome.mint_tx_hash.is_some());
    assert_eq!(harness.source.balance_value(), U256::from(40 * USDC));
    assert_eq!(harness.destination.call_count(ConnectorCall::Mint), 1);

    let burn = harness.source.last_burn_request().unwrap();
    assert_eq!(burn.max_fee, U256::from(500u64));
    assert_eq!(burn.min_finality_threshold, 1000);
    assert_eq!(burn.destination_domain, DomainId::Avalanche);
}

#[tokio::test]
async fn test_log_entries_never_regress_in_step_order() {
    let harness = Harness::new(
        sepolia_with(50),
        FakeAttestationProvider::completing_with(signature()),
    );

    harness
        .orchestrator
        .execute_transfer(request("1", TransferMode::Standard))
        .await
        .unwrap();

    let steps = harness.state().logged_steps();
    assert!(steps.windows(2).all(|pair| pair[0] <= pair[1]));
}

#[tokio::test]
async fn test_amount_above_balance_is_rejected_during_validation() {
    let harness = Harness::new(
        sepolia_with(50),
        FakeAttestationProvider::completing_with(signature()),
    );

    let err = harness
        .orchestrator
        .execute_transfer(request("100", TransferMode::Fast))
        .await
        .unwrap_err();

    assert!(matches!(err, CctpError::InsufficientBalance { .. }));
    assert_eq!(err.kind(), ErrorKind::Validation);

    let state = harness.state();
    assert_eq!(state.step, TransferStep::Error);
    assert!(state
        .logs
        .iter()
        .all(|entry| entry.step == TransferStep::Validating));
    insta::assert_snapshot!(
        state.error.unwrap(),
        @"[validation] Insufficient balance: requested 100.000000 USDC but only 50.000000 USDC available"
    );

    assert_eq!(harness.source.call_count(ConnectorCall::Approve), 0);
    assert_eq!(harness.source.call_count(ConnectorCall::Burn), 0);
    assert_eq!(harness.attestation.call_count(), 0);
}

#[tokio::test]
async fn test_rejected_attestation_never_mints() {
    let harness = Harness::new(
        sepolia_with(50),
        FakeAttestationProvider::new().with_script(vec![
            ScriptedResponse::Pending,
            ScriptedResponse::Failed,
        ]),
    );

    let err = harness
        .orchestrator
        .execute_transfer(request("10", TransferMode::Fast))
        .await
        .unwrap_err();

    let CctpError::PostBurnFailure { step, source, .. } = &err else {
        panic!("expected a post-burn failure, got {err:?}");
    };
    assert_eq!(*step, TransferStep::WaitingAttestation);
    assert!(matches!(**source, CctpError::AttestationRejected { .. }));
    assert_eq!(err.kind(), ErrorKind::PartialFailure);

    let state = harness.state();
    assert_eq!(state.step, TransferStep::Error);
    assert!(!state.logged_steps().contains(&TransferStep::Minting));

    let last = state.logs.last().unwrap();
    assert_eq!(last.kind, LogKind::Error);
    assert_eq!(last.step, TransferStep::WaitingAttestation);
    assert!(last
        .message
        .starts_with("[partial failure] Transfer stopped at waiting_attestation after burn on sepolia: Attestation rejected"));
    assert!(state.recovery.is_some());

    assert_eq!(harness.destination.call_count(ConnectorCall::Mint), 0);
}

#[tokio::test]
async fn test_mint_revert_is_a_partial_failure_with_recovery_data() {
    let harness = Harness::build(
        sepolia_with(50),
        FakeChainConnector::new(NamedChain::AvalancheFuji).with_mint_revert(),
        FakeAttestationProvider::completing_with(signature()),
        PollingConfig::default(),
    );

    let err = harness
        .orchestrator
        .execute_transfer(request("10", TransferMode::Fast))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::PartialFailure);

    let state = harness.state();
    let recovery = state.recovery.expect("burn recorded recovery info");
    assert_eq!(recovery.source_chain, NamedChain::Sepolia);
    assert_eq!(recovery.destination_chain, NamedChain::AvalancheFuji);

    let last = state.logs.last().unwrap();
    assert_eq!(last.kind, LogKind::Error);
    assert_eq!(last.step, TransferStep::Minting);
    assert!(last.message.starts_with("[partial failure]"));
    assert!(last.message.contains(&recovery.message_hash.to_string()));
    assert!(last.message.contains(&recovery.burn_tx_hash.to_string()));
}

#[tokio::test]
async fn test_fast_mode_waits_for_1000_confirmations() {
    let harness = Harness::new(
        sepolia_with(50).with_blocks_per_read(7),
        FakeAttestationProvider::completing_with(signature()),
    );

    harness
        .orchestrator
        .execute_transfer(request("10", TransferMode::Fast))
        .await
        .unwrap();

    assert!(harness.source.current_height() - BURN_BLOCK >= 1000);
}

#[tokio::test]
async fn test_standard_mode_waits_for_2000_confirmations() {
    let harness = Harness::new(
        sepolia_with(50).with_blocks_per_read(7),
        FakeAttestationProvider::completing_with(signature()),
    );

    harness
        .orchestrator
        .execute_transfer(request("10", TransferMode::Standard))
        .await
        .unwrap();

    assert!(harness.source.current_height() - BURN_BLOCK >= 2000);
    assert_eq!(
        harness.source.last_burn_request().unwrap().max_fee,
        U256::ZERO
    );
}

#[tokio::test]
async fn test_source_finality_timeout_fails_before_polling() {
    let harness = Harness::with_polling(
        sepolia_with(50).with_blocks_per_read(1),
        FakeAttestationProvider::completing_with(signature()),
        PollingConfig::default().with_finality_timeout(std::time::Duration::from_secs(600)),
    );

    let err = harness
        .orchestrator
        .execute_transfer(request("10", TransferMode::Standard))
        .await
        .unwrap_err();

    let CctpError::PostBurnFailure { source, .. } = &err else {
        panic!("expected a post-burn failure, got {err:?}");
    };
    assert!(matches!(
        **source,
        CctpError::ConfirmationTimeout { required: 2000, .. }
    ));
    assert_eq!(harness.attestation.call_count(), 0);
    assert_eq!(harness.state().step, TransferStep::Error);
}

#[tokio::test]
async fn test_unconfirmed_burn_keeps_recovery_identifiers() {
    let harness = Harness::new(
        sepolia_with(50)
            .with_allowance(U256::from(50 * USDC))
            .with_blocks_per_read(0),
        FakeAttestationProvider::completing_with(signature()),
    );

    let err = harness
        .orchestrator
        .execute_transfer(request("10", TransferMode::Fast))
        .await
        .unwrap_err();

    let CctpError::PostBurnFailure {
        step,
        source,
        message_hash,
        burn_tx_hash,
        ..
    } = &err
    else {
        panic!("expected a post-burn failure, got {err:?}");
    };
    assert_eq!(*step, TransferStep::Burning);
    assert!(matches!(**source, CctpError::ConfirmationTimeout { required: 2, .. }));
    assert_eq!(err.kind(), ErrorKind::PartialFailure);

    let state = harness.state();
    let recovery = state.recovery.expect("included burn recorded recovery info");
    assert_eq!(*message_hash, recovery.message_hash);
    assert_eq!(*burn_tx_hash, recovery.burn_tx_hash);

    let error = state.error.unwrap();
    assert!(error.contains(&recovery.message_hash.to_string()));
    assert!(error.contains(&recovery.burn_tx_hash.to_string()));
    assert_eq!(state.logs.last().unwrap().step, TransferStep::Burning);

    assert_eq!(harness.source.call_count(ConnectorCall::Burn), 1);
    assert_eq!(harness.attestation.call_count(), 0);
}

#[tokio::test]
async fn test_cancel_interrupts_approval_confirmation_wait() {
    let harness = Harness::new(
        sepolia_with(50).with_blocks_per_read(0),
        FakeAttestationProvider::completing_with(signature()),
    );
    let mut updates = harness.orchestrator.subscribe();

    let running = harness
        .orchestrator
        .spawn_transfer(request("10", TransferMode::Fast))
        .unwrap();
    updates
        .wait_for(|state| state.step == TransferStep::Approving)
        .await
        .unwrap();
    harness.orchestrator.cancel();

    let err = running.await.unwrap().unwrap_err();
    assert!(matches!(err, CctpError::Cancelled));

    let state = harness.state();
    assert_eq!(state.step, TransferStep::Error);
    assert_eq!(state.error.as_deref(), Some("[cancelled] Transfer cancelled"));
    assert!(state.recovery.is_none());
    assert_eq!(harness.source.call_count(ConnectorCall::Approve), 1);
    assert_eq!(harness.source.call_count(ConnectorCall::Burn), 0);
}

#[tokio::test]
async fn test_attested_message_nonce_is_checked_on_destination() {
    let attested_nonce = FixedBytes::from([7u8; 32]);
    let attested = MessageHeader {
        version: 1,
        source_domain: DomainId::Ethereum,
        destination_domain: DomainId::Avalanche,
        nonce: attested_nonce,
        sender: FixedBytes::ZERO,
        recipient: FixedBytes::ZERO,
        destination_caller: FixedBytes::ZERO,
        min_finality_threshold: 1000,
        finality_threshold_executed: 1000,
    }
    .encode();
    let harness = Harness::new(
        sepolia_with(50),
        FakeAttestationProvider::new().with_script(vec![ScriptedResponse::CompleteWithMessage {
            attestation: signature(),
            message: attested,
        }]),
    );

    harness
        .orchestrator
        .execute_transfer(request("10", TransferMode::Fast))
        .await
        .unwrap();

    assert_eq!(harness.destination.checked_nonces(), vec![attested_nonce]);
}

#[tokio::test]
async fn test_already_received_message_completes_with_warning() {
    let harness = Harness::build(
        sepolia_with(50),
        FakeChainConnector::new(NamedChain::AvalancheFuji).with_message_received(),
        FakeAttestationProvider::completing_with(signature()),
        PollingConfig::default(),
    );

    let outcome = harness
        .orchestrator
        .execute_transfer(request("10", TransferMode::Fast))
        .await
        .unwrap();

    assert!(outcome.mint_tx_hash.is_none());
    let state = harness.state();
    assert_eq!(state.step, TransferStep::Completed);
    assert!(state
        .logs
        .iter()
        .any(|entry| entry.step == TransferStep::Minting && entry.kind == LogKind::Warning));
    assert_eq!(harness.destination.call_count(ConnectorCall::Mint), 0);
}

#[tokio::test]
async fn test_transient_balance_outage_is_retried() {
    let harness = Harness::new(
        sepolia_with(50).with_unavailable_reads(2),
        FakeAttestationProvider::completing_with(signature()),
    );

    harness
        .orchestrator
        .execute_transfer(request("10", TransferMode::Fast))
        .await
        .unwrap();

    assert_eq!(harness.state().step, TransferStep::Completed);
    assert!(harness.clock.sleep_count() > 2);
}

#[tokio::test]
async fn test_second_start_while_in_flight_is_rejected() {
    let harness = Harness::with_polling(
        sepolia_with(50),
        FakeAttestationProvider::new().with_script(vec![ScriptedResponse::Pending]),
        PollingConfig::default().with_max_attempts(u32::MAX),
    );
    let mut updates = harness.orchestrator.subscribe();

    let running = harness
        .orchestrator
        .spawn_transfer(request("10", TransferMode::Fast))
        .unwrap();
    updates
        .wait_for(|state| state.step == TransferStep::WaitingAttestation)
        .await
        .unwrap();
    let before = harness.state();

    let err = harness
        .orchestrator
        .execute_transfer(request("1", TransferMode::Fast))
        .await
        .unwrap_err();
    assert!(matches!(err, CctpError::TransferInFlight));
    assert_eq!(harness.state().step, TransferStep::WaitingAttestation);
    assert_eq!(harness.state().logs, before.logs);

    let balance = harness
        .orchestrator
        .get_balance(&test_credential(), NamedChain::Sepolia)
        .await
        .unwrap();
    assert_eq!(balance.to_string(), "40.000000");

    harness.orchestrator.cancel();
    let err = running.await.unwrap().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Cancelled);
}

#[tokio::test]
async fn test_cancel_stops_polling_and_allows_reset() {
    let harness = Harness::with_polling(
        sepolia_with(50),
        FakeAttestationProvider::new().with_script(vec![ScriptedResponse::Pending]),
        PollingConfig::default().with_max_attempts(u32::MAX),
    );
    let mut updates = harness.orchestrator.subscribe();

    let running = harness
        .orchestrator
        .spawn_transfer(request("10", TransferMode::Fast))
        .unwrap();
    updates
        .wait_for(|state| state.step == TransferStep::WaitingAttestation)
        .await
        .unwrap();

    assert!(matches!(
        harness.orchestrator.reset(),
        Err(CctpError::InvalidReset {
            step: TransferStep::WaitingAttestation
        })
    ));

    harness.orchestrator.cancel();
    let err = running.await.unwrap().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Cancelled);

    let polls = harness.attestation.call_count();
    tokio::task::yield_now().await;
    assert_eq!(harness.attestation.call_count(), polls);

    let state = harness.state();
    assert_eq!(state.step, TransferStep::Error);
    let recovery = state.recovery.unwrap();
    let error = state.error.as_deref().unwrap();
    assert!(error.starts_with(
        "[cancelled] Transfer stopped at waiting_attestation after burn on sepolia: Transfer cancelled"
    ));
    assert!(error.contains(&recovery.message_hash.to_string()));
    assert!(!state.logged_steps().contains(&TransferStep::Minting));

    harness.orchestrator.reset().unwrap();
    assert_eq!(harness.state(), TransferState::default());
}

#[tokio::test]
async fn test_reset_after_completion_clears_logs_and_allows_new_transfer() {
    let harness = Harness::new(
        sepolia_with(50),
        FakeAttestationProvider::completing_with(signature()),
    );

    harness
        .orchestrator
        .execute_transfer(request("10", TransferMode::Fast))
        .await
        .unwrap();
    harness.orchestrator.reset().unwrap();

    let state = harness.state();
    assert_eq!(state.step, TransferStep::Idle);
    assert!(state.logs.is_empty());
    assert!(state.recovery.is_none());
    assert_eq!(harness.source.balance_value(), U256::from(40 * USDC));

    harness
        .orchestrator
        .execute_transfer(request("5", TransferMode::Fast))
        .await
        .unwrap();
    assert_eq!(harness.source.balance_value(), U256::from(35 * USDC));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_reset_racing_completion_leaves_clean_state() {
    let harness = Harness::new(
        sepolia_with(50),
        FakeAttestationProvider::completing_with(signature()),
    );

    let running = harness
        .orchestrator
        .spawn_transfer(request("10", TransferMode::Fast))
        .unwrap();
    while harness.orchestrator.reset().is_err() {
        tokio::task::yield_now().await;
    }
    running.await.unwrap().unwrap();

    let state = harness.state();
    assert_eq!(state, TransferState::default());
    assert!(state.logs.is_empty());
}
