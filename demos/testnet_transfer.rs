// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! Testnet USDC transfer
//!
//! Moves USDC between two CCTP v2 testnets and prints every step as it
//! happens.
//!
//! Environment variables (set these in .env file):
//! - PRIVATE_KEY: wallet private key holding testnet USDC and gas on both chains
//! - IRIS_API_URL: (optional) attestation service, sandbox by default
//! - SEPOLIA_RPC_URL, BASE_SEPOLIA_RPC_URL, ...: (optional) RPC overrides
//!
//! Run with:
//! `cargo run --example testnet_transfer -- sepolia base-sepolia 1 fast`

use alloy_chains::NamedChain;
use cctp_transfer::{
    CctpError, Credential, LogKind, TransferMode, TransferOrchestrator, TransferRequest,
};
use std::sync::Arc;

fn chain_arg(value: Option<String>, default: NamedChain) -> Result<NamedChain, CctpError> {
    match value {
        Some(name) => name
            .parse()
            .map_err(|_| CctpError::InvalidConfig(format!("unknown chain '{name}'"))),
        None => Ok(default),
    }
}

#[tokio::main]
async fn main() -> Result<(), CctpError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("cctp_transfer=info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let source = chain_arg(args.next(), NamedChain::Sepolia)?;
    let destination = chain_arg(args.next(), NamedChain::BaseSepolia)?;
    let amount = args.next().unwrap_or_else(|| "1".to_string());
    let mode: TransferMode = args.next().as_deref().unwrap_or("fast").parse()?;

    let orchestrator = Arc::new(TransferOrchestrator::from_env()?);
    let credential = Credential::from_env()?;

    let balance = orchestrator.get_balance(&credential, source).await?;
    println!("Wallet:  {}", credential.address());
    println!("Balance: {balance} USDC on {source}");
    println!("Sending: {amount} USDC {source} → {destination} ({mode})\n");

    let mut updates = orchestrator.subscribe();
    let printer = tokio::spawn(async move {
        let mut printed = 0;
        while updates.changed().await.is_ok() {
            let state = updates.borrow_and_update().clone();
            for entry in state.logs.iter().skip(printed) {
                let marker = match entry.kind {
                    LogKind::Info => "✓",
                    LogKind::Warning => "!",
                    LogKind::Error => "✗",
                };
                println!("{marker} [{}] {}", entry.step, entry.message);
            }
            printed = state.logs.len();
            if state.is_terminal() {
                break;
            }
        }
    });

    let request = TransferRequest::builder()
        .credential(credential)
        .source_chain(source)
        .destination_chain(destination)
        .amount(amount)
        .mode(mode)
        .build();

    let result = orchestrator.execute_transfer(request).await;
    let _ = printer.await;

    match result {
        Ok(outcome) => {
            println!("\nBurn tx: {}", outcome.burn_tx_hash);
            if let Some(mint) = outcome.mint_tx_hash {
                println!("Mint tx: {mint}");
            }
            println!("Elapsed: {}s", outcome.elapsed.as_secs());
            Ok(())
        }
        Err(err) => {
            if let Some(recovery) = orchestrator.current_state().recovery {
                println!("\nFunds were burned. Recover with:");
                println!("  message hash: {}", recovery.message_hash);
                println!("  burn tx:      {}", recovery.burn_tx_hash);
            }
            Err(err)
        }
    }
}
