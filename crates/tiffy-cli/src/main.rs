//! # tiffy
//!
//! Command-line front end: loads settings, builds the configured wallet
//! backend, and drives a single [`ConnectionSession`].

#![deny(unsafe_code)]

mod wallet_factory;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tiffy_core::{Address, ClaimError, ClaimResult, ConnectError, FailureReason, SessionEvent};
use tiffy_session::ConnectionSession;
use tokio::sync::broadcast::error::RecvError;
use tracing::debug;

/// Tiffy claim client.
#[derive(Parser, Debug)]
#[command(name = "tiffy", about = "Connect a wallet and claim TIFFY")]
struct Cli {
    /// Settings file (defaults to `~/.tiffy/settings.json`).
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Log filter, overriding the settings file (e.g. `debug`).
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Connect the wallet and print the active account.
    Connect,
    /// Connect, then submit one claim.
    Claim,
    /// Connect and print session events until interrupted.
    Watch,
}

/// `0x1234...abcd`.
fn short_address(address: Address) -> String {
    let full = address.to_checksum(None);
    format!("{}...{}", &full[..6], &full[full.len() - 4..])
}

fn connect_message(error: &ConnectError) -> String {
    match error {
        ConnectError::UserRejected => "Wallet connection rejected.".to_string(),
        ConnectError::NoAccounts => "Wallet connected but exposed no accounts.".to_string(),
        other => format!("Wallet connection failed: {other}"),
    }
}

fn failure_message(reason: FailureReason) -> &'static str {
    match reason {
        FailureReason::InsufficientFunds => "Claim failed: not enough funds to cover the claim fee.",
        FailureReason::CooldownActive => "Claim failed: cooldown has not passed yet.",
        FailureReason::UserRejected => "Claim cancelled in the wallet.",
        FailureReason::NetworkError => "Claim failed: network error, try again.",
        FailureReason::Unknown => {
            "Claim failed. Make sure the cooldown passed and you have enough funds."
        }
    }
}

fn claim_error_message(error: ClaimError) -> &'static str {
    match error {
        ClaimError::NotConnected => "Connect your wallet first.",
        ClaimError::AlreadyInFlight => "A claim is already being submitted.",
    }
}

async fn connect(session: &ConnectionSession) -> Option<Address> {
    match session.connect().await {
        Ok(address) => {
            println!("Connected: {}", short_address(address));
            Some(address)
        }
        Err(e) => {
            eprintln!("{}", connect_message(&e));
            None
        }
    }
}

async fn claim(session: &ConnectionSession) -> ExitCode {
    if connect(session).await.is_none() {
        return ExitCode::FAILURE;
    }
    let code = match session.claim().await {
        Ok(ClaimResult::Success(receipt)) => {
            println!("Claimed! Transaction {}", receipt.transaction_hash);
            ExitCode::SUCCESS
        }
        Ok(ClaimResult::Failure(reason)) => {
            eprintln!("{}", failure_message(reason));
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("{}", claim_error_message(e));
            ExitCode::FAILURE
        }
    };
    session.disconnect().await;
    code
}

async fn watch(session: &ConnectionSession) -> Result<ExitCode> {
    let mut events = session.subscribe();
    if connect(session).await.is_none() {
        return Ok(ExitCode::FAILURE);
    }

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal.context("Failed to listen for ctrl-c")?;
                break;
            }
            event = events.recv() => match event {
                Ok(SessionEvent::StateChanged { from, to }) => println!("{from} -> {to}"),
                Ok(SessionEvent::AccountChanged { address }) => {
                    println!("Account changed: {}", short_address(address));
                }
                Err(RecvError::Lagged(skipped)) => debug!(skipped, "event stream lagged"),
                Err(RecvError::Closed) => break,
            },
        }
    }

    session.disconnect().await;
    Ok(ExitCode::SUCCESS)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let args = Cli::parse();

    let settings_path = args.settings.clone().unwrap_or_else(tiffy_settings::settings_path);
    let settings = tiffy_settings::load_settings_from_path(&settings_path)
        .with_context(|| format!("Failed to load settings from {}", settings_path.display()))?;

    let level = args.log_level.as_deref().unwrap_or(&settings.logging.level);
    tiffy_core::logging::init_subscriber(level);

    let claim_config = settings
        .claim_config()
        .context("Invalid contract settings")?;
    settings
        .wallet
        .validate()
        .context("Invalid wallet settings")?;
    let backend =
        wallet_factory::build(&settings.wallet).context("Failed to create wallet backend")?;
    let session = ConnectionSession::new(backend.wallet, backend.invoker, claim_config);

    match args.command {
        Command::Connect => Ok(if connect(&session).await.is_some() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        }),
        Command::Claim => Ok(claim(&session).await),
        Command::Watch => watch(&session).await,
    }
}
