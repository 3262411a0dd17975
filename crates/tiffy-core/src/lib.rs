//! # tiffy-core
//!
//! Shared vocabulary for the Tiffy claim client.
//!
//! - **Session types**: [`SessionState`], [`Session`], [`ErrorInfo`], [`SessionEvent`]
//! - **Claim types**: [`ClaimRequest`], [`ClaimResult`], [`FailureReason`], [`TransactionReceipt`]
//! - **Errors**: [`ProviderError`] from adapters, [`ConnectError`] / [`ClaimError`]
//!   surfaced by the session, plus the classification rules between them
//! - **Capabilities**: [`WalletProvider`] and [`ContractInvoker`] traits that
//!   concrete wallet/contract backends implement
//! - **ABI**: the single payable function fragment and its selector

#![deny(unsafe_code)]

pub mod abi;
pub mod contract;
pub mod errors;
pub mod logging;
pub mod types;
pub mod wallet;

pub use abi::{AbiFunction, AbiParam, StateMutability};
pub use contract::{ClaimConfig, ContractCall, ContractInvoker};
pub use errors::{ClaimError, ConnectError, ProviderError};
pub use types::{
    ClaimRequest, ClaimResult, ErrorInfo, ErrorKind, FailureReason, Session, SessionEvent,
    SessionState, TransactionReceipt,
};
pub use wallet::{AccountsListener, ListenerId, Signer, WalletProvider};

/// Re-exported EVM primitives so downstream crates share one version.
pub use alloy_primitives::{Address, B256, U256};

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
