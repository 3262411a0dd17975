//! # tiffy-wallet
//!
//! Concrete implementations of the [`WalletProvider`](tiffy_core::WalletProvider)
//! and [`ContractInvoker`](tiffy_core::ContractInvoker) capabilities.
//!
//! - [`RpcWalletProvider`] / [`RpcContractInvoker`]: a node exposing managed
//!   accounts over JSON-RPC (`eth_requestAccounts`, `eth_sendTransaction`)
//! - [`MockWallet`] / [`MockInvoker`]: scripted backends for deterministic
//!   tests without a node

#![deny(unsafe_code)]

pub mod invoker;
pub mod listeners;
pub mod mock;
pub mod provider;
pub mod rpc;

pub use invoker::RpcContractInvoker;
pub use listeners::ListenerSet;
pub use mock::{MockCall, MockConnect, MockInvoker, MockWallet};
pub use provider::RpcWalletProvider;
pub use rpc::RpcClient;
