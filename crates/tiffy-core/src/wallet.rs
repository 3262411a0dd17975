//! Wallet provider capability.
//!
//! A [`WalletProvider`] is whatever connector the deployment uses to reach a
//! wallet. The session only ever talks to this trait; concrete adapters live
//! in `tiffy-wallet`.

use std::fmt;
use std::sync::Arc;

use alloy_primitives::Address;
use async_trait::async_trait;

use crate::errors::ProviderError;

/// Callback invoked with the full account list whenever it changes.
///
/// An empty list means the wallet no longer exposes any account.
pub type AccountsListener = Arc<dyn Fn(Vec<Address>) + Send + Sync>;

/// Handle returned by [`WalletProvider::on_accounts_changed`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

/// The account a provider signs with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signer {
    /// Signing account.
    pub address: Address,
    /// Provider that holds the key.
    pub provider: String,
}

/// Wallet connector capability.
///
/// Implementors must be `Send + Sync` so a session can hold them behind an
/// `Arc`. Listeners must be invoked in the order account changes arrive and
/// never while holding a lock that [`remove_listener`](Self::remove_listener)
/// would need.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Connector identifier for logs (e.g. `"json-rpc"`).
    fn name(&self) -> &str;

    /// Ask the wallet for access and return its accounts, active account first.
    async fn connect(&self) -> Result<Vec<Address>, ProviderError>;

    /// Register a callback for account changes.
    fn on_accounts_changed(&self, listener: AccountsListener) -> ListenerId;

    /// Drop a previously registered callback. Returns whether it existed.
    fn remove_listener(&self, id: ListenerId) -> bool;

    /// Account the wallet currently signs with, if connected.
    fn signer(&self) -> Option<Signer>;

    /// Tear the connection down.
    async fn disconnect(&self) -> Result<(), ProviderError>;
}
