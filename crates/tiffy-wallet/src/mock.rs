//! Scripted wallet and contract backends for driving a session in tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tiffy_core::{
    AccountsListener, Address, B256, ContractCall, ContractInvoker, ListenerId, ProviderError,
    Signer, TransactionReceipt, WalletProvider,
};

use crate::listeners::ListenerSet;

/// Pre-programmed answer to a [`MockWallet::connect`] call.
pub enum MockConnect {
    /// Return these accounts.
    Accounts(Vec<Address>),
    /// Fail with this error.
    Error(ProviderError),
    /// Wait a duration, then yield the inner response.
    Delay(Duration, Box<MockConnect>),
}

impl MockConnect {
    /// Convenience: wrap any response with a delay.
    pub fn delayed(delay: Duration, inner: MockConnect) -> Self {
        Self::Delay(delay, Box::new(inner))
    }

    /// Convenience: the user declines the connection.
    pub fn rejected() -> Self {
        Self::Error(ProviderError::rpc(4001, "User rejected the request."))
    }
}

/// Scripted wallet connector for deterministic tests.
pub struct MockWallet {
    responses: Mutex<VecDeque<MockConnect>>,
    listeners: ListenerSet,
    accounts: RwLock<Vec<Address>>,
    connect_calls: AtomicUsize,
    disconnect_calls: AtomicUsize,
    disconnect_error: Option<ProviderError>,
}

impl MockWallet {
    /// Wallet that answers successive `connect` calls from `responses`.
    pub fn new(responses: Vec<MockConnect>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            listeners: ListenerSet::new(),
            accounts: RwLock::new(Vec::new()),
            connect_calls: AtomicUsize::new(0),
            disconnect_calls: AtomicUsize::new(0),
            disconnect_error: None,
        }
    }

    /// Wallet whose single `connect` returns `accounts`.
    pub fn with_accounts(accounts: Vec<Address>) -> Self {
        Self::new(vec![MockConnect::Accounts(accounts)])
    }

    /// Make `disconnect` fail with `error`.
    #[must_use]
    pub fn failing_disconnect(mut self, error: ProviderError) -> Self {
        self.disconnect_error = Some(error);
        self
    }

    /// Queue another `connect` response.
    pub fn push(&self, response: MockConnect) {
        self.responses.lock().push_back(response);
    }

    /// Simulate the wallet switching accounts; listeners run synchronously.
    pub fn emit_accounts(&self, accounts: Vec<Address>) {
        self.accounts.write().clone_from(&accounts);
        self.listeners.notify(&accounts);
    }

    /// Number of `connect` calls so far.
    pub fn connect_calls(&self) -> usize {
        self.connect_calls.load(Ordering::Relaxed)
    }

    /// Number of `disconnect` calls so far.
    pub fn disconnect_calls(&self) -> usize {
        self.disconnect_calls.load(Ordering::Relaxed)
    }

    /// Number of registered account listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    fn name(&self) -> &str {
        "mock"
    }

    async fn connect(&self) -> Result<Vec<Address>, ProviderError> {
        let idx = self.connect_calls.fetch_add(1, Ordering::Relaxed);
        let Some(mut current) = self.responses.lock().pop_front() else {
            return Err(ProviderError::Malformed(format!(
                "MockWallet: no response configured for connect {idx}"
            )));
        };

        // unroll nested delays iteratively
        loop {
            match current {
                MockConnect::Accounts(accounts) => {
                    self.accounts.write().clone_from(&accounts);
                    return Ok(accounts);
                }
                MockConnect::Error(e) => return Err(e),
                MockConnect::Delay(duration, inner) => {
                    tokio::time::sleep(duration).await;
                    current = *inner;
                }
            }
        }
    }

    fn on_accounts_changed(&self, listener: AccountsListener) -> ListenerId {
        self.listeners.add(listener)
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    fn signer(&self) -> Option<Signer> {
        self.accounts.read().first().map(|address| Signer {
            address: *address,
            provider: "mock".to_string(),
        })
    }

    async fn disconnect(&self) -> Result<(), ProviderError> {
        let _ = self.disconnect_calls.fetch_add(1, Ordering::Relaxed);
        self.accounts.write().clear();
        match &self.disconnect_error {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }
}

/// Pre-programmed answer to a [`MockInvoker::call`].
pub enum MockCall {
    /// Succeed with this receipt.
    Receipt(TransactionReceipt),
    /// Fail with this error.
    Error(ProviderError),
    /// Wait a duration, then yield the inner response.
    Delay(Duration, Box<MockCall>),
}

impl MockCall {
    /// Convenience: succeed with a receipt whose hash is `tag` repeated.
    pub fn success(tag: u8) -> Self {
        Self::Receipt(TransactionReceipt::from_hash(B256::repeat_byte(tag)))
    }

    /// Convenience: fail with an RPC error message.
    pub fn failure(code: i64, message: &str) -> Self {
        Self::Error(ProviderError::rpc(code, message))
    }

    /// Convenience: wrap any response with a delay.
    pub fn delayed(delay: Duration, inner: MockCall) -> Self {
        Self::Delay(delay, Box::new(inner))
    }
}

/// Scripted contract invoker that records every call it receives.
pub struct MockInvoker {
    responses: Mutex<VecDeque<MockCall>>,
    calls: Mutex<Vec<ContractCall>>,
}

impl MockInvoker {
    /// Invoker that answers successive calls from `responses`.
    pub fn new(responses: Vec<MockCall>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queue another response.
    pub fn push(&self, response: MockCall) {
        self.responses.lock().push_back(response);
    }

    /// Number of calls received.
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Calls received, in order.
    pub fn calls(&self) -> Vec<ContractCall> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl ContractInvoker for MockInvoker {
    async fn call(&self, call: &ContractCall) -> Result<TransactionReceipt, ProviderError> {
        let idx = {
            let mut calls = self.calls.lock();
            calls.push(call.clone());
            calls.len() - 1
        };
        let Some(mut current) = self.responses.lock().pop_front() else {
            return Err(ProviderError::Malformed(format!(
                "MockInvoker: no response configured for call {idx}"
            )));
        };

        loop {
            match current {
                MockCall::Receipt(receipt) => return Ok(receipt),
                MockCall::Error(e) => return Err(e),
                MockCall::Delay(duration, inner) => {
                    tokio::time::sleep(duration).await;
                    current = *inner;
                }
            }
        }
    }
}
