//! Wallet connector backed by a JSON-RPC node with managed accounts.
//!
//! `connect` asks for account access with `eth_requestAccounts` and falls
//! back to `eth_accounts` on nodes that do not implement it. While connected,
//! a background task re-reads `eth_accounts` and notifies listeners whenever
//! the list changes.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde_json::json;
use tiffy_core::errors::CODE_METHOD_NOT_FOUND;
use tiffy_core::{AccountsListener, Address, ListenerId, ProviderError, Signer, WalletProvider};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::listeners::ListenerSet;
use crate::rpc::RpcClient;

const NAME: &str = "json-rpc";

/// JSON-RPC wallet connector.
pub struct RpcWalletProvider {
    client: Arc<RpcClient>,
    poll_interval: Duration,
    listeners: Arc<ListenerSet>,
    accounts: Arc<RwLock<Vec<Address>>>,
    poller: Mutex<Option<CancellationToken>>,
}

impl RpcWalletProvider {
    /// Create a connector that polls accounts every `poll_interval`.
    pub fn new(client: Arc<RpcClient>, poll_interval: Duration) -> Self {
        Self {
            client,
            poll_interval,
            listeners: Arc::new(ListenerSet::new()),
            accounts: Arc::new(RwLock::new(Vec::new())),
            poller: Mutex::new(None),
        }
    }

    /// Accounts seen on the last connect or poll.
    pub fn accounts(&self) -> Vec<Address> {
        self.accounts.read().clone()
    }

    /// Whether the account poller is running.
    pub fn is_polling(&self) -> bool {
        self.poller.lock().is_some()
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        match self.client.request("eth_requestAccounts", json!([])).await {
            Err(ProviderError::Rpc {
                code: CODE_METHOD_NOT_FOUND,
                ..
            }) => {
                debug!("eth_requestAccounts unsupported, falling back to eth_accounts");
                self.client.request("eth_accounts", json!([])).await
            }
            other => other,
        }
    }

    fn start_poller(&self) {
        let token = CancellationToken::new();
        if let Some(previous) = self.poller.lock().replace(token.clone()) {
            previous.cancel();
        }

        let client = self.client.clone();
        let listeners = self.listeners.clone();
        let accounts = self.accounts.clone();
        let interval = self.poll_interval;

        let _handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // first tick completes immediately; connect already read the accounts
            let _ = ticker.tick().await;

            loop {
                tokio::select! {
                    () = token.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                let latest: Vec<Address> = match client.request("eth_accounts", json!([])).await {
                    Ok(latest) => latest,
                    Err(e) => {
                        warn!(error = %e, "account poll failed");
                        continue;
                    }
                };
                if token.is_cancelled() {
                    break;
                }

                let changed = {
                    let mut current = accounts.write();
                    if *current == latest {
                        false
                    } else {
                        current.clone_from(&latest);
                        true
                    }
                };
                if changed {
                    debug!(count = latest.len(), "accounts changed");
                    listeners.notify(&latest);
                }
            }
            debug!("account poller stopped");
        });
    }

    fn stop_poller(&self) {
        if let Some(token) = self.poller.lock().take() {
            token.cancel();
        }
    }
}

impl Drop for RpcWalletProvider {
    fn drop(&mut self) {
        self.stop_poller();
    }
}

#[async_trait]
impl WalletProvider for RpcWalletProvider {
    fn name(&self) -> &str {
        NAME
    }

    async fn connect(&self) -> Result<Vec<Address>, ProviderError> {
        let accounts = self.request_accounts().await?;
        info!(url = self.client.url(), count = accounts.len(), "wallet connected");
        self.accounts.write().clone_from(&accounts);
        self.start_poller();
        Ok(accounts)
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
            provider: NAME.to_string(),
        })
    }

    async fn disconnect(&self) -> Result<(), ProviderError> {
        self.stop_poller();
        self.accounts.write().clear();
        debug!("wallet disconnected");
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::Value;
    use tokio::sync::mpsc;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    const A: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const B: &str = "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

    fn ok(result: Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({"jsonrpc": "2.0", "id": 1, "result": result}))
    }

    fn rpc_error(code: i64, message: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {"code": code, "message": message}
        }))
    }

    async fn provider(server: &MockServer, poll: Duration) -> RpcWalletProvider {
        let client = Arc::new(RpcClient::new(server.uri(), Duration::from_secs(5)).unwrap());
        RpcWalletProvider::new(client, poll)
    }

    #[tokio::test]
    async fn connect_returns_requested_accounts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "eth_requestAccounts"})))
            .respond_with(ok(json!([A, B])))
            .mount(&server)
            .await;

        let wallet = provider(&server, Duration::from_secs(60)).await;
        let accounts = wallet.connect().await.unwrap();
        assert_eq!(accounts, vec![Address::repeat_byte(0xaa), Address::repeat_byte(0xbb)]);
        assert_eq!(wallet.signer().unwrap().address, Address::repeat_byte(0xaa));
        assert!(wallet.is_polling());

        wallet.disconnect().await.unwrap();
        assert!(!wallet.is_polling());
        assert!(wallet.signer().is_none());
    }

    #[tokio::test]
    async fn connect_falls_back_to_eth_accounts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "eth_requestAccounts"})))
            .respond_with(rpc_error(-32601, "the method eth_requestAccounts does not exist"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "eth_accounts"})))
            .respond_with(ok(json!([B])))
            .mount(&server)
            .await;

        let wallet = provider(&server, Duration::from_secs(60)).await;
        let accounts = wallet.connect().await.unwrap();
        assert_eq!(accounts, vec![Address::repeat_byte(0xbb)]);
    }

    #[tokio::test]
    async fn connect_rejection_is_reported_raw() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(rpc_error(4001, "User rejected the request."))
            .mount(&server)
            .await;

        let wallet = provider(&server, Duration::from_secs(60)).await;
        let err = wallet.connect().await.unwrap_err();
        assert_matches!(err, ProviderError::Rpc { code: 4001, .. });
        assert!(!wallet.is_polling());
    }

    #[tokio::test]
    async fn poller_notifies_on_account_change() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "eth_requestAccounts"})))
            .respond_with(ok(json!([A])))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "eth_accounts"})))
            .respond_with(ok(json!([])))
            .mount(&server)
            .await;

        let wallet = provider(&server, Duration::from_millis(20)).await;
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _id = wallet.on_accounts_changed(Arc::new(move |accounts: Vec<Address>| {
            let _ = tx.send(accounts);
        }));

        let _ = wallet.connect().await.unwrap();
        let update = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(update.is_empty());
        assert!(wallet.accounts().is_empty());

        wallet.disconnect().await.unwrap();
    }

    #[tokio::test]
    async fn removed_listener_is_not_called() {
        let server = MockServer::start().await;
        let wallet = provider(&server, Duration::from_secs(60)).await;
        let id = wallet.on_accounts_changed(Arc::new(|_: Vec<Address>| {}));
        assert!(wallet.remove_listener(id));
        assert!(!wallet.remove_listener(id));
    }

    #[test]
    fn name_is_json_rpc() {
        let client = Arc::new(RpcClient::new("http://127.0.0.1:8545", Duration::from_secs(1)).unwrap());
        let wallet = RpcWalletProvider::new(client, Duration::from_secs(1));
        assert_eq!(wallet.name(), "json-rpc");
    }
}
