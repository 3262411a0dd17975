//! Wallet connection lifecycle and claim submission.
//!
//! ```text
//! Disconnected ──connect──▶ Connecting ──ok──▶ Connected ──claim──▶ Submitting
//!      ▲                        │                  ▲  │                 │
//!      │                        └──err──▶ Failed   │  └─────done────────┘
//!      └──── disconnect / empty accounts (from any state) ────┘
//! ```
//!
//! Every transition happens under a short synchronous lock; the lock is never
//! held across a provider call. Each connect and each disconnect bumps an
//! epoch so that results and account events belonging to an earlier
//! connection are recognised as stale and dropped.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tiffy_core::errors::{classify_claim, classify_connect};
use tiffy_core::{
    AccountsListener, Address, ClaimConfig, ClaimError, ClaimResult, ConnectError,
    ContractInvoker, ErrorInfo, ErrorKind, ListenerId, Session, SessionEvent, SessionState,
    WalletProvider,
};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Buffered events per subscriber before the slowest one starts lagging.
const EVENT_CAPACITY: usize = 64;

struct Inner {
    session: Session,
    epoch: u64,
    listener: Option<ListenerId>,
}

struct Shared {
    inner: Mutex<Inner>,
    events: broadcast::Sender<SessionEvent>,
}

impl Shared {
    fn set_state(&self, inner: &mut Inner, to: SessionState) {
        let from = inner.session.state;
        if from == to {
            return;
        }
        inner.session.state = to;
        debug!(%from, %to, "session transition");
        let _ = self.events.send(SessionEvent::StateChanged { from, to });
    }

    /// Handle an account-change notification for the connection at `epoch`.
    ///
    /// Returns the listener to deregister when the wallet dropped every account.
    fn on_accounts(&self, epoch: u64, accounts: &[Address]) -> Option<ListenerId> {
        let mut inner = self.inner.lock();
        if inner.epoch != epoch || !inner.session.state.has_address() {
            debug!(epoch, "ignoring account change for a stale connection");
            return None;
        }

        match accounts.first() {
            Some(&address) => {
                if inner.session.address != Some(address) {
                    inner.session.address = Some(address);
                    info!(%address, "active account changed");
                    let _ = self.events.send(SessionEvent::AccountChanged { address });
                }
                None
            }
            None => {
                info!("wallet exposed no accounts, disconnecting");
                inner.epoch += 1;
                inner.session.address = None;
                inner.session.last_error = None;
                self.set_state(&mut inner, SessionState::Disconnected);
                inner.listener.take()
            }
        }
    }
}

/// One wallet connection and the claims made through it.
///
/// Construct one per process and share it by reference; all operations take
/// `&self`.
pub struct ConnectionSession {
    wallet: Arc<dyn WalletProvider>,
    invoker: Arc<dyn ContractInvoker>,
    config: ClaimConfig,
    shared: Arc<Shared>,
}

impl ConnectionSession {
    /// Create a disconnected session over the given capabilities.
    pub fn new(
        wallet: Arc<dyn WalletProvider>,
        invoker: Arc<dyn ContractInvoker>,
        config: ClaimConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            wallet,
            invoker,
            config,
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    session: Session::default(),
                    epoch: 0,
                    listener: None,
                }),
                events,
            }),
        }
    }

    /// Copy of the current session.
    pub fn snapshot(&self) -> Session {
        self.shared.inner.lock().session.clone()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.shared.inner.lock().session.state
    }

    /// Connected account, if any.
    pub fn address(&self) -> Option<Address> {
        self.shared.inner.lock().session.address
    }

    /// Most recent failure, if it has not been cleared yet.
    pub fn last_error(&self) -> Option<ErrorInfo> {
        self.shared.inner.lock().session.last_error.clone()
    }

    /// Claim configuration this session submits with.
    pub fn config(&self) -> &ClaimConfig {
        &self.config
    }

    /// Receive state and account changes from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.shared.events.subscribe()
    }

    /// Connect the wallet and return the active account.
    ///
    /// A no-op returning the current address when already connected.
    ///
    /// # Errors
    ///
    /// - [`ConnectError::InProgress`] if another connect is pending
    /// - [`ConnectError::Interrupted`] if [`disconnect`](Self::disconnect) ran meanwhile
    /// - [`ConnectError::NoAccounts`] if the wallet exposed no account
    /// - the classified provider failure otherwise; the session is then `Failed`
    pub async fn connect(&self) -> Result<Address, ConnectError> {
        let epoch = {
            let mut inner = self.shared.inner.lock();
            match (inner.session.state, inner.session.address) {
                (SessionState::Connected | SessionState::Submitting, Some(address)) => {
                    debug!(%address, "already connected");
                    return Ok(address);
                }
                (SessionState::Connecting, _) => return Err(ConnectError::InProgress),
                _ => {}
            }
            inner.epoch += 1;
            self.shared.set_state(&mut inner, SessionState::Connecting);
            inner.epoch
        };

        let wallet = self.wallet.name();
        debug!(wallet, "requesting wallet connection");
        let outcome = self.wallet.connect().await;
        let provider_connected = outcome.is_ok();
        let attempt = match outcome {
            Ok(accounts) => accounts
                .first()
                .copied()
                .ok_or_else(|| (ConnectError::NoAccounts, ConnectError::NoAccounts.to_string())),
            Err(e) => Err((classify_connect(&e), e.to_string())),
        };

        let settled = {
            let mut inner = self.shared.inner.lock();
            if inner.epoch != epoch || inner.session.state != SessionState::Connecting {
                None
            } else {
                Some(match attempt {
                    Ok(address) => {
                        inner.session.address = Some(address);
                        inner.session.last_error = None;
                        self.shared.set_state(&mut inner, SessionState::Connected);
                        Ok(address)
                    }
                    Err((error, detail)) => {
                        warn!(wallet, kind = error.kind_str(), %detail, "wallet connection failed");
                        inner.session.last_error = Some(ErrorInfo::new(error.error_kind(), detail));
                        self.shared.set_state(&mut inner, SessionState::Failed);
                        Err(error)
                    }
                })
            }
        };

        let Some(settled) = settled else {
            info!(wallet, "connection attempt superseded by disconnect");
            if provider_connected {
                self.teardown_wallet().await;
            }
            return Err(ConnectError::Interrupted);
        };
        let address = settled?;

        self.watch_accounts(epoch);
        info!(wallet, %address, "wallet connected");
        Ok(address)
    }

    /// Submit the configured claim from the connected account.
    ///
    /// Contract-side failures are reported as [`ClaimResult::Failure`]; the
    /// session returns to `Connected` either way unless it was disconnected
    /// while the call was in flight.
    ///
    /// # Errors
    ///
    /// - [`ClaimError::NotConnected`] unless the session is `Connected`
    /// - [`ClaimError::AlreadyInFlight`] while another claim is submitting
    pub async fn claim(&self) -> Result<ClaimResult, ClaimError> {
        let (call, epoch) = {
            let mut inner = self.shared.inner.lock();
            let sender = match (inner.session.state, inner.session.address) {
                (SessionState::Submitting, _) => return Err(ClaimError::AlreadyInFlight),
                (SessionState::Connected, Some(address)) => address,
                _ => return Err(ClaimError::NotConnected),
            };
            self.shared.set_state(&mut inner, SessionState::Submitting);
            let request = self.config.request_for(sender);
            (self.config.call_for(&request), inner.epoch)
        };

        info!(
            sender = %call.sender,
            contract = %call.contract,
            value_wei = %call.value_wei,
            "submitting claim"
        );
        let outcome = self.invoker.call(&call).await;

        let (result, last_error) = match outcome {
            Ok(receipt) => {
                info!(tx_hash = %receipt.transaction_hash, "claim succeeded");
                (ClaimResult::Success(receipt), None)
            }
            Err(e) => {
                let reason = classify_claim(&e);
                warn!(%reason, error = %e, "claim failed");
                let info = ErrorInfo::new(ErrorKind::ClaimFailed(reason), e.to_string());
                (ClaimResult::Failure(reason), Some(info))
            }
        };

        let mut inner = self.shared.inner.lock();
        if inner.epoch == epoch && inner.session.state == SessionState::Submitting {
            inner.session.last_error = last_error;
            self.shared.set_state(&mut inner, SessionState::Connected);
        } else {
            debug!("session changed while the claim was in flight");
        }
        Ok(result)
    }

    /// Drop the connection. Always succeeds; provider teardown is best-effort.
    pub async fn disconnect(&self) {
        let listener = {
            let mut inner = self.shared.inner.lock();
            inner.epoch += 1;
            inner.session.address = None;
            inner.session.last_error = None;
            self.shared.set_state(&mut inner, SessionState::Disconnected);
            inner.listener.take()
        };

        if let Some(id) = listener {
            let _ = self.wallet.remove_listener(id);
        }
        self.teardown_wallet().await;
        info!(wallet = self.wallet.name(), "wallet disconnected");
    }

    async fn teardown_wallet(&self) {
        if let Err(e) = self.wallet.disconnect().await {
            warn!(wallet = self.wallet.name(), error = %e, "wallet teardown failed");
        }
    }

    /// Register the account listener for the connection at `epoch`.
    fn watch_accounts(&self, epoch: u64) {
        let shared = Arc::downgrade(&self.shared);
        let wallet: Weak<dyn WalletProvider> = Arc::downgrade(&self.wallet);
        let listener: AccountsListener = Arc::new(move |accounts: Vec<Address>| {
            let Some(shared) = shared.upgrade() else {
                return;
            };
            let Some(id) = shared.on_accounts(epoch, &accounts) else {
                return;
            };
            if let Some(wallet) = wallet.upgrade() {
                let _ = wallet.remove_listener(id);
            }
        });
        let id = self.wallet.on_accounts_changed(listener);

        let stale = {
            let mut inner = self.shared.inner.lock();
            if inner.epoch == epoch && inner.session.state.has_address() {
                inner.listener.replace(id)
            } else {
                Some(id)
            }
        };
        if let Some(stale) = stale {
            let _ = self.wallet.remove_listener(stale);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
