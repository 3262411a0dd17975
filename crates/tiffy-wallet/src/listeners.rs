//! Registry of account-change callbacks shared by every connector.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tiffy_core::{AccountsListener, Address, ListenerId};

/// Ordered set of account-change listeners.
///
/// Notification snapshots the list first, so a listener may remove itself
/// (or others) from inside its callback.
#[derive(Default)]
pub struct ListenerSet {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(ListenerId, AccountsListener)>>,
}

impl ListenerSet {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener; it will be called after all earlier ones.
    pub fn add(&self, listener: AccountsListener) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        self.listeners.lock().push((id, listener));
        id
    }

    /// Remove a listener. Returns whether it was registered.
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.listeners.lock().len()
    }

    /// Whether no listeners are registered.
    pub fn is_empty(&self) -> bool {
        self.listeners.lock().is_empty()
    }

    /// Invoke every listener, in registration order, with `accounts`.
    pub fn notify(&self, accounts: &[Address]) {
        let snapshot: Vec<AccountsListener> = self
            .listeners
            .lock()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in snapshot {
            listener(accounts.to_vec());
        }
    }
}
