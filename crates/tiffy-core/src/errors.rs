//! Error taxonomy and the rules that classify raw provider failures.
//!
//! Adapters report what went wrong as a [`ProviderError`]. The session turns
//! that into a [`ConnectError`] (connection path) or a [`FailureReason`]
//! (claim path) using [`classify_connect`] and [`classify_claim`].

use alloy_primitives::B256;

use crate::types::{ErrorKind, FailureReason};

/// EIP-1193: the user rejected the request.
pub const CODE_USER_REJECTED: i64 = 4001;
/// EIP-1193: the requested account or method is not authorized.
pub const CODE_UNAUTHORIZED: i64 = 4100;
/// EIP-1193: the provider does not support the method.
pub const CODE_UNSUPPORTED_METHOD: i64 = 4200;
/// EIP-1193: the provider is disconnected from all chains.
pub const CODE_DISCONNECTED: i64 = 4900;
/// EIP-1193: the provider is not connected to the requested chain.
pub const CODE_CHAIN_DISCONNECTED: i64 = 4901;
/// JSON-RPC: method not found.
pub const CODE_METHOD_NOT_FOUND: i64 = -32601;

/// Raw failure reported by a wallet or contract backend.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// The backend answered with a JSON-RPC / EIP-1193 error object.
    #[error("rpc error {code}: {message}")]
    Rpc {
        /// Numeric error code.
        code: i64,
        /// Error message.
        message: String,
        /// Optional `data` payload, rendered as a string.
        data: Option<String>,
    },
    /// The backend did not answer in time.
    #[error("timeout: {0}")]
    Timeout(String),
    /// The backend could not be reached at all.
    #[error("provider unavailable: {0}")]
    Unavailable(String),
    /// The transport failed mid-request.
    #[error("transport error: {0}")]
    Transport(String),
    /// The transaction was mined but reverted.
    #[error("transaction {tx_hash} reverted{}", .reason.as_deref().map(|r| format!(": {r}")).unwrap_or_default())]
    Reverted {
        /// Hash of the reverted transaction.
        tx_hash: B256,
        /// Revert reason, when the backend supplies one.
        reason: Option<String>,
    },
    /// The backend answered with something that could not be decoded.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl ProviderError {
    /// Shorthand for an RPC error without data.
    pub fn rpc(code: i64, message: impl Into<String>) -> Self {
        Self::Rpc {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// EIP-1193 / JSON-RPC code, if any.
    pub fn code(&self) -> Option<i64> {
        match self {
            Self::Rpc { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Short classification string for logging.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Rpc { .. } => "rpc",
            Self::Timeout(_) => "timeout",
            Self::Unavailable(_) => "unavailable",
            Self::Transport(_) => "transport",
            Self::Reverted { .. } => "reverted",
            Self::Malformed(_) => "malformed",
        }
    }

    /// Lowercased message plus data, for keyword matching.
    fn haystack(&self) -> String {
        match self {
            Self::Rpc { message, data, .. } => {
                let mut text = message.to_lowercase();
                if let Some(data) = data {
                    text.push(' ');
                    text.push_str(&data.to_lowercase());
                }
                text
            }
            Self::Reverted { reason, .. } => reason.as_deref().unwrap_or_default().to_lowercase(),
            Self::Timeout(m) | Self::Unavailable(m) | Self::Transport(m) | Self::Malformed(m) => {
                m.to_lowercase()
            }
        }
    }

    fn is_user_rejection(&self) -> bool {
        if self.code() == Some(CODE_USER_REJECTED) {
            return true;
        }
        let text = self.haystack();
        ["user rejected", "user denied", "rejected by user", "user cancelled"]
            .iter()
            .any(|needle| text.contains(needle))
    }
}

/// Why [`connect`](crate::WalletProvider::connect) did not yield an address.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConnectError {
    /// The user declined the connection.
    #[error("connection rejected by user")]
    UserRejected,
    /// No usable wallet backend.
    #[error("wallet provider unavailable: {0}")]
    ProviderUnavailable(String),
    /// The wallet did not answer in time.
    #[error("wallet connection timed out: {0}")]
    Timeout(String),
    /// Anything else the provider reported.
    #[error("wallet connection failed: {0}")]
    Unknown(String),
    /// The wallet approved the connection but exposed no accounts.
    #[error("wallet returned no accounts")]
    NoAccounts,
    /// A connection attempt is already pending.
    #[error("a connection attempt is already in progress")]
    InProgress,
    /// The session was disconnected while the attempt was pending.
    #[error("connection attempt interrupted by disconnect")]
    Interrupted,
}

impl ConnectError {
    /// Category recorded on the session for this failure.
    pub fn error_kind(&self) -> ErrorKind {
        match self {
            Self::UserRejected => ErrorKind::ConnectionRejected,
            _ => ErrorKind::ProviderError,
        }
    }

    /// Short classification string for logging.
    pub fn kind_str(&self) -> &'static str {
        match self {
            Self::UserRejected => "user_rejected",
            Self::ProviderUnavailable(_) => "provider_unavailable",
            Self::Timeout(_) => "timeout",
            Self::Unknown(_) => "unknown",
            Self::NoAccounts => "no_accounts",
            Self::InProgress => "in_progress",
            Self::Interrupted => "interrupted",
        }
    }
}

/// Why a claim was refused before reaching the contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ClaimError {
    /// No wallet is connected.
    #[error("wallet not connected")]
    NotConnected,
    /// Another claim is still being submitted.
    #[error("a claim is already in flight")]
    AlreadyInFlight,
}

/// Map a provider failure on the connection path.
pub fn classify_connect(error: &ProviderError) -> ConnectError {
    if error.is_user_rejection() {
        return ConnectError::UserRejected;
    }
    match error {
        ProviderError::Timeout(m) => ConnectError::Timeout(m.clone()),
        ProviderError::Unavailable(m) => ConnectError::ProviderUnavailable(m.clone()),
        ProviderError::Rpc { code, message, .. }
            if matches!(
                *code,
                CODE_UNAUTHORIZED
                    | CODE_UNSUPPORTED_METHOD
                    | CODE_DISCONNECTED
                    | CODE_CHAIN_DISCONNECTED
                    | CODE_METHOD_NOT_FOUND
            ) =>
        {
            ConnectError::ProviderUnavailable(message.clone())
        }
        other => ConnectError::Unknown(other.to_string()),
    }
}

/// Map a provider failure on the claim path.
///
/// Keyword matching only applies to what the node or contract said; transport
/// failures are always [`FailureReason::NetworkError`].
pub fn classify_claim(error: &ProviderError) -> FailureReason {
    if error.is_user_rejection() {
        return FailureReason::UserRejected;
    }
    match error {
        ProviderError::Timeout(_) | ProviderError::Unavailable(_) | ProviderError::Transport(_) => {
            return FailureReason::NetworkError;
        }
        ProviderError::Malformed(_) => return FailureReason::Unknown,
        ProviderError::Rpc { .. } | ProviderError::Reverted { .. } => {}
    }

    let text = error.haystack();
    if text.contains("insufficient funds") || text.contains("insufficient balance") {
        return FailureReason::InsufficientFunds;
    }
    if ["cooldown", "too soon", "too early", "wait"]
        .iter()
        .any(|needle| text.contains(needle))
    {
        return FailureReason::CooldownActive;
    }
    match error {
        ProviderError::Rpc { code, .. }
            if matches!(*code, CODE_DISCONNECTED | CODE_CHAIN_DISCONNECTED) =>
        {
            FailureReason::NetworkError
        }
        _ => FailureReason::Unknown,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
