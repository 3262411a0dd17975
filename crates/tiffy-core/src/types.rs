//! Session and claim data model.

use std::fmt;

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a wallet session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No wallet attached.
    #[default]
    Disconnected,
    /// Waiting for the wallet to approve the connection.
    Connecting,
    /// Wallet attached, an address is known.
    Connected,
    /// A claim transaction is in flight.
    Submitting,
    /// The last connection attempt failed.
    Failed,
}

impl SessionState {
    /// Whether an address must be present in this state.
    pub fn has_address(self) -> bool {
        matches!(self, Self::Connected | Self::Submitting)
    }

    /// Short label for logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Submitting => "submitting",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a submitted claim did not go through.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// Sender cannot cover the fee plus gas.
    InsufficientFunds,
    /// The contract refused because the claim cooldown has not elapsed.
    CooldownActive,
    /// The user declined to sign.
    UserRejected,
    /// The node or transport failed.
    NetworkError,
    /// Anything the classifier could not place.
    Unknown,
}

impl FailureReason {
    /// Short label for logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InsufficientFunds => "insufficient_funds",
            Self::CooldownActive => "cooldown_active",
            Self::UserRejected => "user_rejected",
            Self::NetworkError => "network_error",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category of the error recorded on the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "reason")]
pub enum ErrorKind {
    /// The user declined the connection request.
    ConnectionRejected,
    /// The wallet provider failed for any other reason.
    ProviderError,
    /// A claim was submitted and failed.
    ClaimFailed(FailureReason),
}

/// Last error observed by the session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Error category.
    pub kind: ErrorKind,
    /// Provider-supplied detail, verbatim.
    pub detail: String,
}

impl ErrorInfo {
    /// Build an error record.
    pub fn new(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }
}

/// Point-in-time view of a session.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Current lifecycle state.
    pub state: SessionState,
    /// Connected account, present only while connected or submitting.
    pub address: Option<Address>,
    /// Most recent failure, cleared by the next successful transition.
    pub last_error: Option<ErrorInfo>,
}

impl Session {
    /// `address` is set iff the state requires one.
    pub fn is_consistent(&self) -> bool {
        self.address.is_some() == self.state.has_address()
    }
}

/// The payable call a claim issues.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimRequest {
    /// Contract function name.
    pub function_name: String,
    /// Native value attached to the call, in wei.
    pub value_wei: U256,
    /// Account paying the fee; always the connected address.
    pub sender: Address,
}

impl ClaimRequest {
    /// Build a request for `function_name` paying `value_wei` from `sender`.
    pub fn new(function_name: impl Into<String>, value_wei: U256, sender: Address) -> Self {
        Self {
            function_name: function_name.into(),
            value_wei,
            sender,
        }
    }
}

/// Receipt of a mined transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    /// Transaction hash.
    pub transaction_hash: B256,
    /// Block the transaction landed in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    /// Gas consumed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_used: Option<U256>,
}

impl TransactionReceipt {
    /// Receipt with only a hash known.
    pub fn from_hash(transaction_hash: B256) -> Self {
        Self {
            transaction_hash,
            block_number: None,
            gas_used: None,
        }
    }
}

/// Outcome of a claim that reached the contract invoker.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome", content = "detail")]
pub enum ClaimResult {
    /// The transaction was mined successfully.
    Success(TransactionReceipt),
    /// The claim failed for the classified reason.
    Failure(FailureReason),
}

impl ClaimResult {
    /// Whether the claim succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Notification emitted by a session as it changes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum SessionEvent {
    /// The lifecycle state moved.
    StateChanged {
        /// Previous state.
        from: SessionState,
        /// New state.
        to: SessionState,
    },
    /// The wallet switched to another account without leaving the session.
    AccountChanged {
        /// Newly active account.
        address: Address,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_session_is_disconnected_and_consistent() {
        let session = Session::default();
        assert_eq!(session.state, SessionState::Disconnected);
        assert!(session.address.is_none());
        assert!(session.last_error.is_none());
        assert!(session.is_consistent());
    }

    #[test]
    fn address_required_only_when_connected_or_submitting() {
        assert!(SessionState::Connected.has_address());
        assert!(SessionState::Submitting.has_address());
        assert!(!SessionState::Disconnected.has_address());
        assert!(!SessionState::Connecting.has_address());
        assert!(!SessionState::Failed.has_address());
    }

    #[test]
    fn inconsistent_session_detected() {
        let session = Session {
            state: SessionState::Failed,
            address: Some(Address::repeat_byte(0xaa)),
            last_error: None,
        };
        assert!(!session.is_consistent());

        let session = Session {
            state: SessionState::Connected,
            address: None,
            last_error: None,
        };
        assert!(!session.is_consistent());
    }

    #[test]
    fn state_labels() {
        assert_eq!(SessionState::Submitting.to_string(), "submitting");
        assert_eq!(FailureReason::CooldownActive.to_string(), "cooldown_active");
    }

    #[test]
    fn claim_result_serializes_tagged() {
        let json = serde_json::to_value(ClaimResult::Failure(FailureReason::InsufficientFunds))
            .unwrap();
        assert_eq!(json["outcome"], "failure");
        assert_eq!(json["detail"], "insufficient_funds");
    }

    #[test]
    fn session_event_serializes_tagged() {
        let event = SessionEvent::StateChanged {
            from: SessionState::Connecting,
            to: SessionState::Connected,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "state_changed");
        assert_eq!(json["from"], "connecting");
        assert_eq!(json["to"], "connected");
    }

    #[test]
    fn receipt_skips_missing_fields() {
        let receipt = TransactionReceipt::from_hash(B256::repeat_byte(0x11));
        let json = serde_json::to_value(&receipt).unwrap();
        assert!(json.get("transactionHash").is_some());
        assert!(json.get("blockNumber").is_none());
        assert!(json.get("gasUsed").is_none());
    }
}
