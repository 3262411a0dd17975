//! Lifecycle properties of `ConnectionSession`, driven through scripted mocks.

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use tiffy_core::{
    AbiFunction, Address, ClaimConfig, ClaimError, ClaimResult, ConnectError, ErrorKind,
    FailureReason, ProviderError, SessionState, U256,
};
use tiffy_session::ConnectionSession;
use tiffy_wallet::{MockCall, MockConnect, MockInvoker, MockWallet};

const ALICE: Address = Address::new([0xaa; 20]);
const BOB: Address = Address::new([0xbb; 20]);

fn config() -> ClaimConfig {
    ClaimConfig {
        contract: Address::new([0xe4; 20]),
        function: AbiFunction::payable("claim"),
        fee_wei: U256::from(860_000_000_000_000_u64),
    }
}

struct Harness {
    wallet: Arc<MockWallet>,
    invoker: Arc<MockInvoker>,
    session: ConnectionSession,
}

fn harness(connects: Vec<MockConnect>, calls: Vec<MockCall>) -> Harness {
    let wallet = Arc::new(MockWallet::new(connects));
    let invoker = Arc::new(MockInvoker::new(calls));
    let session = ConnectionSession::new(wallet.clone(), invoker.clone(), config());
    Harness {
        wallet,
        invoker,
        session,
    }
}

fn assert_consistent(session: &ConnectionSession) {
    let snapshot = session.snapshot();
    assert!(
        snapshot.is_consistent(),
        "address {:?} in state {}",
        snapshot.address,
        snapshot.state
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Address presence tracks state
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn address_present_only_while_connected_or_submitting() {
    let h = harness(
        vec![
            MockConnect::rejected(),
            MockConnect::Accounts(vec![ALICE]),
            MockConnect::Accounts(vec![BOB]),
        ],
        vec![
            MockCall::failure(-32000, "insufficient funds for gas * price + value"),
            MockCall::delayed(Duration::from_millis(30), MockCall::success(0x01)),
        ],
    );
    let s = &h.session;
    assert_consistent(s);

    let _ = s.connect().await;
    assert_consistent(s);
    let _ = s.connect().await;
    assert_consistent(s);
    let _ = s.claim().await;
    assert_consistent(s);

    let (claimed, ()) = tokio::join!(s.claim(), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(s.state(), SessionState::Submitting);
        assert_consistent(s);
        h.wallet.emit_accounts(vec![BOB]);
        assert_consistent(s);
    });
    assert!(claimed.unwrap().is_success());
    assert_consistent(s);

    s.disconnect().await;
    assert_consistent(s);
    let _ = s.claim().await;
    assert_consistent(s);
    let _ = s.connect().await;
    assert_consistent(s);
    h.wallet.emit_accounts(vec![]);
    assert_consistent(s);
}

// ─────────────────────────────────────────────────────────────────────────────
// Claim guards
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn claim_while_disconnected_never_reaches_contract() {
    let h = harness(vec![], vec![MockCall::success(0x01)]);

    assert_eq!(h.session.claim().await, Err(ClaimError::NotConnected));
    assert_eq!(h.invoker.call_count(), 0);
    assert_eq!(h.session.state(), SessionState::Disconnected);
}

#[tokio::test]
async fn claim_while_failed_never_reaches_contract() {
    let h = harness(vec![MockConnect::rejected()], vec![MockCall::success(0x01)]);
    let _ = h.session.connect().await;
    assert_eq!(h.session.state(), SessionState::Failed);

    assert_eq!(h.session.claim().await, Err(ClaimError::NotConnected));
    assert_eq!(h.invoker.call_count(), 0);
    assert_eq!(h.session.state(), SessionState::Failed);
}

#[tokio::test(start_paused = true)]
async fn concurrent_claims_issue_one_call() {
    let h = harness(
        vec![MockConnect::Accounts(vec![ALICE])],
        vec![
            MockCall::delayed(Duration::from_millis(50), MockCall::success(0x01)),
            MockCall::success(0x02),
        ],
    );
    let _ = h.session.connect().await.unwrap();

    let (first, second) = tokio::join!(h.session.claim(), h.session.claim());

    let outcomes = [first, second];
    assert_eq!(
        outcomes.iter().filter(|r| matches!(r, Ok(ClaimResult::Success(_)))).count(),
        1
    );
    assert_eq!(
        outcomes
            .iter()
            .filter(|r| matches!(r, Err(ClaimError::AlreadyInFlight)))
            .count(),
        1
    );
    assert_eq!(h.invoker.call_count(), 1);
}

// ─────────────────────────────────────────────────────────────────────────────
// Claim outcomes
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn claim_returns_to_connected_on_success_and_failure() {
    let h = harness(
        vec![MockConnect::Accounts(vec![ALICE])],
        vec![
            MockCall::success(0x01),
            MockCall::Error(ProviderError::Timeout("request timed out".into())),
        ],
    );
    let _ = h.session.connect().await.unwrap();

    assert!(h.session.claim().await.unwrap().is_success());
    assert_eq!(h.session.state(), SessionState::Connected);

    assert_eq!(
        h.session.claim().await.unwrap(),
        ClaimResult::Failure(FailureReason::NetworkError)
    );
    assert_eq!(h.session.state(), SessionState::Connected);
    assert_eq!(h.session.address(), Some(ALICE));
}

#[tokio::test(start_paused = true)]
async fn accounts_emptied_mid_claim_disconnects_but_returns_result() {
    let h = harness(
        vec![MockConnect::Accounts(vec![ALICE])],
        vec![MockCall::delayed(
            Duration::from_millis(50),
            MockCall::success(0x01),
        )],
    );
    let _ = h.session.connect().await.unwrap();

    let (claimed, ()) = tokio::join!(h.session.claim(), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        h.wallet.emit_accounts(vec![]);
    });

    assert_matches!(claimed, Ok(ClaimResult::Success(_)));
    assert_eq!(h.session.state(), SessionState::Disconnected);
    assert_eq!(h.session.address(), None);
    assert_eq!(h.wallet.listener_count(), 0);
}

#[tokio::test]
async fn insufficient_funds_then_success() {
    let h = harness(
        vec![MockConnect::Accounts(vec![ALICE])],
        vec![
            MockCall::failure(-32000, "insufficient funds for gas * price + value"),
            MockCall::success(0x01),
        ],
    );
    let _ = h.session.connect().await.unwrap();

    assert_eq!(
        h.session.claim().await.unwrap(),
        ClaimResult::Failure(FailureReason::InsufficientFunds)
    );
    assert_eq!(h.session.state(), SessionState::Connected);
    assert_eq!(
        h.session.last_error().unwrap().kind,
        ErrorKind::ClaimFailed(FailureReason::InsufficientFunds)
    );

    assert_matches!(h.session.claim().await, Ok(ClaimResult::Success(_)));
    assert_eq!(h.session.state(), SessionState::Connected);
    assert_eq!(h.session.last_error(), None);
    assert_eq!(h.invoker.call_count(), 2);
}

// ─────────────────────────────────────────────────────────────────────────────
// Connection failures
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn rejected_connect_then_retry() {
    let h = harness(
        vec![MockConnect::rejected(), MockConnect::Accounts(vec![ALICE])],
        vec![],
    );

    assert_eq!(h.session.connect().await, Err(ConnectError::UserRejected));
    let snapshot = h.session.snapshot();
    assert_eq!(snapshot.state, SessionState::Failed);
    assert_eq!(snapshot.address, None);
    assert_eq!(snapshot.last_error.unwrap().kind, ErrorKind::ConnectionRejected);
    assert_eq!(h.wallet.listener_count(), 0);

    assert_eq!(h.session.connect().await, Ok(ALICE));
    let snapshot = h.session.snapshot();
    assert_eq!(snapshot.state, SessionState::Connected);
    assert_eq!(snapshot.address, Some(ALICE));
    assert_eq!(snapshot.last_error, None);
    assert_eq!(h.wallet.listener_count(), 1);
}

#[tokio::test]
async fn reconnect_after_disconnect_keeps_one_listener() {
    let h = harness(
        vec![
            MockConnect::Accounts(vec![ALICE]),
            MockConnect::Accounts(vec![BOB]),
        ],
        vec![],
    );

    let _ = h.session.connect().await.unwrap();
    h.session.disconnect().await;
    assert_eq!(h.session.connect().await, Ok(BOB));
    assert_eq!(h.wallet.listener_count(), 1);
}
