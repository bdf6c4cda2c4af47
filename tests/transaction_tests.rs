//! Transaction Tests: submit → confirm → reconcile
//!
//! These tests verify:
//! 1. Donations convert to wei, clear the input and refresh the balance once
//! 2. Client-side gates never reach the wallet
//! 3. Reverts and rejections fail the operation without refreshing
//! 4. A second invocation while one is in flight is rejected

mod common;

use charity_client::view::LOADING;
use charity_client::{Action, ClientError, Operation, ProviderError, TxPhase};
use common::*;
use futures::poll;
use serde_json::json;
use std::pin::pin;

/// Test: donate 1.5 ETH end to end
#[tokio::test]
async fn donate_converts_clears_and_refreshes() {
    let (chain, session) = connected(OWNER, DONOR).await;
    let reads_before = chain.reads("getBalance");

    session.set_donation_amount("1.5");
    let receipt = session.donate().await.expect("donate");

    let sends = chain.sends();
    assert_eq!(sends.len(), 1);
    assert_eq!(sends[0]["value"], json!("0x14d1120d7b160000"));
    assert_eq!(sends[0]["from"], json!(DONOR));
    assert!(receipt.hash.starts_with("0x"));
    assert!(receipt.block_number.is_some());

    assert_eq!(chain.reads("getBalance"), reads_before + 1);
    let view = session.view();
    assert_eq!(view.balance.as_deref(), Some("1.5"));
    assert_eq!(view.balance_label, "1.5 ETH");
    assert_eq!(view.donation_amount, "");
    assert_eq!(view.notice.unwrap().message(), "Successfully donated 1.5 ETH!");
    assert_eq!(
        session.transactions().phase(Operation::Donate),
        TxPhase::Confirmed { hash: receipt.hash }
    );
}

/// Test: amounts that are not positive decimals never submit
#[tokio::test]
async fn invalid_donation_amounts_never_submit() {
    let (chain, session) = connected(OWNER, DONOR).await;

    for amount in ["", "0", "0.0", "-1", "abc", "1.2.3", "1e18", "0.0000000000000000001"] {
        session.set_donation_amount(amount);
        let err = session.donate().await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidInput(_)), "{amount:?} gave {err:?}");
        assert_eq!(session.notice().unwrap().message(), "Please enter a valid donation amount.");
        assert_eq!(session.view().donation_amount, amount);
    }
    assert!(chain.sends().is_empty());
    assert_eq!(session.transactions().phase(Operation::Donate), TxPhase::Idle);
}

/// Test: non-owner withdraw is refused locally
#[tokio::test]
async fn withdraw_requires_owner() {
    let (chain, session) = connected(OWNER, DONOR).await;

    let err = session.withdraw().await.unwrap_err();
    assert!(matches!(err, ClientError::NotAuthorized(_)));
    assert_eq!(session.notice().unwrap().message(), "Only the owner can withdraw funds.");
    assert!(chain.sends().is_empty());
}

/// Test: owner withdraws everything
#[tokio::test]
async fn owner_withdraws_all_funds() {
    let (chain, session) = connected(OWNER, OWNER).await;
    session.set_donation_amount("2");
    session.donate().await.expect("donate");
    assert_eq!(session.snapshot().balance.as_deref(), Some("2.0"));

    session.withdraw().await.expect("withdraw");
    assert_eq!(chain.balance(), alloy_primitives::U256::ZERO);
    assert_eq!(session.snapshot().balance.as_deref(), Some("0.0"));
    assert_eq!(session.notice().unwrap().message(), "Successfully withdrew all funds!");
}

/// Test: changeOwner rejects malformed addresses before anything is sent
#[tokio::test]
async fn change_owner_validates_address() {
    let (chain, session) = connected(OWNER, OWNER).await;

    session.set_new_owner("not-an-address");
    let err = session.change_owner().await.unwrap_err();
    assert!(matches!(err, ClientError::InvalidInput(_)));
    assert_eq!(session.notice().unwrap().message(), "Invalid address or you are not the owner.");

    // Mixed case with a broken checksum
    session.set_new_owner("0xE7f1725E7734CE288F8367e1Bb143E90bb3F0512");
    assert!(session.change_owner().await.is_err());
    assert!(chain.sends().is_empty());
}

/// Test: non-owner changeOwner is refused with the same message
#[tokio::test]
async fn change_owner_requires_owner() {
    let (chain, session) = connected(OWNER, DONOR).await;
    session.set_new_owner(STRANGER);

    let err = session.change_owner().await.unwrap_err();
    assert!(matches!(err, ClientError::NotAuthorized(_)));
    assert_eq!(session.notice().unwrap().message(), "Invalid address or you are not the owner.");
    assert!(chain.sends().is_empty());
}

/// Test: transferring ownership drops owner privileges after confirmation
#[tokio::test]
async fn change_owner_transfers_and_recomputes() {
    let (chain, session) = connected(OWNER, OWNER).await;
    session.set_new_owner(STRANGER);

    session.change_owner().await.expect("change owner");

    assert_eq!(chain.owner().to_string().to_lowercase(), STRANGER);
    let view = session.view();
    assert!(!view.is_owner);
    assert_eq!(view.new_owner, "");
    assert_eq!(view.actions, vec![Action::Donate, Action::RefundDonation]);
    assert_eq!(view.notice.unwrap().message(), format!("Ownership transferred to {STRANGER}!"));
    assert_eq!(chain.reads("owner"), 2);
}

/// Test: stale ownership lets withdraw through, the chain reverts it
#[tokio::test]
async fn reverted_withdraw_fails_without_refresh() {
    let (chain, session) = connected(OWNER, OWNER).await;
    chain.set_owner(STRANGER);
    let reads_before = chain.reads("getBalance");

    let err = session.withdraw().await.unwrap_err();
    assert!(matches!(err, ClientError::ConfirmationFailed(_)), "got {err:?}");
    assert_eq!(chain.sends().len(), 1);
    assert_eq!(chain.reads("getBalance"), reads_before);
    assert_eq!(session.notice().unwrap().message(), "Withdrawal failed.");
    assert!(matches!(session.transactions().phase(Operation::Withdraw), TxPhase::Failed { .. }));
}

/// Test: refund with nothing donated reverts with its own message
#[tokio::test]
async fn refund_failure_has_distinct_message() {
    let (_chain, session) = connected(OWNER, DONOR).await;

    let err = session.refund_donation().await.unwrap_err();
    assert!(matches!(err, ClientError::ConfirmationFailed(_)));
    assert_eq!(session.notice().unwrap().message(), "Failed to refund donation.");
}

/// Test: refund returns the caller's donation
#[tokio::test]
async fn refund_returns_donation() {
    let (chain, session) = connected(OWNER, DONOR).await;
    session.set_donation_amount("0.25");
    session.donate().await.expect("donate");

    session.refund_donation().await.expect("refund");
    assert_eq!(chain.balance(), alloy_primitives::U256::ZERO);
    assert_eq!(session.snapshot().balance.as_deref(), Some("0.0"));
    assert_eq!(session.notice().unwrap().message(), "Donation refunded successfully!");
}

/// Test: rejection in the wallet maps to UserRejected and keeps the input
#[tokio::test]
async fn rejected_submission_keeps_input() {
    let (chain, session) = connected(OWNER, DONOR).await;
    chain.fail_next_send(ProviderError::new(ProviderError::USER_REJECTED, "User denied transaction signature."));

    session.set_donation_amount("1");
    let err = session.donate().await.unwrap_err();
    assert_eq!(err, ClientError::UserRejected);
    assert_eq!(session.view().donation_amount, "1");
    assert_eq!(session.notice().unwrap().message(), "Request rejected in wallet.");
    assert!(!session.transactions().is_pending(Operation::Donate));
}

/// Test: other submission errors report the operation's failure message
#[tokio::test]
async fn failed_submission_reports_operation() {
    let (chain, session) = connected(OWNER, DONOR).await;
    chain.fail_next_send(ProviderError::new(-32000, "insufficient funds for gas * price + value"));

    session.set_donation_amount("1");
    let err = session.donate().await.unwrap_err();
    assert!(matches!(err, ClientError::SubmissionFailed(_)));
    assert_eq!(session.notice().unwrap().message(), "Donation failed.");
}

/// Test: a second donate while the first awaits confirmation is rejected
#[tokio::test]
async fn second_invocation_while_pending_is_rejected() {
    let (chain, session) = connected(OWNER, DONOR).await;
    chain.set_auto_mine(false);
    session.set_donation_amount("1");

    let mut first = pin!(session.donate());
    assert!(poll!(first.as_mut()).is_pending());
    assert!(matches!(
        session.transactions().phase(Operation::Donate),
        TxPhase::AwaitingConfirmation { .. }
    ));
    assert_eq!(session.view().pending, vec![Operation::Donate]);

    let err = session.donate().await.unwrap_err();
    assert_eq!(err, ClientError::AlreadyPending(Operation::Donate));
    assert_eq!(chain.sends().len(), 1);

    // Other operations are independent
    assert!(!session.transactions().is_pending(Operation::RefundDonation));

    chain.mine_all();
    first.await.expect("first donation");
    assert_eq!(session.snapshot().balance.as_deref(), Some("1.0"));
    assert!(session.view().pending.is_empty());
}

/// Test: an abandoned invocation does not wedge the operation
#[tokio::test]
async fn abandoned_invocation_releases_guard() {
    let (chain, session) = connected(OWNER, DONOR).await;
    chain.set_auto_mine(false);
    session.set_donation_amount("1");

    {
        let mut first = pin!(session.donate());
        assert!(poll!(first.as_mut()).is_pending());
    }
    assert!(matches!(session.transactions().phase(Operation::Donate), TxPhase::Failed { .. }));

    chain.set_auto_mine(true);
    session.donate().await.expect("retry");
}

/// Test: a failed balance read after confirmation leaves the balance unknown, not stale
#[tokio::test]
async fn failed_reconcile_read_is_reloaded_later() {
    let (chain, session) = connected(OWNER, DONOR).await;
    assert_eq!(session.snapshot().balance.as_deref(), Some("0.0"));
    chain.fail_reads(true);

    session.set_donation_amount("1");
    session.donate().await.expect("donate");
    assert!(session.snapshot().balance.is_none());
    assert_eq!(session.view().balance_label, LOADING);

    chain.fail_reads(false);
    let reads_before = chain.reads("getBalance");
    session.refresh_if_stale().await.expect("refresh");
    assert_eq!(chain.reads("getBalance"), reads_before + 1);
    assert_eq!(session.snapshot().balance.as_deref(), Some("1.0"));
}
