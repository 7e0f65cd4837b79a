//! Integration test: cooperative channel lifecycle from funding to payout.
//!
//! Two participants fund a channel through the funding coordinator, update
//! balances off-ledger, register a final state, and withdraw their settled
//! shares without waiting out the dispute window.

use std::sync::Arc;

use tally_adjudicator::{AdjudicatorError, CancelToken, Funder, FundingRequest};
use tally_core::SignedState;
use tally_integration_tests::{adjudicator_setup, channel_params, fast_poll, keypairs, signed_state};

// =========================================================================
// Scenario: fund, update off-ledger, close cooperatively
// =========================================================================

#[tokio::test]
async fn test_cooperative_close_full_flow() {
    let (alice, bob) = keypairs();
    let params = channel_params(60, &[&alice, &bob]);
    let channel = params.channel_id();
    let (_ledger, adjudicator) = adjudicator_setup();

    // Both sides fund their opening share concurrently.
    let opening = signed_state(&params, 0, vec![600, 400], false, &[&alice, &bob]);
    let funder = Arc::new(Funder::new(adjudicator.holder(), &fast_poll()));
    let alice_task = {
        let funder = funder.clone();
        let request = FundingRequest::new(params.clone(), opening.state.clone(), 0);
        tokio::spawn(async move { funder.fund(&request, &CancelToken::new()).await })
    };
    let bob_task = {
        let funder = funder.clone();
        let request = FundingRequest::new(params.clone(), opening.state.clone(), 1);
        tokio::spawn(async move { funder.fund(&request, &CancelToken::new()).await })
    };
    alice_task.await.unwrap().expect("alice funding");
    bob_task.await.unwrap().expect("bob funding");

    assert_eq!(
        adjudicator
            .total_holding(channel, &params.participants)
            .await
            .unwrap(),
        1000
    );

    // Anchor the opening state on the ledger.
    adjudicator.register(&opening).await.expect("register v0");

    // Balances move off-ledger; only the agreed final state comes back.
    let closing = signed_state(&params, 3, vec![250, 750], true, &[&alice, &bob]);
    adjudicator.register(&closing).await.expect("register final");

    // Finality skips the dispute window entirely.
    let alice_payout = adjudicator.withdraw(channel, alice.identity()).await.unwrap();
    let bob_payout = adjudicator.withdraw(channel, bob.identity()).await.unwrap();
    assert_eq!(alice_payout, 250);
    assert_eq!(bob_payout, 750);
    assert_eq!(alice_payout + bob_payout, 1000);

    // A second withdrawal observes nothing left.
    assert_eq!(adjudicator.withdraw(channel, alice.identity()).await.unwrap(), 0);
}

// =========================================================================
// Wire-format and tamper checks across the crate boundary
// =========================================================================

#[tokio::test]
async fn test_signed_state_survives_wire_roundtrip() {
    let (alice, bob) = keypairs();
    let params = channel_params(60, &[&alice, &bob]);
    let (_ledger, adjudicator) = adjudicator_setup();

    let holder = adjudicator.holder();
    holder
        .deposit(params.channel_id(), alice.identity(), 1000)
        .await
        .unwrap();

    let original = signed_state(&params, 0, vec![500, 500], false, &[&alice, &bob]);
    let json = serde_json::to_string(&original).unwrap();
    let received: SignedState = serde_json::from_str(&json).unwrap();

    // The deserialized copy must verify and register like the original.
    adjudicator.register(&received).await.expect("register wire copy");
    assert_eq!(
        adjudicator
            .registration(params.channel_id())
            .await
            .unwrap()
            .state,
        original.state
    );
}

#[tokio::test]
async fn test_tampered_balances_rejected() {
    let (alice, bob) = keypairs();
    let params = channel_params(60, &[&alice, &bob]);
    let (_ledger, adjudicator) = adjudicator_setup();

    let mut tampered = signed_state(&params, 1, vec![500, 500], false, &[&alice, &bob]);
    tampered.state.balances = vec![1000, 0];

    let result = adjudicator.register(&tampered).await;
    assert!(matches!(result, Err(AdjudicatorError::Validation(_))));
}
