//! Integration test: recovering a deposit from a channel that never fully
//! funded.
//!
//! One side deposits its share, the peer never shows up. Funding is
//! cancelled, the version-zero state is registered without settlement, and
//! after the dispute window the deposit comes back.

use chrono::Duration as ChronoDuration;
use std::sync::Arc;
use std::time::Duration;

use tally_adjudicator::{AdjudicatorError, CancelToken, Funder, FundingRequest};
use tally_integration_tests::{adjudicator_setup, channel_params, fast_poll, keypairs, signed_state};

#[tokio::test]
async fn test_deposit_recovered_when_peer_never_funds() {
    let (alice, bob) = keypairs();
    let params = channel_params(60, &[&alice, &bob]);
    let channel = params.channel_id();
    let (ledger, adjudicator) = adjudicator_setup();

    let opening = signed_state(&params, 0, vec![600, 400], false, &[&alice, &bob]);
    let funder = Funder::new(adjudicator.holder(), &fast_poll());
    let cancel = CancelToken::new();

    // Give up on the peer after a short wait.
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(80)).await;
            cancel.cancel();
        });
    }
    let request = FundingRequest::new(params.clone(), opening.state.clone(), 0);
    let result = funder.fund(&request, &cancel).await;
    assert!(matches!(result, Err(AdjudicatorError::Cancelled)));

    // The deposit made before cancellation is still held.
    assert_eq!(adjudicator.holding(channel, alice.identity()).await.unwrap(), 600);

    // The underfunded opening state registers, but without settlement: Bob
    // is not credited a balance he never deposited.
    adjudicator.register(&opening).await.expect("register v0");
    assert_eq!(adjudicator.holding(channel, bob.identity()).await.unwrap(), 0);

    // Withdrawal stays gated until the window closes.
    let early = adjudicator.withdraw(channel, alice.identity()).await;
    assert!(matches!(early, Err(AdjudicatorError::ChallengeTimeout { .. })));

    ledger.advance_clock(ChronoDuration::seconds(61));
    assert_eq!(adjudicator.withdraw(channel, alice.identity()).await.unwrap(), 600);
    assert_eq!(adjudicator.withdraw(channel, bob.identity()).await.unwrap(), 0);
}

#[tokio::test]
async fn test_one_cancelled_funder_does_not_disturb_the_other() {
    let (alice, bob) = keypairs();
    let params = channel_params(60, &[&alice, &bob]);
    let channel = params.channel_id();
    let (_ledger, adjudicator) = adjudicator_setup();

    let opening = signed_state(&params, 0, vec![600, 400], false, &[&alice, &bob]);
    let funder = Arc::new(Funder::new(adjudicator.holder(), &fast_poll()));

    // Bob funds and waits; Alice's attempt gets cancelled immediately.
    let bob_task = {
        let funder = funder.clone();
        let request = FundingRequest::new(params.clone(), opening.state.clone(), 1);
        tokio::spawn(async move { funder.fund(&request, &CancelToken::new()).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    let cancelled = CancelToken::new();
    cancelled.cancel();
    let alice_request = FundingRequest::new(params.clone(), opening.state.clone(), 0);
    assert!(matches!(
        funder.fund(&alice_request, &cancelled).await,
        Err(AdjudicatorError::Cancelled)
    ));
    assert_eq!(adjudicator.holding(channel, alice.identity()).await.unwrap(), 0);

    // Alice retries with a live token; both funders now complete.
    let retry = FundingRequest::new(params.clone(), opening.state.clone(), 0);
    funder.fund(&retry, &CancelToken::new()).await.expect("alice retry");
    bob_task.await.unwrap().expect("bob funding");

    assert_eq!(
        adjudicator
            .total_holding(channel, &params.participants)
            .await
            .unwrap(),
        1000
    );
}
