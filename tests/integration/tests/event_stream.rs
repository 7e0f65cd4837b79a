//! Integration test: channel lifecycle observed through an event
//! subscription.
//!
//! These scenarios run against real clock time with second-long challenge
//! windows, because conclusion-by-timeout is judged against the wall clock.

use std::sync::Arc;
use std::time::Duration;

use tally_adjudicator::{AdjudicatorError, ChannelEvent, EventSubscription};
use tally_integration_tests::{adjudicator_setup, channel_params, fast_poll, keypairs, signed_state};

// =========================================================================
// Registration and conclusion, in order
// =========================================================================

#[tokio::test]
async fn test_subscription_sees_dispute_then_conclusion() {
    let (alice, bob) = keypairs();
    let params = channel_params(1, &[&alice, &bob]);
    let channel = params.channel_id();
    let (ledger, adjudicator) = adjudicator_setup();

    let holder = adjudicator.holder();
    holder.deposit(channel, alice.identity(), 1000).await.unwrap();

    let sub = EventSubscription::new(ledger.clone(), channel, &fast_poll());

    adjudicator
        .register(&signed_state(&params, 0, vec![600, 400], false, &[&alice, &bob]))
        .await
        .unwrap();
    let first = tokio::time::timeout(Duration::from_secs(3), sub.next())
        .await
        .expect("registration event")
        .unwrap();
    assert!(matches!(first, ChannelEvent::Registered { version: 0, .. }));

    // A refutation inside the window shows up as another registration.
    adjudicator
        .register(&signed_state(&params, 1, vec![100, 900], false, &[&alice, &bob]))
        .await
        .unwrap();
    let second = tokio::time::timeout(Duration::from_secs(3), sub.next())
        .await
        .expect("refutation event")
        .unwrap();
    assert_eq!(second.version(), 1);
    assert!(!second.is_concluded());

    // No further registrations: the window runs out and the stream reports
    // conclusion at the refutation's version.
    let last = tokio::time::timeout(Duration::from_secs(3), sub.next())
        .await
        .expect("conclusion event")
        .unwrap();
    assert!(last.is_concluded());
    assert_eq!(last.version(), 1);

    // By the time conclusion is observed the payout gate is open too.
    assert_eq!(adjudicator.withdraw(channel, alice.identity()).await.unwrap(), 100);
    assert_eq!(adjudicator.withdraw(channel, bob.identity()).await.unwrap(), 900);
}

#[tokio::test]
async fn test_final_state_concludes_without_waiting() {
    let (alice, bob) = keypairs();
    // An hour-long window that finality must bypass.
    let params = channel_params(3600, &[&alice, &bob]);
    let channel = params.channel_id();
    let (ledger, adjudicator) = adjudicator_setup();

    let holder = adjudicator.holder();
    holder.deposit(channel, alice.identity(), 1000).await.unwrap();

    adjudicator
        .register(&signed_state(&params, 2, vec![300, 700], true, &[&alice, &bob]))
        .await
        .unwrap();

    // Already final when first observed: conclusion is the first and only
    // event, no Registered precedes it.
    let sub = EventSubscription::new(ledger.clone(), channel, &fast_poll());
    let event = tokio::time::timeout(Duration::from_secs(2), sub.next())
        .await
        .expect("conclusion event")
        .unwrap();
    assert!(event.is_concluded());
    assert_eq!(event.version(), 2);
}

// =========================================================================
// Stream termination
// =========================================================================

#[tokio::test]
async fn test_close_ends_stream_without_error() {
    let (alice, bob) = keypairs();
    let params = channel_params(3600, &[&alice, &bob]);
    let channel = params.channel_id();
    let (ledger, adjudicator) = adjudicator_setup();

    let holder = adjudicator.holder();
    holder.deposit(channel, alice.identity(), 1000).await.unwrap();
    adjudicator
        .register(&signed_state(&params, 0, vec![500, 500], false, &[&alice, &bob]))
        .await
        .unwrap();

    let sub = Arc::new(EventSubscription::new(ledger.clone(), channel, &fast_poll()));
    sub.next().await.expect("registration event");

    // Nothing further will happen on the channel; a pending next() blocks
    // until close() from another task releases it.
    let pending = {
        let sub = sub.clone();
        tokio::spawn(async move { sub.next().await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    sub.close();

    let yielded = tokio::time::timeout(Duration::from_secs(1), pending)
        .await
        .expect("close should unblock next")
        .unwrap();
    assert!(yielded.is_none());
    assert!(sub.err().await.is_none());
}

#[tokio::test]
async fn test_polling_past_conclusion_is_flagged() {
    let (alice, bob) = keypairs();
    let params = channel_params(3600, &[&alice, &bob]);
    let channel = params.channel_id();
    let (ledger, adjudicator) = adjudicator_setup();

    let holder = adjudicator.holder();
    holder.deposit(channel, alice.identity(), 1000).await.unwrap();
    adjudicator
        .register(&signed_state(&params, 1, vec![500, 500], true, &[&alice, &bob]))
        .await
        .unwrap();

    let sub = EventSubscription::new(ledger.clone(), channel, &fast_poll());
    assert!(sub.next().await.expect("conclusion event").is_concluded());

    // The stream is over; continuing to poll is reported as misuse rather
    // than blocking forever.
    assert!(sub.next().await.is_none());
    assert!(matches!(
        sub.err().await,
        Some(AdjudicatorError::AlreadyConcluded(_))
    ));
}
