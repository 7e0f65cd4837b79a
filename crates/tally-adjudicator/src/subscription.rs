//! Polling event subscription over a channel's dispute record.
//!
//! Turns the ledger's pull-only registration records into a stream of
//! [`ChannelEvent`]s: `Registered` whenever a different state becomes the
//! recorded one, then a single `Concluded` when the record goes final or its
//! dispute window closes. A record that is already concluded when first
//! observed yields only `Concluded`. After `Concluded` the stream is
//! exhausted.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};

use tally_core::{ChannelId, State};

use crate::config::PollConfig;
use crate::error::AdjudicatorError;
use crate::events::ChannelEvent;
use crate::ledger::{Ledger, LedgerError};
use crate::timeout::Timeout;

/// What one poll of the ledger produced.
enum Tick {
    /// An event to hand to the consumer.
    Event(ChannelEvent),
    /// Nothing new; poll again after the interval.
    Idle,
    /// The stream is over.
    Done,
}

/// Mutable subscription state. The ledger read and the decision on it happen
/// under one lock, so concurrent `next` callers observe each event exactly
/// once and never out of ledger order.
struct SubState {
    /// Last state handed out as a `Registered` event.
    emitted: Option<State>,
    /// Set when `Concluded` has been emitted.
    concluded: bool,
    /// Terminal error, if the stream ended abnormally.
    err: Option<AdjudicatorError>,
}

/// A polling subscription to one channel's lifecycle events.
///
/// `next` blocks until an event is available, the subscription is closed, or
/// the stream ends. `close` is safe to call from another task and unblocks
/// any pending `next`. After the stream ends, `err` tells a clean end apart
/// from an abnormal one.
pub struct EventSubscription {
    ledger: Arc<dyn Ledger>,
    channel: ChannelId,
    poll_interval: Duration,
    timeout_granularity: Duration,
    closed: AtomicBool,
    close_tx: watch::Sender<bool>,
    close_rx: watch::Receiver<bool>,
    sub: Mutex<SubState>,
}

impl EventSubscription {
    /// Subscribe to a channel's lifecycle events on the given ledger.
    pub fn new(ledger: Arc<dyn Ledger>, channel: ChannelId, config: &PollConfig) -> Self {
        let (close_tx, close_rx) = watch::channel(false);
        Self {
            ledger,
            channel,
            poll_interval: config.poll_interval(),
            timeout_granularity: config.timeout_granularity(),
            closed: AtomicBool::new(false),
            close_tx,
            close_rx,
            sub: Mutex::new(SubState {
                emitted: None,
                concluded: false,
                err: None,
            }),
        }
    }

    /// The next lifecycle event, or `None` once the stream is over. Blocks
    /// while the channel has nothing new, polling the ledger at the
    /// configured interval; `close` unblocks it.
    pub async fn next(&self) -> Option<ChannelEvent> {
        let mut close_rx = self.close_rx.clone();
        loop {
            match self.tick().await {
                Tick::Event(event) => return Some(event),
                Tick::Done => return None,
                Tick::Idle => {}
            }
            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                _ = close_rx.changed() => {}
            }
        }
    }

    /// End the subscription. Idempotent, and callable while another task is
    /// blocked in `next`; that call returns `None` promptly.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            tracing::debug!(channel = %self.channel, "Subscription closed");
            let _ = self.close_tx.send(true);
        }
    }

    /// Whether `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// The error that ended the stream, if any. `None` after a clean close
    /// or while the stream is still live.
    pub async fn err(&self) -> Option<AdjudicatorError> {
        self.sub.lock().await.err.clone()
    }

    async fn tick(&self) -> Tick {
        if self.is_closed() {
            return Tick::Done;
        }
        // Read and decide under one lock so concurrent pollers see the
        // ledger's records in order. close() takes no lock and can still
        // fire mid-tick.
        let mut sub = self.sub.lock().await;
        if self.is_closed() {
            return Tick::Done;
        }
        if sub.err.is_some() {
            return Tick::Done;
        }
        if sub.concluded {
            // Polling past the terminal event is a consumer bug; surface it
            // instead of spinning forever.
            sub.err = Some(AdjudicatorError::AlreadyConcluded(self.channel));
            return Tick::Done;
        }

        let registration = match self.ledger.registration(self.channel).await {
            Ok(registration) => registration,
            Err(e @ LedgerError::NotFound { .. }) => {
                if sub.emitted.is_none() {
                    // Not registered yet; keep watching.
                    return Tick::Idle;
                }
                // A record we already emitted cannot vanish.
                sub.err = Some(AdjudicatorError::Ledger(e));
                return Tick::Done;
            }
            Err(e) => {
                sub.err = Some(AdjudicatorError::Ledger(e));
                return Tick::Done;
            }
        };

        // Conclusion outranks a value change.
        let concluded = registration.state.is_final
            || Timeout::new(registration.timeout, self.timeout_granularity).is_elapsed();
        if concluded {
            sub.concluded = true;
            tracing::debug!(
                channel = %self.channel,
                version = registration.state.version,
                "Conclusion observed"
            );
            return Tick::Event(ChannelEvent::Concluded {
                channel: self.channel,
                version: registration.state.version,
                timeout: registration.timeout,
            });
        }

        if sub.emitted.as_ref() != Some(&registration.state) {
            sub.emitted = Some(registration.state.clone());
            tracing::debug!(
                channel = %self.channel,
                version = registration.state.version,
                "Registration observed"
            );
            return Tick::Event(ChannelEvent::Registered {
                channel: self.channel,
                version: registration.state.version,
                state: registration.state,
                timeout: registration.timeout,
            });
        }
        Tick::Idle
    }
}
