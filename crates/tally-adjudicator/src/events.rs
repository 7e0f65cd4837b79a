//! Channel lifecycle events yielded by subscriptions.
//!
//! A subscription turns the ledger's pull-only registration records into a
//! stream of these events so a channel controller can react to disputes and
//! conclusion without polling the ledger itself.

use chrono::{DateTime, Utc};

use tally_core::{ChannelId, State};

/// A channel lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// A state became the channel's authoritative on-ledger record, either
    /// the first registration or a refutation replacing a previous one.
    Registered {
        /// The channel the record belongs to.
        channel: ChannelId,
        /// Version of the registered state.
        version: u64,
        /// The registered state itself.
        state: State,
        /// End of the dispute window for this record.
        timeout: DateTime<Utc>,
    },

    /// The channel concluded: its recorded state went final or its dispute
    /// window closed. Emitted at most once per subscription.
    Concluded {
        /// The concluded channel.
        channel: ChannelId,
        /// Version of the concluding state.
        version: u64,
        /// The dispute deadline of the concluding record.
        timeout: DateTime<Utc>,
    },
}

impl ChannelEvent {
    /// The channel this event belongs to.
    pub fn channel(&self) -> ChannelId {
        match self {
            ChannelEvent::Registered { channel, .. } => *channel,
            ChannelEvent::Concluded { channel, .. } => *channel,
        }
    }

    /// The registered state version the event reflects.
    pub fn version(&self) -> u64 {
        match self {
            ChannelEvent::Registered { version, .. } => *version,
            ChannelEvent::Concluded { version, .. } => *version,
        }
    }

    /// Whether this is the terminal event of a subscription.
    pub fn is_concluded(&self) -> bool {
        matches!(self, ChannelEvent::Concluded { .. })
    }
}
