use async_trait::async_trait;
use chrono::{DateTime, Utc};

use tally_core::{Amount, ChannelId, Identity, Registration};

/// Ledger access failures.
///
/// `NotFound` is a normal outcome for records that were never written;
/// callers decide whether absence means "zero", "nothing registered yet", or
/// a genuine fault. `Backend` covers everything else.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LedgerError {
    #[error("{kind} not found: {key}")]
    NotFound { kind: &'static str, key: String },

    #[error("ledger backend error: {0}")]
    Backend(String),
}

impl LedgerError {
    /// A missing dispute record for the given channel.
    pub fn registration_not_found(channel: ChannelId) -> Self {
        Self::NotFound {
            kind: "registration",
            key: channel.to_hex(),
        }
    }

    /// A missing holding record for the given channel and participant.
    pub fn holding_not_found(channel: ChannelId, participant: Identity) -> Self {
        Self::NotFound {
            kind: "holding",
            key: format!("{}/{}", channel.to_hex(), participant.to_hex()),
        }
    }
}

/// Storage and clock capability the adjudication core runs against.
///
/// Registrations are keyed by channel, holdings by (channel, participant).
/// Each operation must apply atomically; backends shared across processes
/// must additionally serialize a get-then-put pair on one key so that
/// read-modify-write sequences do not interleave (in-process sharing is
/// already serialized by the holdings layer).
///
/// Challenge windows are judged against `now()`, the ledger's notion of
/// current time, not the caller's.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Fetch the dispute record for a channel.
    async fn registration(&self, channel: ChannelId) -> Result<Registration, LedgerError>;

    /// Store or replace the dispute record for a channel.
    async fn put_registration(
        &self,
        channel: ChannelId,
        registration: Registration,
    ) -> Result<(), LedgerError>;

    /// Fetch one participant's custodial holding.
    async fn holding(&self, channel: ChannelId, participant: Identity)
        -> Result<Amount, LedgerError>;

    /// Store one participant's custodial holding.
    async fn put_holding(
        &self,
        channel: ChannelId,
        participant: Identity,
        amount: Amount,
    ) -> Result<(), LedgerError>;

    /// The ledger's current time.
    fn now(&self) -> DateTime<Utc>;
}
