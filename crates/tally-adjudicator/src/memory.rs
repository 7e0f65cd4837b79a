use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use tally_core::{Amount, ChannelId, Identity, Registration};

use crate::ledger::{Ledger, LedgerError};

/// In-memory ledger backend over concurrent maps.
///
/// Backs tests and single-process deployments. The clock is the local wall
/// clock plus an adjustable offset, so challenge-window behavior can be
/// exercised without real waiting.
pub struct MemoryLedger {
    registrations: DashMap<ChannelId, Registration>,
    holdings: DashMap<(ChannelId, Identity), Amount>,
    clock_offset_ms: AtomicI64,
}

impl MemoryLedger {
    /// Create an empty ledger whose clock matches the wall clock.
    pub fn new() -> Self {
        Self {
            registrations: DashMap::new(),
            holdings: DashMap::new(),
            clock_offset_ms: AtomicI64::new(0),
        }
    }

    /// Shift the ledger clock by the given duration. Positive values move
    /// the clock into the future.
    pub fn advance_clock(&self, delta: Duration) {
        self.clock_offset_ms
            .fetch_add(delta.num_milliseconds(), Ordering::SeqCst);
        tracing::debug!(offset_ms = delta.num_milliseconds(), "Ledger clock advanced");
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn registration(&self, channel: ChannelId) -> Result<Registration, LedgerError> {
        self.registrations
            .get(&channel)
            .map(|r| r.value().clone())
            .ok_or_else(|| LedgerError::registration_not_found(channel))
    }

    async fn put_registration(
        &self,
        channel: ChannelId,
        registration: Registration,
    ) -> Result<(), LedgerError> {
        self.registrations.insert(channel, registration);
        Ok(())
    }

    async fn holding(
        &self,
        channel: ChannelId,
        participant: Identity,
    ) -> Result<Amount, LedgerError> {
        self.holdings
            .get(&(channel, participant))
            .map(|a| *a)
            .ok_or_else(|| LedgerError::holding_not_found(channel, participant))
    }

    async fn put_holding(
        &self,
        channel: ChannelId,
        participant: Identity,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        self.holdings.insert((channel, participant), amount);
        Ok(())
    }

    fn now(&self) -> DateTime<Utc> {
        Utc::now() + Duration::milliseconds(self.clock_offset_ms.load(Ordering::SeqCst))
    }
}
