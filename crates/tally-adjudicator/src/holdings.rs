use std::sync::Arc;
use tokio::sync::Mutex;

use tally_core::{Amount, ChannelId, Identity};

use crate::error::AdjudicatorError;
use crate::ledger::{Ledger, LedgerError};

/// Custodial holdings bookkeeping for channel participants.
///
/// Thin layer over the ledger's holding records: absent records read as
/// zero, deposits accumulate, settlement overwrites, withdrawal zeroes. An
/// internal lock serializes deposits, withdrawals, and settlement
/// overwrites, so concurrent use through one holder never loses updates.
pub struct AssetHolder {
    ledger: Arc<dyn Ledger>,
    rmw: Mutex<()>,
}

impl AssetHolder {
    /// Create a holder over the given ledger.
    pub fn new(ledger: Arc<dyn Ledger>) -> Self {
        Self {
            ledger,
            rmw: Mutex::new(()),
        }
    }

    /// Current holding for one participant; absent reads as zero.
    pub async fn holding(
        &self,
        channel: ChannelId,
        participant: Identity,
    ) -> Result<Amount, AdjudicatorError> {
        match self.ledger.holding(channel, participant).await {
            Ok(amount) => Ok(amount),
            Err(LedgerError::NotFound { .. }) => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    /// Checked sum of holdings over the given participants.
    pub async fn total_holding(
        &self,
        channel: ChannelId,
        participants: &[Identity],
    ) -> Result<Amount, AdjudicatorError> {
        let mut total: Amount = 0;
        for participant in participants {
            let held = self.holding(channel, *participant).await?;
            total = total.checked_add(held).ok_or_else(|| {
                AdjudicatorError::InvalidAmount("total holding exceeds u128".into())
            })?;
        }
        Ok(total)
    }

    /// Add to a participant's holding.
    pub async fn deposit(
        &self,
        channel: ChannelId,
        participant: Identity,
        amount: Amount,
    ) -> Result<(), AdjudicatorError> {
        let _guard = self.rmw.lock().await;
        let current = self.holding(channel, participant).await?;
        let updated = current.checked_add(amount).ok_or_else(|| {
            AdjudicatorError::InvalidAmount(format!(
                "deposit overflows holding: {} + {}",
                current, amount
            ))
        })?;
        self.ledger.put_holding(channel, participant, updated).await?;
        tracing::info!(
            channel = %channel,
            participant = %participant,
            amount,
            total = updated,
            "Deposit recorded"
        );
        Ok(())
    }

    /// Unconditionally overwrite a participant's holding. Used by settlement
    /// to reassign custody according to a registered state.
    pub async fn set_holding(
        &self,
        channel: ChannelId,
        participant: Identity,
        amount: Amount,
    ) -> Result<(), AdjudicatorError> {
        let _guard = self.rmw.lock().await;
        self.ledger.put_holding(channel, participant, amount).await?;
        tracing::debug!(channel = %channel, participant = %participant, amount, "Holding set");
        Ok(())
    }

    /// Zero a participant's holding and return what was held. A second
    /// withdrawal reads zero and succeeds with zero.
    pub async fn withdraw(
        &self,
        channel: ChannelId,
        participant: Identity,
    ) -> Result<Amount, AdjudicatorError> {
        let _guard = self.rmw.lock().await;
        let current = self.holding(channel, participant).await?;
        self.ledger.put_holding(channel, participant, 0).await?;
        tracing::info!(
            channel = %channel,
            participant = %participant,
            amount = current,
            "Holding withdrawn"
        );
        Ok(current)
    }
}
