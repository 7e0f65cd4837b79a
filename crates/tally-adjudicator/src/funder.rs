use std::sync::Arc;
use std::time::Duration;

use tally_core::{Params, State};

use crate::cancel::CancelToken;
use crate::config::PollConfig;
use crate::error::AdjudicatorError;
use crate::holdings::AssetHolder;

/// One participant's request to fund a channel up to an agreed state.
#[derive(Debug, Clone)]
pub struct FundingRequest {
    /// The channel's fixed parameters.
    pub params: Params,
    /// The state whose balances define each participant's share.
    pub state: State,
    /// The caller's position in `params.participants`.
    pub index: usize,
}

impl FundingRequest {
    pub fn new(params: Params, state: State, index: usize) -> Self {
        Self {
            params,
            state,
            index,
        }
    }

    fn validate(&self) -> Result<(), AdjudicatorError> {
        self.params
            .validate()
            .map_err(|e| AdjudicatorError::Validation(e.to_string()))?;
        if self.state.channel_id != self.params.channel_id() {
            return Err(AdjudicatorError::Validation(format!(
                "state belongs to channel {}, request is for {}",
                self.state.channel_id,
                self.params.channel_id()
            )));
        }
        if self.state.balances.len() != self.params.participants.len() {
            return Err(AdjudicatorError::Validation(format!(
                "state carries {} balances for {} participants",
                self.state.balances.len(),
                self.params.participants.len()
            )));
        }
        if self.index >= self.params.participants.len() {
            return Err(AdjudicatorError::Validation(format!(
                "funder index {} out of range for {} participants",
                self.index,
                self.params.participants.len()
            )));
        }
        Ok(())
    }
}

/// Deposits a participant's share and waits for the channel to fill up.
///
/// `fund` deposits the caller's balance from the request's state, then polls
/// the combined holdings until they cover the state's total. Cancellation
/// aborts the wait but leaves any deposit already made in place; recovering
/// it goes through a version-zero registration and withdrawal. A token that
/// was cancelled before the call deposits nothing.
pub struct Funder {
    holder: Arc<AssetHolder>,
    poll_interval: Duration,
}

impl Funder {
    pub fn new(holder: Arc<AssetHolder>, config: &PollConfig) -> Self {
        Self {
            holder,
            poll_interval: config.funding_poll_interval(),
        }
    }

    /// Fund the caller's share and block until the channel is fully funded
    /// or the token fires.
    pub async fn fund(
        &self,
        request: &FundingRequest,
        cancel: &CancelToken,
    ) -> Result<(), AdjudicatorError> {
        request.validate()?;
        if cancel.is_cancelled() {
            return Err(AdjudicatorError::Cancelled);
        }

        let channel = request.state.channel_id;
        let required = request.state.total()?;
        let share = request.state.balances[request.index];
        let participant = request.params.participants[request.index];
        if share > 0 {
            self.holder.deposit(channel, participant, share).await?;
        }
        tracing::info!(
            channel = %channel,
            participant = %participant,
            share,
            required,
            "Funding started"
        );

        loop {
            let funded = self
                .holder
                .total_holding(channel, &request.params.participants)
                .await?;
            if funded >= required {
                tracing::info!(channel = %channel, funded, "Funding complete");
                return Ok(());
            }
            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                _ = cancel.cancelled() => {
                    tracing::debug!(channel = %channel, funded, required, "Funding cancelled");
                    return Err(AdjudicatorError::Cancelled);
                }
            }
        }
    }
}
