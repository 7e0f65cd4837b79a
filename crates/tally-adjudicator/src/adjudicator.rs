use std::sync::Arc;

use tally_core::{Amount, ChannelId, Identity, Registration, SignedState, Verifier};

use crate::error::AdjudicatorError;
use crate::holdings::AssetHolder;
use crate::ledger::{Ledger, LedgerError};

/// Decides which channel state is authoritative and when funds move.
///
/// `register` accepts mutually signed states, enforces funding and the
/// challenge window, and reassigns custodial holdings on settlement.
/// `withdraw` releases a participant's settled share once the channel has
/// concluded. All rejections leave the ledger untouched.
pub struct Adjudicator {
    ledger: Arc<dyn Ledger>,
    holder: Arc<AssetHolder>,
    verifier: Arc<dyn Verifier>,
}

impl Adjudicator {
    /// Create an adjudicator over a ledger, verifying signatures with the
    /// given verifier.
    pub fn new(ledger: Arc<dyn Ledger>, verifier: Arc<dyn Verifier>) -> Self {
        let holder = Arc::new(AssetHolder::new(ledger.clone()));
        Self {
            ledger,
            holder,
            verifier,
        }
    }

    /// The holdings layer this adjudicator settles against. Funding
    /// coordinators and direct deposits go through the same instance so all
    /// read-modify-write sections share one lock.
    pub fn holder(&self) -> Arc<AssetHolder> {
        self.holder.clone()
    }

    /// Register a signed state as the channel's authoritative record.
    ///
    /// Outcome by case:
    /// - structural or signature failure: `Validation`, nothing written.
    /// - underfunded at version > 0: `Underfunded`, nothing written.
    /// - underfunded at version 0: accepted without settlement, so
    ///   participants can recover deposits from a channel that never fully
    ///   funded.
    /// - existing record whose window already closed: `ChallengeTimeout`.
    /// - version lower than the existing record's: `Version`. Re-registering
    ///   the same version is an accepted idempotent refresh.
    /// - otherwise: holdings are settled to the state's balances (when fully
    ///   funded) and the record is stored with a fresh `now + challenge
    ///   duration` deadline.
    pub async fn register(&self, signed: &SignedState) -> Result<(), AdjudicatorError> {
        signed
            .validate()
            .map_err(|e| AdjudicatorError::Validation(e.to_string()))?;
        self.verify_signatures(signed)?;

        let channel = signed.state.channel_id;
        let required = signed.state.total()?;
        let funded = self
            .holder
            .total_holding(channel, &signed.params.participants)
            .await?;

        let underfunded = funded < required;
        if underfunded && signed.state.version != 0 {
            tracing::debug!(
                channel = %channel,
                version = signed.state.version,
                required,
                funded,
                "Registration rejected: underfunded"
            );
            return Err(AdjudicatorError::Underfunded {
                version: signed.state.version,
                required,
                funded,
            });
        }

        let now = self.ledger.now();
        match self.ledger.registration(channel).await {
            Ok(existing) => {
                if existing.is_elapsed_at(now) {
                    return Err(AdjudicatorError::ChallengeTimeout {
                        timeout: existing.timeout,
                        now,
                    });
                }
                if signed.state.version < existing.state.version {
                    return Err(AdjudicatorError::Version {
                        registered: existing.state.version,
                        tried: signed.state.version,
                    });
                }
            }
            Err(LedgerError::NotFound { .. }) => {}
            Err(e) => return Err(e.into()),
        }

        if !underfunded {
            for (participant, balance) in signed
                .params
                .participants
                .iter()
                .zip(&signed.state.balances)
            {
                self.holder
                    .set_holding(channel, *participant, *balance)
                    .await?;
            }
        }

        let timeout = now + signed.params.challenge_window();
        self.ledger
            .put_registration(
                channel,
                Registration {
                    state: signed.state.clone(),
                    timeout,
                },
            )
            .await?;

        tracing::info!(
            channel = %channel,
            version = signed.state.version,
            is_final = signed.state.is_final,
            funded,
            required,
            settled = !underfunded,
            %timeout,
            "State registered"
        );
        Ok(())
    }

    /// Release a participant's holding once the channel has concluded, which
    /// means its recorded state is final or its dispute window has closed.
    /// Returns the amount paid out; a repeated withdrawal pays zero.
    pub async fn withdraw(
        &self,
        channel: ChannelId,
        participant: Identity,
    ) -> Result<Amount, AdjudicatorError> {
        let registration = self.registration(channel).await?;
        let now = self.ledger.now();
        if !registration.is_concluded_at(now) {
            return Err(AdjudicatorError::ChallengeTimeout {
                timeout: registration.timeout,
                now,
            });
        }
        let amount = self.holder.withdraw(channel, participant).await?;
        tracing::info!(channel = %channel, participant = %participant, amount, "Withdrawal paid");
        Ok(amount)
    }

    /// The current dispute record for a channel.
    pub async fn registration(&self, channel: ChannelId) -> Result<Registration, AdjudicatorError> {
        match self.ledger.registration(channel).await {
            Ok(registration) => Ok(registration),
            Err(LedgerError::NotFound { .. }) => Err(AdjudicatorError::UnknownChannel(channel)),
            Err(e) => Err(e.into()),
        }
    }

    /// One participant's current custodial holding.
    pub async fn holding(
        &self,
        channel: ChannelId,
        participant: Identity,
    ) -> Result<Amount, AdjudicatorError> {
        self.holder.holding(channel, participant).await
    }

    /// Combined holding of the given participants.
    pub async fn total_holding(
        &self,
        channel: ChannelId,
        participants: &[Identity],
    ) -> Result<Amount, AdjudicatorError> {
        self.holder.total_holding(channel, participants).await
    }

    fn verify_signatures(&self, signed: &SignedState) -> Result<(), AdjudicatorError> {
        let payload = signed.signing_payload();
        for (index, (participant, sig)) in signed
            .params
            .participants
            .iter()
            .zip(&signed.sigs)
            .enumerate()
        {
            let ok = self
                .verifier
                .verify(participant, &payload, sig)
                .map_err(|e| AdjudicatorError::Validation(e.to_string()))?;
            if !ok {
                return Err(AdjudicatorError::Validation(format!(
                    "signature {} does not verify for participant {}",
                    index, participant
                )));
            }
        }
        Ok(())
    }
}
