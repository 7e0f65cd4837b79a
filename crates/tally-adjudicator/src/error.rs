use chrono::{DateTime, Utc};

use tally_core::{ChannelId, CoreError};

use crate::ledger::LedgerError;

/// Adjudication and polling errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AdjudicatorError {
    #[error("invalid signed state: {0}")]
    Validation(String),

    #[error("channel underfunded for version {version}: required {required}, funded {funded}")]
    Underfunded {
        version: u64,
        required: u128,
        funded: u128,
    },

    #[error("wrong side of the challenge window: timeout {timeout}, now {now}")]
    ChallengeTimeout {
        timeout: DateTime<Utc>,
        now: DateTime<Utc>,
    },

    #[error("version too low: registered {registered}, tried {tried}")]
    Version { registered: u64, tried: u64 },

    #[error("unknown channel: {0}")]
    UnknownChannel(ChannelId),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("channel already concluded: {0}")]
    AlreadyConcluded(ChannelId),

    #[error("operation cancelled")]
    Cancelled,

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl AdjudicatorError {
    /// Whether this error belongs to the protocol taxonomy (validation,
    /// funding, windowing, versioning, conclusion) as opposed to cancellation
    /// or infrastructure failure.
    pub fn is_protocol(&self) -> bool {
        !matches!(
            self,
            AdjudicatorError::Cancelled | AdjudicatorError::Ledger(_)
        )
    }

    /// Classify an arbitrary error chain: walks the source chain looking for
    /// an `AdjudicatorError` and reports whether it is a protocol error.
    /// Returns false when no adjudicator error is found in the chain.
    pub fn is_protocol_error(err: &(dyn std::error::Error + 'static)) -> bool {
        let mut current: Option<&(dyn std::error::Error + 'static)> = Some(err);
        while let Some(e) = current {
            if let Some(adj) = e.downcast_ref::<AdjudicatorError>() {
                return adj.is_protocol();
            }
            current = e.source();
        }
        false
    }
}

impl From<CoreError> for AdjudicatorError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::AmountOverflow(msg) => AdjudicatorError::InvalidAmount(msg),
            other => AdjudicatorError::Validation(other.to_string()),
        }
    }
}
