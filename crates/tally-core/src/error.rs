use crate::types::ChannelId;

/// Core channel-type errors.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("channel must have at least two participants, got {0}")]
    TooFewParticipants(usize),

    #[error("challenge duration too long: {0} seconds")]
    ChallengeDurationTooLong(u64),

    #[error("balance count {got} does not match participant count {expected}")]
    BalanceCount { expected: usize, got: usize },

    #[error("signature count {got} does not match participant count {expected}")]
    SignatureCount { expected: usize, got: usize },

    #[error("channel id mismatch: params derive {derived}, state carries {carried}")]
    ChannelIdMismatch {
        derived: ChannelId,
        carried: ChannelId,
    },

    #[error("amount overflow: {0}")]
    AmountOverflow(String),

    #[error("invalid identity: {0}")]
    InvalidIdentity(String),
}
