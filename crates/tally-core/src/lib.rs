pub mod error;
pub mod types;
pub mod verifier;

pub use error::CoreError;
pub use types::{
    signing_payload, Amount, ChannelId, Identity, Params, Registration, SignedState, State,
    MAX_CHALLENGE_DURATION_SECS,
};
pub use verifier::Verifier;
