use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;

/// Value in atomic units of the channel's single asset.
pub type Amount = u128;

/// Participant identity: 32 bytes of public key material.
///
/// Opaque to the core; the verifier implementation decides how to interpret
/// the bytes (the shipped one reads them as an Ed25519 public key).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Identity(pub [u8; 32]);

impl Identity {
    /// Get the raw bytes (32 bytes).
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Encode as hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Decode from hex string.
    pub fn from_hex(hex_str: &str) -> Result<Self, CoreError> {
        let bytes = hex::decode(hex_str)
            .map_err(|e| CoreError::InvalidIdentity(format!("invalid hex: {}", e)))?;
        let arr: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
            CoreError::InvalidIdentity(format!("identity must be 32 bytes, got {}", bytes.len()))
        })?;
        Ok(Self(arr))
    }
}

impl From<[u8; 32]> for Identity {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Unique channel identifier, derived from the channel parameters by hashing
/// their canonical encoding with BLAKE3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChannelId(pub [u8; 32]);

impl ChannelId {
    /// Get the raw bytes (32 bytes).
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Encode as hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Decode from hex string.
    pub fn from_hex(hex_str: &str) -> Result<Self, CoreError> {
        let bytes = hex::decode(hex_str)
            .map_err(|e| CoreError::InvalidIdentity(format!("invalid hex: {}", e)))?;
        let arr: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
            CoreError::InvalidIdentity(format!("channel id must be 32 bytes, got {}", bytes.len()))
        })?;
        Ok(Self(arr))
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Upper bound on `Params::challenge_duration_secs` (one hundred years).
/// Keeps deadline arithmetic (`now + challenge_window`) inside chrono's
/// representable range.
pub const MAX_CHALLENGE_DURATION_SECS: u64 = 100 * 365 * 24 * 60 * 60;

/// Fixed channel parameters, agreed before the channel opens.
///
/// Immutable for the channel's lifetime; the channel id is derived from them,
/// so any change produces a different channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params {
    /// Length of the dispute window in seconds.
    pub challenge_duration_secs: u64,
    /// Ordered participant identities. Balance and signature vectors follow
    /// this order.
    pub participants: Vec<Identity>,
    /// Random value making the channel id unique across otherwise identical
    /// channels.
    pub nonce: [u8; 32],
}

impl Params {
    /// Create parameters with a freshly random nonce from OS entropy.
    pub fn new(challenge_duration_secs: u64, participants: Vec<Identity>) -> Self {
        let mut nonce = [0u8; 32];
        OsRng.fill_bytes(&mut nonce);
        Self {
            challenge_duration_secs,
            participants,
            nonce,
        }
    }

    /// Check structural validity: at least two participants, challenge
    /// duration within bounds.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.participants.len() < 2 {
            return Err(CoreError::TooFewParticipants(self.participants.len()));
        }
        if self.challenge_duration_secs > MAX_CHALLENGE_DURATION_SECS {
            return Err(CoreError::ChallengeDurationTooLong(
                self.challenge_duration_secs,
            ));
        }
        Ok(())
    }

    /// Derive the channel id: BLAKE3 over the canonical parameter encoding.
    pub fn channel_id(&self) -> ChannelId {
        ChannelId(*blake3::hash(&self.encode()).as_bytes())
    }

    /// The dispute window as a chrono duration. The bound `validate`
    /// enforces keeps this conversion in range.
    pub fn challenge_window(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.challenge_duration_secs as i64)
    }

    /// Canonical encoding: challenge duration (u64 BE), participant count
    /// (u32 BE), each identity (32 raw bytes), nonce (32 raw bytes).
    fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(8 + 4 + self.participants.len() * 32 + 32);
        buf.extend_from_slice(&self.challenge_duration_secs.to_be_bytes());
        buf.extend_from_slice(&(self.participants.len() as u32).to_be_bytes());
        for participant in &self.participants {
            buf.extend_from_slice(participant.as_bytes());
        }
        buf.extend_from_slice(&self.nonce);
        buf
    }
}

/// A channel state: one point in the off-chain negotiation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    /// The channel this state belongs to.
    pub channel_id: ChannelId,
    /// Strictly increasing per off-chain update; version 0 is the funding
    /// state.
    pub version: u64,
    /// One balance per participant, in `Params::participants` order.
    pub balances: Vec<Amount>,
    /// Set when all participants agree the channel is finished.
    pub is_final: bool,
}

impl State {
    /// The version-0 state a channel is funded against.
    pub fn initial(channel_id: ChannelId, balances: Vec<Amount>) -> Self {
        Self {
            channel_id,
            version: 0,
            balances,
            is_final: false,
        }
    }

    /// Checked sum of all balances.
    pub fn total(&self) -> Result<Amount, CoreError> {
        self.balances.iter().try_fold(0u128, |acc, b| {
            acc.checked_add(*b)
                .ok_or_else(|| CoreError::AmountOverflow("allocation total exceeds u128".into()))
        })
    }

    /// Canonical encoding: channel id (32 raw bytes), version (u64 BE),
    /// balance count (u32 BE), each balance (u128 BE), finality flag (1 byte).
    fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(32 + 8 + 4 + self.balances.len() * 16 + 1);
        buf.extend_from_slice(self.channel_id.as_bytes());
        buf.extend_from_slice(&self.version.to_be_bytes());
        buf.extend_from_slice(&(self.balances.len() as u32).to_be_bytes());
        for balance in &self.balances {
            buf.extend_from_slice(&balance.to_be_bytes());
        }
        buf.push(self.is_final as u8);
        buf
    }
}

/// Compute the canonical signing payload for a (params, state) pair.
/// This produces a deterministic byte sequence for signature creation and
/// verification; both encodings are self-delimiting, so plain concatenation
/// is unambiguous.
pub fn signing_payload(params: &Params, state: &State) -> Vec<u8> {
    let mut payload = params.encode();
    payload.extend_from_slice(&state.encode());
    payload
}

/// A channel state carrying one signature per participant.
///
/// Each signature covers `signing_payload(params, state)` and is checked
/// against the participant identity at the same index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedState {
    /// The channel parameters the state was signed under.
    pub params: Params,
    /// The signed state itself.
    pub state: State,
    /// Raw signature bytes, one entry per participant, in participant order.
    pub sigs: Vec<Vec<u8>>,
}

impl SignedState {
    /// Structural validation: params are valid, the state belongs to the
    /// channel the params derive, and balance/signature counts line up with
    /// the participant count. Does not verify signatures.
    pub fn validate(&self) -> Result<(), CoreError> {
        self.params.validate()?;
        let derived = self.params.channel_id();
        if derived != self.state.channel_id {
            return Err(CoreError::ChannelIdMismatch {
                derived,
                carried: self.state.channel_id,
            });
        }
        let expected = self.params.participants.len();
        if self.state.balances.len() != expected {
            return Err(CoreError::BalanceCount {
                expected,
                got: self.state.balances.len(),
            });
        }
        if self.sigs.len() != expected {
            return Err(CoreError::SignatureCount {
                expected,
                got: self.sigs.len(),
            });
        }
        Ok(())
    }

    /// The payload every signature in `sigs` must cover.
    pub fn signing_payload(&self) -> Vec<u8> {
        signing_payload(&self.params, &self.state)
    }
}

/// The on-ledger dispute record for a channel: the currently authoritative
/// state plus the absolute deadline after which it can no longer be
/// superseded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    /// The registered state.
    pub state: State,
    /// End of the dispute window. Refutations arriving at or after this
    /// instant are rejected.
    pub timeout: DateTime<Utc>,
}

impl Registration {
    /// Whether the dispute window has closed as of `now`.
    pub fn is_elapsed_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.timeout
    }

    /// Whether the channel counts as concluded as of `now`: either the
    /// registered state is final or the dispute window has closed.
    pub fn is_concluded_at(&self, now: DateTime<Utc>) -> bool {
        self.state.is_final || self.is_elapsed_at(now)
    }
}
