use crate::error::CoreError;
use crate::types::Identity;

/// Signature verification capability consumed by the adjudicator.
///
/// Implementations decide the signature scheme and how identity bytes map to
/// verification keys. `Ok(false)` means the signature does not cover the
/// payload for that identity; `Err` is reserved for malformed identities and
/// backend faults.
pub trait Verifier: Send + Sync {
    /// Check `sig` against `payload` for the given participant identity.
    fn verify(&self, identity: &Identity, payload: &[u8], sig: &[u8]) -> Result<bool, CoreError>;
}
