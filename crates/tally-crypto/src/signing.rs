use ed25519_dalek::Signer;
use ed25519_dalek::Verifier as _;
use ed25519_dalek::VerifyingKey;

use tally_core::{signing_payload, CoreError, Identity, Params, State, Verifier};

use crate::error::CryptoError;
use crate::keys::{KeyPair, PublicKey};

/// Ed25519 signature (64 bytes).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    inner: ed25519_dalek::Signature,
}

impl Signature {
    /// Get the raw bytes (64 bytes).
    pub fn to_bytes(&self) -> [u8; 64] {
        self.inner.to_bytes()
    }

    /// Create from raw bytes (64 bytes).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != 64 {
            return Err(CryptoError::InvalidInput(format!(
                "signature must be 64 bytes, got {}",
                bytes.len()
            )));
        }
        let bytes_arr: [u8; 64] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidInput("invalid signature length".into()))?;
        let inner = ed25519_dalek::Signature::from_bytes(&bytes_arr);
        Ok(Self { inner })
    }

    /// Encode as hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }
}

/// Sign a message using Ed25519.
pub fn sign(message: &[u8], keypair: &KeyPair) -> Signature {
    let sig = keypair.signing_key().sign(message);
    Signature { inner: sig }
}

/// Verify an Ed25519 signature.
pub fn verify(message: &[u8], signature: &Signature, pubkey: &PublicKey) -> Result<(), CryptoError> {
    pubkey
        .verifying_key()
        .verify(message, &signature.inner)
        .map_err(|_| CryptoError::SignatureVerificationFailed)
}

/// Sign the canonical payload of a channel state under its parameters.
pub fn sign_state(params: &Params, state: &State, keypair: &KeyPair) -> Signature {
    let payload = signing_payload(params, state);
    sign(&payload, keypair)
}

/// Verify one participant's signature over a channel state.
pub fn verify_state(
    params: &Params,
    state: &State,
    signature: &Signature,
    pubkey: &PublicKey,
) -> Result<(), CryptoError> {
    let payload = signing_payload(params, state);
    verify(&payload, signature, pubkey)
}

/// Ed25519 implementation of the adjudicator's verification seam.
///
/// Interprets identity bytes as a compressed Ed25519 public key. A signature
/// of the wrong length or one that fails verification yields `Ok(false)`;
/// identity bytes that are not a valid curve point yield an error, since
/// identities come from channel parameters and should always be well formed.
#[derive(Debug, Default, Clone, Copy)]
pub struct Ed25519Verifier;

impl Verifier for Ed25519Verifier {
    fn verify(&self, identity: &Identity, payload: &[u8], sig: &[u8]) -> Result<bool, CoreError> {
        let key = VerifyingKey::from_bytes(identity.as_bytes()).map_err(|e| {
            CoreError::InvalidIdentity(format!("not an Ed25519 public key: {}", e))
        })?;
        let sig_arr: [u8; 64] = match sig.try_into() {
            Ok(arr) => arr,
            Err(_) => return Ok(false),
        };
        let signature = ed25519_dalek::Signature::from_bytes(&sig_arr);
        Ok(key.verify(payload, &signature).is_ok())
    }
}
