pub mod error;
pub mod keys;
pub mod signing;

pub use error::CryptoError;
pub use keys::{KeyPair, PublicKey};
pub use signing::{sign, sign_state, verify, verify_state, Ed25519Verifier, Signature};
