//! Signature verification trait.

use super::Signature;

/// Verifies that a cryptographic signature is valid for a given payload.
///
/// Verification is a pure function of the public key material, the payload
/// and the signature, so unlike [`Signer`](super::Signer) it is synchronous.
///
/// Generic over `S: Signature` so a single type (e.g. a DID key)
/// can verify multiple signature algorithms.
pub trait Verifier<S: Signature> {
    /// Verify that `signature` is valid for `payload`.
    ///
    /// # Errors
    ///
    /// Returns [`signature::Error`] if the signature does not verify.
    fn verify(&self, payload: &[u8], signature: &S) -> Result<(), signature::Error>;
}
