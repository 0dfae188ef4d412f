//! DID-to-verifier resolution.

use crate::{
    did::Did,
    signature::{Signature, Verifier},
};

/// Resolves a DID to a [`Verifier`] for signature type `S`.
///
/// Given a DID string, derives the public key material needed to verify
/// signatures. The DID methods quill works with (`did:key`, `did:pkh`) are
/// self-certifying, so resolution is a pure, synchronous computation.
pub trait Resolver<S: Signature> {
    /// Error type for resolution failures.
    type Error: std::error::Error;

    /// The verifier produced for a resolved DID.
    type Verifier: Verifier<S>;

    /// Resolve a DID to a verifier for signature type `S`.
    ///
    /// # Errors
    ///
    /// Returns `Self::Error` if the DID is not understood by this resolver.
    fn resolve(&self, did: &Did) -> Result<Self::Verifier, Self::Error>;

    /// Resolve `did` and verify `signature` over `payload` in one step.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveAndVerifyError::Resolution`] when the DID cannot be
    /// resolved and [`ResolveAndVerifyError::Verification`] when the
    /// signature does not verify.
    fn verify(
        &self,
        did: &Did,
        payload: &[u8],
        signature: &S,
    ) -> Result<(), ResolveAndVerifyError<Self::Error>> {
        let verifier = self
            .resolve(did)
            .map_err(ResolveAndVerifyError::Resolution)?;
        verifier
            .verify(payload, signature)
            .map_err(ResolveAndVerifyError::Verification)
    }
}

/// Failure of [`Resolver::verify`].
#[derive(Debug, thiserror::Error)]
pub enum ResolveAndVerifyError<E: std::error::Error> {
    /// The DID could not be resolved to key material.
    #[error("unable to resolve DID: {0}")]
    Resolution(E),

    /// The signature did not verify against the resolved key.
    #[error("signature verification failed: {0}")]
    Verification(signature::Error),
}
