//! Ed25519 DID key resolver.

use super::{error::Ed25519ResolveError, verifier::Ed25519Verifier};
use quill_varsig::{Did, Resolver, eddsa::Ed25519Signature};

/// Resolves `did:key` strings to Ed25519 verifiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519KeyResolver;

impl Resolver<Ed25519Signature> for Ed25519KeyResolver {
    type Error = Ed25519ResolveError;
    type Verifier = Ed25519Verifier;

    fn resolve(&self, did: &Did) -> Result<Ed25519Verifier, Self::Error> {
        Ok(did.as_str().parse()?)
    }
}
