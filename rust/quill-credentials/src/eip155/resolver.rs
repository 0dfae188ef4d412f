//! EIP-155 account resolver.

use super::{Eip155Account, error::Eip155ResolveError, recover_address, signing_statement};
use quill_varsig::{Did, Resolver, Verifier, eip191::Eip191Signature};

/// Resolves `did:pkh:eip155` strings to account verifiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct Eip155Resolver;

impl Resolver<Eip191Signature> for Eip155Resolver {
    type Error = Eip155ResolveError;
    type Verifier = Eip155Account;

    fn resolve(&self, did: &Did) -> Result<Eip155Account, Self::Error> {
        Ok(did.as_str().parse()?)
    }
}

/// Accounts sign the readable [`signing_statement`] of a payload, never the
/// payload bytes themselves.
impl Verifier<Eip191Signature> for Eip155Account {
    fn verify(&self, msg: &[u8], signature: &Eip191Signature) -> Result<(), signature::Error> {
        if recover_address(&signing_statement(msg), signature)? == self.address() {
            Ok(())
        } else {
            Err(signature::Error::new())
        }
    }
}
