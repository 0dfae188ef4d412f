//! Signature creation trait.

use std::future::Future;

use super::Signature;
use quill_common::ConditionalSend;

/// Produces a cryptographic signature over a payload.
///
/// Signing is asynchronous because the key may live outside of the process
/// (a browser key store, a hardware token, a wallet behind an RPC bridge).
pub trait Signer<S: Signature> {
    /// Sign `payload` and return the signature.
    fn sign(
        &self,
        payload: &[u8],
    ) -> impl Future<Output = Result<S, signature::Error>> + ConditionalSend;
}
