//! Signature trait and signing/verification re-exports.

pub mod signer;
pub mod verifier;

use super::SignatureAlgorithm;
use ::signature::SignatureEncoding;
use quill_common::{ConditionalSend, ConditionalSync};
use std::fmt::Debug;

pub use signer::Signer;
pub use verifier::Verifier;

/// Cryptographic signature produced by `Signer` and verified by `Verifier`.
pub trait Signature: SignatureEncoding + Debug + ConditionalSend + ConditionalSync {
    /// The signature algorithm that produces this signature type.
    type Algorithm: SignatureAlgorithm + ConditionalSend + ConditionalSync;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CanonicalPayload, algorithm::eddsa::Ed25519Signature};
    use testresult::TestResult;

    /// An in-memory key that signs and verifies with the same seed.
    struct SeededKey(ed25519_dalek::SigningKey);

    impl Signer<Ed25519Signature> for SeededKey {
        async fn sign(&self, payload: &[u8]) -> Result<Ed25519Signature, ::signature::Error> {
            use ::signature::Signer as _;
            Ok(self.0.try_sign(payload)?.into())
        }
    }

    impl Verifier<Ed25519Signature> for SeededKey {
        fn verify(&self, payload: &[u8], signature: &Ed25519Signature) -> Result<(), ::signature::Error> {
            self.0
                .verifying_key()
                .verify_strict(payload, &ed25519_dalek::Signature::from(*signature))
                .map_err(|_| ::signature::Error::new())
        }
    }

    #[tokio::test]
    async fn signatures_cover_the_whole_canonical_payload() -> TestResult {
        let key = SeededKey(ed25519_dalek::SigningKey::from_bytes(&[42u8; 32]));
        let signed = CanonicalPayload::new("test").with("n", 1u64).to_bytes()?;
        let altered = CanonicalPayload::new("test").with("n", 2u64).to_bytes()?;

        let signature = key.sign(&signed).await?;
        key.verify(&signed, &signature)?;
        assert!(key.verify(&altered, &signature).is_err());
        Ok(())
    }
}
