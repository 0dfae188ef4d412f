//! Ed25519 signer implementation.

use super::{ED25519_KEY_SIZE, error::Ed25519KeyError, verifier::Ed25519Verifier};
use crate::key::KeyExport;
use quill_varsig::{Did, Principal, Signer, eddsa::Ed25519Signature};
use serde::Serialize;

/// An `Ed25519` `did:key` signer.
///
/// The identifier is derived from the public key once, at construction, and
/// never changes for the lifetime of the signer.
#[derive(Debug, Clone)]
pub struct Ed25519Signer {
    did: Ed25519Verifier,
    signer: ed25519_dalek::SigningKey,
}

impl From<ed25519_dalek::SigningKey> for Ed25519Signer {
    fn from(signer: ed25519_dalek::SigningKey) -> Self {
        let did = Ed25519Verifier::from(&signer);
        Self { did, signer }
    }
}

impl Ed25519Signer {
    /// Generate a new Ed25519 keypair with random bytes from `getrandom`.
    ///
    /// # Errors
    ///
    /// Returns an error if the RNG fails.
    pub fn generate() -> Result<Self, Ed25519KeyError> {
        let mut seed = [0u8; ED25519_KEY_SIZE];
        getrandom::getrandom(&mut seed)?;
        Ok(ed25519_dalek::SigningKey::from_bytes(&seed).into())
    }

    /// Import a keypair from a [`KeyExport`].
    ///
    /// Accepts anything that converts `Into<KeyExport>`, including `&[u8; 32]`.
    ///
    /// # Errors
    ///
    /// Returns an error if the seed has the wrong length.
    pub fn import(key: impl Into<KeyExport>) -> Result<Self, Ed25519KeyError> {
        let export = key.into();
        let seed: [u8; ED25519_KEY_SIZE] = export
            .as_bytes()
            .try_into()
            .map_err(|_| Ed25519KeyError::InvalidSeedLength(export.as_bytes().len()))?;
        Ok(ed25519_dalek::SigningKey::from_bytes(&seed).into())
    }

    /// Export the seed.
    #[must_use]
    pub fn export(&self) -> KeyExport {
        KeyExport::from(&self.signer.to_bytes())
    }

    /// Get the associated Ed25519 DID (verifier).
    #[must_use]
    pub const fn ed25519_did(&self) -> &Ed25519Verifier {
        &self.did
    }
}

impl std::fmt::Display for Ed25519Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.did)
    }
}

impl Signer<Ed25519Signature> for Ed25519Signer {
    async fn sign(&self, msg: &[u8]) -> Result<Ed25519Signature, signature::Error> {
        use signature::Signer as _;
        Ok(self.signer.try_sign(msg)?.into())
    }
}

impl Principal for Ed25519Signer {
    fn did(&self) -> Did {
        self.did.did()
    }
}

impl Serialize for Ed25519Signer {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.did.serialize(serializer)
    }
}
