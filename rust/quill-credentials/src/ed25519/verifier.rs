//! Ed25519 DID principal and verifier.

use super::{ED25519_KEY_SIZE, ED25519_PUB_MULTICODEC, error::Ed25519DidFromStrError};
use base58::FromBase58;
use quill_varsig::{Did, Principal, Verifier, eddsa::Ed25519Signature};
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;

/// An `Ed25519` `did:key`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ed25519Verifier(pub ed25519_dalek::VerifyingKey);

impl Ed25519Verifier {
    /// The raw public key bytes.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; ED25519_KEY_SIZE] {
        self.0.to_bytes()
    }
}

impl From<ed25519_dalek::VerifyingKey> for Ed25519Verifier {
    fn from(key: ed25519_dalek::VerifyingKey) -> Self {
        Ed25519Verifier(key)
    }
}

impl From<&ed25519_dalek::SigningKey> for Ed25519Verifier {
    fn from(key: &ed25519_dalek::SigningKey) -> Self {
        Ed25519Verifier(key.verifying_key())
    }
}

impl std::fmt::Display for Ed25519Verifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.did().as_str())
    }
}

impl FromStr for Ed25519Verifier {
    type Err = Ed25519DidFromStrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let encoded = s
            .strip_prefix("did:key:")
            .ok_or(Ed25519DidFromStrError::InvalidDidHeader)?
            .strip_prefix('z')
            .ok_or(Ed25519DidFromStrError::MissingBase58Prefix)?;
        let bytes = encoded
            .from_base58()
            .map_err(|_| Ed25519DidFromStrError::InvalidBase58)?;

        let Some(key) = bytes.strip_prefix(&ED25519_PUB_MULTICODEC[..]) else {
            return Err(Ed25519DidFromStrError::InvalidKey);
        };
        let key: [u8; ED25519_KEY_SIZE] = key
            .try_into()
            .map_err(|_| Ed25519DidFromStrError::InvalidKey)?;
        let key = ed25519_dalek::VerifyingKey::from_bytes(&key)
            .map_err(|_| Ed25519DidFromStrError::InvalidKey)?;
        Ok(Ed25519Verifier(key))
    }
}

impl Verifier<Ed25519Signature> for Ed25519Verifier {
    fn verify(&self, msg: &[u8], signature: &Ed25519Signature) -> Result<(), signature::Error> {
        let dalek_sig = ed25519_dalek::Signature::from(*signature);
        self.0.verify_strict(msg, &dalek_sig)
    }
}

impl Principal for Ed25519Verifier {
    fn did(&self) -> Did {
        let mut multicodec_key = Vec::with_capacity(ED25519_PUB_MULTICODEC.len() + ED25519_KEY_SIZE);
        multicodec_key.extend_from_slice(&ED25519_PUB_MULTICODEC);
        multicodec_key.extend_from_slice(self.0.as_bytes());
        Did::key(&multicodec_key)
    }
}

impl Serialize for Ed25519Verifier {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.did().as_str())
    }
}

impl<'de> Deserialize<'de> for Ed25519Verifier {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
