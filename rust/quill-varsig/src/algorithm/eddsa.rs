//! EdDSA over Curve25519 (Ed25519).

use super::SignatureAlgorithm;
use crate::signature::Signature;
use serde::{Deserialize, Serialize};
use signature::SignatureEncoding;

/// Multicodec tag for Ed25519 signatures.
pub const ED25519_TAG: u64 = 0xed;

/// Multicodec tag for SHA2-512, the digest Ed25519 uses internally.
pub const SHA2_512_TAG: u64 = 0x13;

/// Length in bytes of an Ed25519 signature.
pub const ED25519_SIGNATURE_SIZE: usize = 64;

/// The Ed25519 signature algorithm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Ed25519;

impl SignatureAlgorithm for Ed25519 {
    fn prefix(&self) -> u64 {
        ED25519_TAG
    }

    fn config_tags(&self) -> Vec<u64> {
        vec![SHA2_512_TAG]
    }

    fn try_from_tags(tags: &[u64]) -> Option<(Self, &[u64])> {
        if tags.get(0..=1)? == [ED25519_TAG, SHA2_512_TAG] {
            Some((Ed25519, tags.get(2..)?))
        } else {
            None
        }
    }
}

/// Raw Ed25519 signature bytes.
///
/// Platform-agnostic: it converts to and from `ed25519_dalek::Signature`
/// for the actual cryptographic work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ed25519Signature(#[serde(with = "serde_bytes")] [u8; ED25519_SIGNATURE_SIZE]);

impl Ed25519Signature {
    /// Wrap raw signature bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; ED25519_SIGNATURE_SIZE]) -> Self {
        Self(bytes)
    }

    /// The raw signature bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; ED25519_SIGNATURE_SIZE] {
        &self.0
    }
}

impl TryFrom<&[u8]> for Ed25519Signature {
    type Error = signature::Error;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let bytes: [u8; ED25519_SIGNATURE_SIZE] =
            bytes.try_into().map_err(|_| signature::Error::new())?;
        Ok(Self(bytes))
    }
}

impl From<Ed25519Signature> for [u8; ED25519_SIGNATURE_SIZE] {
    fn from(sig: Ed25519Signature) -> Self {
        sig.0
    }
}

impl SignatureEncoding for Ed25519Signature {
    type Repr = [u8; ED25519_SIGNATURE_SIZE];
}

impl Signature for Ed25519Signature {
    type Algorithm = Ed25519;
}

impl From<ed25519_dalek::Signature> for Ed25519Signature {
    fn from(sig: ed25519_dalek::Signature) -> Self {
        Self(sig.to_bytes())
    }
}

impl From<Ed25519Signature> for ed25519_dalek::Signature {
    fn from(sig: Ed25519Signature) -> Self {
        ed25519_dalek::Signature::from_bytes(&sig.0)
    }
}
