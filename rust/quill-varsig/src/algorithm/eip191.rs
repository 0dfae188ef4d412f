//! ECDSA over secp256k1 with [EIP-191] `personal_sign` framing.
//!
//! This is the scheme externally owned Ethereum accounts use to sign
//! arbitrary messages: the message is prefixed with
//! `"\x19Ethereum Signed Message:\n" || len(message)`, hashed with
//! Keccak-256, and signed with a recoverable ECDSA signature.
//!
//! [EIP-191]: https://eips.ethereum.org/EIPS/eip-191

use super::SignatureAlgorithm;
use crate::signature::Signature;
use serde::{Deserialize, Serialize};
use signature::SignatureEncoding;

/// Multicodec tag for ECDSA signatures.
pub const ECDSA_TAG: u64 = 0xec;

/// Multicodec tag for the secp256k1 curve.
pub const SECP256K1_TAG: u64 = 0xe7;

/// Multicodec tag for Keccak-256.
pub const KECCAK_256_TAG: u64 = 0x1b;

/// Tag marking the EIP-191 `personal_sign` message framing.
pub const EIP191_TAG: u64 = 0xd191;

/// Length in bytes of a recoverable signature (`r || s || v`).
pub const EIP191_SIGNATURE_SIZE: usize = 65;

/// The prefix `personal_sign` places in front of every message.
pub const EIP191_MESSAGE_PREFIX: &str = "\x19Ethereum Signed Message:\n";

/// The EIP-191 secp256k1 signature algorithm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Eip191;

impl SignatureAlgorithm for Eip191 {
    fn prefix(&self) -> u64 {
        ECDSA_TAG
    }

    fn config_tags(&self) -> Vec<u64> {
        vec![SECP256K1_TAG, KECCAK_256_TAG, EIP191_TAG]
    }

    fn try_from_tags(tags: &[u64]) -> Option<(Self, &[u64])> {
        if tags.get(0..=3)? == [ECDSA_TAG, SECP256K1_TAG, KECCAK_256_TAG, EIP191_TAG] {
            Some((Eip191, tags.get(4..)?))
        } else {
            None
        }
    }
}

/// Frames `message` the way `personal_sign` does, ready to be hashed.
#[must_use]
pub fn eip191_message(message: &[u8]) -> Vec<u8> {
    let length = message.len().to_string();
    let mut framed =
        Vec::with_capacity(EIP191_MESSAGE_PREFIX.len() + length.len() + message.len());
    framed.extend_from_slice(EIP191_MESSAGE_PREFIX.as_bytes());
    framed.extend_from_slice(length.as_bytes());
    framed.extend_from_slice(message);
    framed
}

/// A recoverable secp256k1 signature, `r || s || v`.
///
/// `v` is kept as the wallet returned it: either `0`/`1` or the legacy
/// `27`/`28` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Eip191Signature(#[serde(with = "serde_bytes")] [u8; EIP191_SIGNATURE_SIZE]);

impl Eip191Signature {
    /// Wrap raw signature bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; EIP191_SIGNATURE_SIZE]) -> Self {
        Self(bytes)
    }

    /// The raw signature bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; EIP191_SIGNATURE_SIZE] {
        &self.0
    }

    /// The 64-byte `r || s` part.
    #[must_use]
    pub fn rs(&self) -> &[u8] {
        &self.0[..64]
    }

    /// The recovery id normalized to `0` or `1`, if `v` is well formed.
    #[must_use]
    pub const fn recovery_id(&self) -> Option<u8> {
        match self.0[64] {
            v @ (0 | 1) => Some(v),
            v @ (27 | 28) => Some(v - 27),
            _ => None,
        }
    }
}

impl TryFrom<&[u8]> for Eip191Signature {
    type Error = signature::Error;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let bytes: [u8; EIP191_SIGNATURE_SIZE] =
            bytes.try_into().map_err(|_| signature::Error::new())?;
        Ok(Self(bytes))
    }
}

impl From<Eip191Signature> for [u8; EIP191_SIGNATURE_SIZE] {
    fn from(sig: Eip191Signature) -> Self {
        sig.0
    }
}

impl SignatureEncoding for Eip191Signature {
    type Repr = [u8; EIP191_SIGNATURE_SIZE];
}

impl Signature for Eip191Signature {
    type Algorithm = Eip191;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn it_frames_messages_like_personal_sign() {
        assert_eq!(
            eip191_message(b"hello"),
            b"\x19Ethereum Signed Message:\n5hello".to_vec()
        );
    }

    #[test]
    fn it_normalizes_legacy_recovery_ids() {
        let mut bytes = [0u8; 65];
        bytes[64] = 28;
        assert_eq!(Eip191Signature::from_bytes(bytes).recovery_id(), Some(1));
        bytes[64] = 0;
        assert_eq!(Eip191Signature::from_bytes(bytes).recovery_id(), Some(0));
        bytes[64] = 35;
        assert_eq!(Eip191Signature::from_bytes(bytes).recovery_id(), None);
    }

    #[test]
    fn it_reads_its_own_tags() {
        let tags = Eip191.tags();
        let (algorithm, rest) = Eip191::try_from_tags(&tags).unwrap();
        assert_eq!(algorithm, Eip191);
        assert!(rest.is_empty());
    }
}
