use std::{array::TryFromSliceError, fmt, str::FromStr};

use base58::{FromBase58, ToBase58};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The size of a BLAKE3 hash in bytes.
///
/// BLAKE3 produces 256-bit (32-byte) hashes by default.
pub const BLAKE3_HASH_SIZE: usize = 32;

/// A BLAKE3 cryptographic hash.
///
/// This is a wrapper around a 32-byte array that represents a BLAKE3 hash digest.
/// BLAKE3 is a cryptographic hash function that is fast, secure, and provides
/// consistent output across different platforms.
///
/// The textual form is the base58btc encoding of the digest.
///
/// # Examples
///
/// ```rust
/// use quill_common::Blake3Hash;
///
/// let data = b"hello world";
/// let hash = Blake3Hash::hash(data);
/// assert_eq!(hash, Blake3Hash::hash(data));
/// ```
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Blake3Hash([u8; BLAKE3_HASH_SIZE]);

impl Blake3Hash {
    /// Computes the BLAKE3 hash of the given bytes.
    pub fn hash(bytes: &[u8]) -> Self {
        Self(blake3::hash(bytes).into())
    }

    /// Computes the BLAKE3 hash over a sequence of byte chunks, as if they
    /// had been concatenated.
    pub fn hash_iter<'a, I>(bytes: I) -> Self
    where
        I: Iterator<Item = &'a [u8]>,
    {
        let mut hasher = blake3::Hasher::new();
        for chunk in bytes {
            hasher.update(chunk);
        }
        Self(hasher.finalize().into())
    }

    /// Computes a BLAKE3 hash in key derivation mode.
    ///
    /// The `context` string separates hash domains: the same bytes hashed
    /// under two different contexts produce unrelated digests.
    pub fn derive(context: &str, bytes: &[u8]) -> Self {
        Self(blake3::derive_key(context, bytes))
    }

    /// The raw digest bytes.
    pub fn bytes(&self) -> &[u8; BLAKE3_HASH_SIZE] {
        &self.0
    }
}

impl From<[u8; 32]> for Blake3Hash {
    fn from(value: [u8; 32]) -> Self {
        Blake3Hash(value)
    }
}

impl TryFrom<&[u8]> for Blake3Hash {
    type Error = TryFromSliceError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        Ok(Blake3Hash(value.try_into()?))
    }
}

impl fmt::Display for Blake3Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_base58())
    }
}

impl fmt::Debug for Blake3Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Blake3Hash({self})")
    }
}

/// Error when parsing a [`Blake3Hash`] from its base58 form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Blake3HashParseError {
    /// The input is not valid base58.
    #[error("invalid base58 encoding")]
    InvalidBase58,

    /// The decoded digest is not 32 bytes long.
    #[error("expected {BLAKE3_HASH_SIZE} digest bytes, got {0}")]
    InvalidLength(usize),
}

impl FromStr for Blake3Hash {
    type Err = Blake3HashParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s
            .from_base58()
            .map_err(|_| Blake3HashParseError::InvalidBase58)?;
        Blake3Hash::try_from(bytes.as_slice())
            .map_err(|_| Blake3HashParseError::InvalidLength(bytes.len()))
    }
}

impl Serialize for Blake3Hash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Blake3Hash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
