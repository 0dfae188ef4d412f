//! Error types for Ed25519 key operations.

use thiserror::Error;

/// Errors from [`super::Ed25519Signer::generate`] and
/// [`super::Ed25519Signer::import`].
#[derive(Debug, Clone, Error)]
pub enum Ed25519KeyError {
    /// The seed bytes have the wrong length (expected 32).
    #[error("expected 32 seed bytes, got {0}")]
    InvalidSeedLength(usize),

    /// Random number generation failed.
    #[error("RNG error: {0}")]
    Rng(#[from] getrandom::Error),
}

/// Why a string is not an Ed25519 `did:key`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum Ed25519DidFromStrError {
    /// Not a `did:key`, or a `did:key` for another key type.
    #[error("not an ed25519 did:key")]
    InvalidDidHeader,

    /// The multibase prefix is not `z` (base58btc).
    #[error("did:key is not base58btc encoded")]
    MissingBase58Prefix,

    /// The key part does not decode.
    #[error("did:key contains invalid base58")]
    InvalidBase58,

    /// The decoded bytes are not a valid Ed25519 point.
    #[error("did:key does not hold a valid ed25519 public key")]
    InvalidKey,
}

/// Failure to resolve a DID with [`super::Ed25519KeyResolver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Ed25519ResolveError {
    /// The DID could not be parsed as an Ed25519 did:key.
    #[error("invalid ed25519 did:key: {0}")]
    InvalidDid(#[from] Ed25519DidFromStrError),
}
