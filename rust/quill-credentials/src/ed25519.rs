//! Ed25519 keys identified by `did:key`.

mod error;
mod resolver;
mod signer;
mod verifier;

pub use crate::key::KeyExport;
pub use error::{Ed25519DidFromStrError, Ed25519KeyError, Ed25519ResolveError};
pub use resolver::Ed25519KeyResolver;
pub use signer::Ed25519Signer;
pub use verifier::Ed25519Verifier;

/// Multicodec prefix of an Ed25519 public key (`ed25519-pub`, varint `0xed`).
pub const ED25519_PUB_MULTICODEC: [u8; 2] = [0xed, 0x01];

/// Length of an Ed25519 seed / public key.
pub const ED25519_KEY_SIZE: usize = 32;
