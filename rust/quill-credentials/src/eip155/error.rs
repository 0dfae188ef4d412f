//! Error types for EIP-155 accounts and wallets.

use thiserror::Error;

/// Errors when parsing a `did:pkh:eip155` DID or a bare address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum Eip155DidFromStrError {
    /// The DID header is not `did:pkh:eip155:`.
    #[error("invalid did header")]
    InvalidDidHeader,

    /// The chain id is not a decimal integer.
    #[error("invalid chain id")]
    InvalidChainId,

    /// The address is not `0x` followed by 40 hex digits.
    #[error("invalid account address")]
    InvalidAddress,
}

/// Error type for EIP-155 DID resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Eip155ResolveError {
    /// The DID could not be parsed as an EIP-155 account.
    #[error("invalid did:pkh:eip155: {0}")]
    InvalidDid(#[from] Eip155DidFromStrError),
}

/// Failures reported by an [`super::ExternalSigner`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignerError {
    /// The user declined the signature request.
    #[error("user rejected the signature request")]
    UserRejected,

    /// The wallet could not be reached or failed internally.
    #[error("signer unavailable: {0}")]
    Unavailable(String),
}
