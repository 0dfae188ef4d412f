//! Error types for capability issuance, mutation construction, and
//! verification.
//!
//! Every failure is a value returned to the immediate caller. Each error
//! belongs to one of four broad [`ErrorKind`]s and carries a stable
//! [`ErrorCode`] that relying parties can log or map onto a response status.

use crate::verify::Rejection;
use quill_credentials::AuthorityError;
use quill_varsig::Did;
use serde::Serialize;

/// Errors produced while deriving identifiers, issuing capabilities,
/// building mutations, or verifying them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CapabilityError {
    /// The controller identifier is empty or not a DID.
    #[error("invalid controller: {0}")]
    InvalidController(String),

    /// An identifier, URI, or other input is malformed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A capability must name at least one resource.
    #[error("capability scope is empty")]
    EmptyScope,

    /// The validity window is empty or already over.
    #[error("invalid validity window: {0}")]
    InvalidWindow(String),

    /// The signer refused, timed out, or is connected to the wrong account.
    #[error("authentication failed: {0}")]
    AuthenticationFailure(#[from] AuthorityError),

    /// Verification rejected the capability.
    #[error("capability invalid: {0}")]
    CapabilityInvalid(Rejection),

    /// Verification rejected the mutation itself.
    #[error("mutation invalid: {0}")]
    MutationInvalid(Rejection),

    /// The acting identity is not the capability's audience.
    #[error("audience mismatch: capability is for {expected}, actor is {actual}")]
    AudienceMismatch {
        /// The capability's audience.
        expected: Did,
        /// The identity that tried to act.
        actual: Did,
    },

    /// A payload could not be encoded.
    #[error("encoding failed: {0}")]
    Encoding(String),
}

/// The broad class of a [`CapabilityError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed identifiers or URIs, empty scopes, bad windows.
    InvalidInput,
    /// External signer rejection, network or account mismatch.
    AuthenticationFailure,
    /// Expired, not yet valid, wrong audience, scope not covered, or bad
    /// issuer signature.
    CapabilityInvalid,
    /// Bad acting-identity signature, or audience mismatch at construction.
    MutationInvalid,
}

/// Stable, fine-grained error codes.
///
/// Each code maps to an HTTP status code via [`ErrorCode::status_code`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // 400 Bad Request
    /// Controller is empty or not a DID
    InvalidController,
    /// Generic malformed input
    InvalidArgument,
    /// Capability names no resources
    EmptyScope,
    /// Validity window is empty or over
    InvalidWindow,
    /// Payload encoding failed
    EncodingFailed,

    // 401 Unauthorized
    /// The user declined to sign
    UserRejected,
    /// Wallet is on the wrong chain or account
    NetworkMismatch,
    /// Signer timed out
    SignerTimeout,
    /// Signer failed or answered with a foreign signature
    SignerFailed,
    /// Capability signature does not verify
    SignatureInvalid,
    /// Capability is not valid yet
    NotYetValid,
    /// Capability has expired
    Expired,
    /// Actor is not the capability's audience
    AudienceMismatch,
    /// Mutation signature does not verify
    MutationSignatureInvalid,

    // 403 Forbidden
    /// Target document is outside the capability's resources
    ScopeNotCovered,
    /// Mutation was signed for a different capability
    CapabilityMismatch,
}

impl ErrorCode {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorCode::InvalidController
            | ErrorCode::InvalidArgument
            | ErrorCode::EmptyScope
            | ErrorCode::InvalidWindow
            | ErrorCode::EncodingFailed => 400,

            ErrorCode::UserRejected
            | ErrorCode::NetworkMismatch
            | ErrorCode::SignerTimeout
            | ErrorCode::SignerFailed
            | ErrorCode::SignatureInvalid
            | ErrorCode::NotYetValid
            | ErrorCode::Expired
            | ErrorCode::AudienceMismatch
            | ErrorCode::MutationSignatureInvalid => 401,

            ErrorCode::ScopeNotCovered | ErrorCode::CapabilityMismatch => 403,
        }
    }
}

impl CapabilityError {
    /// The broad class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CapabilityError::InvalidController(_)
            | CapabilityError::InvalidInput(_)
            | CapabilityError::EmptyScope
            | CapabilityError::InvalidWindow(_)
            | CapabilityError::Encoding(_) => ErrorKind::InvalidInput,
            CapabilityError::AuthenticationFailure(_) => ErrorKind::AuthenticationFailure,
            CapabilityError::CapabilityInvalid(_) => ErrorKind::CapabilityInvalid,
            CapabilityError::MutationInvalid(_) | CapabilityError::AudienceMismatch { .. } => {
                ErrorKind::MutationInvalid
            }
        }
    }

    /// The stable code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            CapabilityError::InvalidController(_) => ErrorCode::InvalidController,
            CapabilityError::InvalidInput(_) => ErrorCode::InvalidArgument,
            CapabilityError::EmptyScope => ErrorCode::EmptyScope,
            CapabilityError::InvalidWindow(_) => ErrorCode::InvalidWindow,
            CapabilityError::Encoding(_) => ErrorCode::EncodingFailed,
            CapabilityError::AuthenticationFailure(error) => match error {
                AuthorityError::UserRejected => ErrorCode::UserRejected,
                AuthorityError::NetworkMismatch(_) => ErrorCode::NetworkMismatch,
                AuthorityError::TimedOut(_) => ErrorCode::SignerTimeout,
                AuthorityError::Signing(_) | AuthorityError::InvalidSignature => {
                    ErrorCode::SignerFailed
                }
            },
            CapabilityError::CapabilityInvalid(rejection)
            | CapabilityError::MutationInvalid(rejection) => rejection.code(),
            CapabilityError::AudienceMismatch { .. } => ErrorCode::AudienceMismatch,
        }
    }
}

impl From<Rejection> for CapabilityError {
    fn from(rejection: Rejection) -> Self {
        if rejection.is_capability_failure() {
            CapabilityError::CapabilityInvalid(rejection)
        } else {
            CapabilityError::MutationInvalid(rejection)
        }
    }
}

impl From<std::io::Error> for CapabilityError {
    fn from(error: std::io::Error) -> Self {
        CapabilityError::Encoding(error.to_string())
    }
}
