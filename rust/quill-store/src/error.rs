use quill_capability::{CapabilityError, DocumentIdentifier, Rejection};
use quill_varsig::Did;
use thiserror::Error;

use crate::CommitId;

/// Why a store refused a request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The target document was never resolved in this store.
    #[error("Unknown document: {0}")]
    UnknownDocument(DocumentIdentifier),

    /// The capability was issued by someone other than the controller.
    #[error("Capability issued by {issuer}, but {controller} controls the document")]
    NotController {
        /// The document's controller.
        controller: Did,
        /// The capability's issuer.
        issuer: Did,
    },

    /// The document moved on since the writer last saw it.
    #[error("Head is {actual}, expected {expected}")]
    Conflict {
        /// The head the writer built on.
        expected: CommitId,
        /// The current head.
        actual: CommitId,
    },

    /// This exact signed mutation was already committed.
    #[error("Mutation already applied to {0}")]
    Replayed(DocumentIdentifier),

    /// The mutation failed verification.
    #[error("Mutation rejected: {0}")]
    Rejected(#[from] Rejection),

    /// The controller, namespace, or another input is malformed.
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] CapabilityError),

    /// A header could not be encoded.
    #[error("Encoding failed: {0}")]
    Encoding(String),
}

impl From<std::io::Error> for StoreError {
    fn from(error: std::io::Error) -> Self {
        StoreError::Encoding(error.to_string())
    }
}
