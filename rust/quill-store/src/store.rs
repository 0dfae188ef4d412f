use async_trait::async_trait;
use quill_capability::{AuthenticatedMutation, DocumentIdentifier};
use quill_common::ConditionalSync;
use quill_varsig::Did;

use crate::{CommitId, DocumentState, StoreError};

/// A versioned store of documents addressed by [`DocumentIdentifier`].
///
/// Writes arrive as [`AuthenticatedMutation`]s. A store re-verifies each one
/// itself rather than trusting that the caller did, and serializes writes to
/// a document's chain with optimistic concurrency on the head commit.
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
pub trait DocumentStore: ConditionalSync {
    /// Resolve the document `controller` keeps under `namespace` (and
    /// `salt`), creating it on first use, and return its current head.
    async fn resolve_deterministic(
        &self,
        controller: &Did,
        namespace: &str,
        salt: Option<&[u8]>,
    ) -> Result<(DocumentIdentifier, CommitId), StoreError>;

    /// Apply `mutation` if it is authorized and the document's head is
    /// still `expected_head`. `None` skips the head check.
    async fn apply_mutation_at(
        &self,
        mutation: &AuthenticatedMutation,
        expected_head: Option<CommitId>,
    ) -> Result<CommitId, StoreError>;

    /// Apply `mutation` on top of whatever the head currently is.
    async fn apply_mutation(&self, mutation: &AuthenticatedMutation) -> Result<CommitId, StoreError> {
        self.apply_mutation_at(mutation, None).await
    }

    /// The current state of `id`, if the store knows it.
    async fn document(&self, id: &DocumentIdentifier) -> Result<Option<DocumentState>, StoreError>;
}
