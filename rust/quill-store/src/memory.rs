use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use quill_capability::{
    AuthenticatedMutation, CapabilityVerifier, Clock, DocumentIdentifier, Settings, SystemClock,
    Verdict,
};
use quill_credentials::canonical_did;
use quill_varsig::Did;
use tokio::sync::RwLock;

use crate::{CommitId, DocumentState, DocumentStore, StoreError};

/// A [`DocumentStore`] kept entirely in memory.
///
/// Clones share the same documents. Verification uses the store's own
/// [`Clock`], so a mutation that was valid when signed is still refused once
/// its capability has expired.
#[derive(Clone)]
pub struct MemoryStore<C = SystemClock> {
    documents: Arc<RwLock<HashMap<DocumentIdentifier, DocumentState>>>,
    verifier: CapabilityVerifier,
    clock: C,
}

impl Default for MemoryStore<SystemClock> {
    fn default() -> Self {
        Self::new(Settings::default(), SystemClock)
    }
}

impl<C: Clock> MemoryStore<C> {
    /// An empty store verifying with `settings` against `clock`.
    pub fn new(settings: Settings, clock: C) -> Self {
        Self {
            documents: Arc::default(),
            verifier: CapabilityVerifier::new(settings),
            clock,
        }
    }

    /// The store's clock.
    pub fn clock(&self) -> &C {
        &self.clock
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl<C: Clock> DocumentStore for MemoryStore<C> {
    async fn resolve_deterministic(
        &self,
        controller: &Did,
        namespace: &str,
        salt: Option<&[u8]>,
    ) -> Result<(DocumentIdentifier, CommitId), StoreError> {
        let id = DocumentIdentifier::derive(controller.as_str(), namespace, salt)?;

        if let Some(state) = self.documents.read().await.get(&id) {
            return Ok((id, state.head()));
        }

        let mut documents = self.documents.write().await;
        if let Some(state) = documents.get(&id) {
            return Ok((id, state.head()));
        }
        let state = DocumentState::genesis(id, canonical_did(controller))?;
        let head = state.head();
        documents.insert(id, state);
        tracing::debug!(document = %id, %controller, genesis = %head, "document created");
        Ok((id, head))
    }

    async fn apply_mutation_at(
        &self,
        mutation: &AuthenticatedMutation,
        expected_head: Option<CommitId>,
    ) -> Result<CommitId, StoreError> {
        if let Verdict::Reject(rejection) = self.verifier.verify_attached(mutation, self.clock.now()) {
            return Err(rejection.into());
        }
        let digest = mutation.digest()?;

        let mut documents = self.documents.write().await;
        let state = documents
            .get_mut(mutation.target())
            .ok_or_else(|| StoreError::UnknownDocument(*mutation.target()))?;

        let issuer = canonical_did(mutation.capability().issuer());
        if &issuer != state.controller() {
            tracing::warn!(document = %state.id(), %issuer, "capability not issued by controller");
            return Err(StoreError::NotController {
                controller: state.controller().clone(),
                issuer,
            });
        }

        if state.has_applied(&digest) {
            tracing::warn!(document = %state.id(), actor = %mutation.actor(), "mutation replayed");
            return Err(StoreError::Replayed(*state.id()));
        }

        if let Some(expected) = expected_head {
            if expected != state.head() {
                return Err(StoreError::Conflict {
                    expected,
                    actual: state.head(),
                });
            }
        }

        let commit = state.append(mutation.patch(), digest);
        tracing::debug!(
            document = %state.id(),
            actor = %mutation.actor(),
            %commit,
            "mutation committed"
        );
        Ok(commit)
    }

    async fn document(&self, id: &DocumentIdentifier) -> Result<Option<DocumentState>, StoreError> {
        Ok(self.documents.read().await.get(id).cloned())
    }
}
