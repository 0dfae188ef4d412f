use std::{collections::HashSet, fmt, str::FromStr};

use quill_capability::{DocumentIdentifier, Patch};
use quill_common::Blake3Hash;
use quill_varsig::{CanonicalPayload, Did};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Key derivation context for genesis commits.
pub const GENESIS_CONTEXT: &str = "quill 2024 genesis commit";

/// Identifies one commit in a document's chain.
///
/// The genesis commit is derived from the document header. Every later
/// commit hashes its predecessor together with the canonical form of the
/// patch it applies, so a head commit pins the entire history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommitId(Blake3Hash);

impl CommitId {
    /// The first commit of the document `id` controlled by `controller`.
    pub fn genesis(id: &DocumentIdentifier, controller: &Did) -> std::io::Result<Self> {
        let header = CanonicalPayload::new("genesis")
            .with("ctl", controller.as_str())
            .with("doc", id.to_string());
        Ok(Self(Blake3Hash::derive(GENESIS_CONTEXT, &header.to_bytes()?)))
    }

    /// The commit that follows `self` by applying `patch`.
    pub fn next(&self, patch: &Patch) -> Self {
        let patch = patch.canonical_json();
        Self(Blake3Hash::hash_iter(
            [self.0.bytes().as_slice(), patch.as_bytes()].into_iter(),
        ))
    }

    /// The underlying digest.
    pub fn digest(&self) -> &Blake3Hash {
        &self.0
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for CommitId {
    type Err = <Blake3Hash as FromStr>::Err;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// A document as the store currently holds it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentState {
    id: DocumentIdentifier,
    controller: Did,
    commits: Vec<CommitId>,
    head: CommitId,
    content: Value,
    #[serde(skip)]
    applied: HashSet<Blake3Hash>,
}

impl DocumentState {
    pub(crate) fn genesis(id: DocumentIdentifier, controller: Did) -> std::io::Result<Self> {
        let genesis = CommitId::genesis(&id, &controller)?;
        Ok(Self {
            id,
            controller,
            commits: vec![genesis],
            head: genesis,
            content: Value::Object(Default::default()),
            applied: HashSet::new(),
        })
    }

    /// The document's address.
    pub fn id(&self) -> &DocumentIdentifier {
        &self.id
    }

    /// The identity allowed to delegate writes to this document.
    pub fn controller(&self) -> &Did {
        &self.controller
    }

    /// Every commit, oldest first, starting with genesis.
    pub fn commits(&self) -> &[CommitId] {
        &self.commits
    }

    /// The latest commit.
    pub fn head(&self) -> CommitId {
        self.head
    }

    /// Content after applying every patch in order.
    pub fn content(&self) -> &Value {
        &self.content
    }

    /// Whether the mutation with `digest` was already committed.
    pub(crate) fn has_applied(&self, digest: &Blake3Hash) -> bool {
        self.applied.contains(digest)
    }

    /// Commit `patch`, remembering `digest` so the same signed mutation is
    /// never committed twice.
    pub(crate) fn append(&mut self, patch: &Patch, digest: Blake3Hash) -> CommitId {
        let commit = self.head.next(patch);
        patch.apply_to(&mut self.content);
        self.commits.push(commit);
        self.head = commit;
        self.applied.insert(digest);
        commit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use testresult::TestResult;

    fn state() -> TestResult<DocumentState> {
        let controller: Did = "did:key:z6MkhaXgBZDvotDkL5257faiztiGiC2QtKLGpbnnEGta2doK".parse()?;
        let id = DocumentIdentifier::derive(controller.as_str(), "notes", None)?;
        Ok(DocumentState::genesis(id, controller)?)
    }

    #[test]
    fn commits_chain_from_genesis() -> TestResult {
        let mut state = state()?;
        let genesis = state.head();

        let first = state.append(&Patch::new(json!({ "foo": "bar" })), Blake3Hash::hash(b"first"));
        let second = state.append(
            &Patch::new(json!({ "foo": null, "n": 1 })),
            Blake3Hash::hash(b"second"),
        );

        assert_eq!(state.commits, vec![genesis, first, second]);
        assert_eq!(first, genesis.next(&Patch::new(json!({ "foo": "bar" }))));
        assert_eq!(state.content, json!({ "n": 1 }));
        Ok(())
    }

    #[test]
    fn the_same_patch_at_a_different_head_is_a_different_commit() -> TestResult {
        let mut state = state()?;
        let patch = Patch::new(json!({ "foo": "bar" }));
        let first = state.append(&patch, Blake3Hash::hash(b"first"));
        let second = state.append(&patch, Blake3Hash::hash(b"second"));
        assert_ne!(first, second);
        assert!(state.has_applied(&Blake3Hash::hash(b"first")));
        assert!(!state.has_applied(&Blake3Hash::hash(b"third")));
        Ok(())
    }

    #[test]
    fn commit_ids_parse_back() -> TestResult {
        let head = state()?.head();
        assert_eq!(head.to_string().parse::<CommitId>()?, head);
        Ok(())
    }
}
