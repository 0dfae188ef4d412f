//! Integration tests for the in-memory document store.

use std::{sync::Arc, time::Duration};

use pretty_assertions::assert_eq;
use quill_capability::{
    AuthenticatedMutation, Capability, DocumentIdentifier, FixedClock, Patch, Rejection, Settings,
    TimeWindow, Timestamp, build_mutation, issue,
};
use quill_credentials::{AccountProof, Ed25519Signer, LocalWallet};
use quill_store::{DocumentStore, MemoryStore, StoreError};
use quill_varsig::{Did, Principal};
use serde_json::json;
use testresult::TestResult;

const T0: u64 = 1_700_000_000;

fn test_signer(seed: u8) -> Ed25519Signer {
    Ed25519Signer::import(&[seed; 32]).unwrap()
}

fn store() -> MemoryStore<Arc<FixedClock>> {
    let clock = Arc::new(FixedClock::new(Timestamp::from_unix(T0 + 10).unwrap()));
    MemoryStore::new(Settings::default(), clock)
}

async fn delegate<A: quill_credentials::Authority>(
    controller: &A,
    dapp: &Ed25519Signer,
    document: DocumentIdentifier,
) -> TestResult<Capability> {
    let t0 = Timestamp::from_unix(T0)?;
    Ok(issue(
        controller,
        &dapp.did(),
        [document.to_resource()],
        TimeWindow::starting_at(t0, Duration::from_secs(3600))?,
        t0,
    )
    .await?)
}

async fn write(
    dapp: &Ed25519Signer,
    capability: &Capability,
    document: DocumentIdentifier,
    patch: serde_json::Value,
) -> TestResult<AuthenticatedMutation> {
    Ok(build_mutation(dapp, capability, document, Patch::new(patch)).await?)
}

// ============================================================================
// Resolution
// ============================================================================

#[tokio::test]
async fn resolution_is_deterministic_and_idempotent() -> TestResult {
    let store = store();
    let controller = test_signer(1).did();

    let (first, genesis) = store.resolve_deterministic(&controller, "demo", Some(b"salt")).await?;
    let (again, head) = store.resolve_deterministic(&controller, "demo", Some(b"salt")).await?;
    let (other, _) = store.resolve_deterministic(&controller, "demo", Some(b"pepper")).await?;

    assert_eq!(first, again);
    assert_eq!(genesis, head);
    assert_ne!(first, other);
    assert_eq!(first, DocumentIdentifier::derive(controller.as_str(), "demo", Some(b"salt"))?);

    let state = store.document(&first).await?.unwrap();
    assert_eq!(state.commits(), &[genesis]);
    assert_eq!(state.content(), &json!({}));
    Ok(())
}

#[tokio::test]
async fn an_empty_namespace_is_refused() -> TestResult {
    let result = store().resolve_deterministic(&test_signer(1).did(), "", None).await;
    assert!(matches!(result, Err(StoreError::InvalidInput(_))));
    Ok(())
}

// ============================================================================
// Writes
// ============================================================================

#[tokio::test]
async fn authorized_writes_extend_the_chain() -> TestResult {
    let store = store();
    let controller = test_signer(1);
    let dapp = test_signer(2);
    let (document, genesis) = store
        .resolve_deterministic(&controller.did(), "demo", None)
        .await?;
    let capability = delegate(&controller, &dapp, document).await?;

    let first = store
        .apply_mutation(&write(&dapp, &capability, document, json!({ "foo": "bar" })).await?)
        .await?;
    let second = store
        .apply_mutation_at(
            &write(&dapp, &capability, document, json!({ "foo": "baz", "n": 2 })).await?,
            Some(first),
        )
        .await?;

    let state = store.document(&document).await?.unwrap();
    assert_eq!(state.commits(), &[genesis, first, second]);
    assert_eq!(state.head(), second);
    assert_eq!(state.content(), &json!({ "foo": "baz", "n": 2 }));
    Ok(())
}

#[tokio::test]
async fn wallet_controlled_documents_accept_delegated_writes() -> TestResult {
    let store = store();
    let wallet = LocalWallet::from_seed(&[5u8; 32], 1)?;
    let controller = AccountProof::new(wallet.account(), wallet);
    let dapp = test_signer(2);

    // Resolve through a lower-cased spelling of the account.
    let spelled: Did = controller.did().as_str().to_lowercase().parse()?;
    let (document, _) = store.resolve_deterministic(&spelled, "family", None).await?;
    let capability = delegate(&controller, &dapp, document).await?;

    store
        .apply_mutation(&write(&dapp, &capability, document, json!({ "foo": 1 })).await?)
        .await?;
    Ok(())
}

#[tokio::test]
async fn writes_to_unknown_documents_are_refused() -> TestResult {
    let store = store();
    let controller = test_signer(1);
    let dapp = test_signer(2);
    let document = DocumentIdentifier::derive(controller.did().as_str(), "never-resolved", None)?;
    let capability = delegate(&controller, &dapp, document).await?;

    let result = store
        .apply_mutation(&write(&dapp, &capability, document, json!({})).await?)
        .await;
    assert_eq!(result, Err(StoreError::UnknownDocument(document)));
    Ok(())
}

#[tokio::test]
async fn only_the_controller_can_delegate() -> TestResult {
    let store = store();
    let controller = test_signer(1);
    let stranger = test_signer(3);
    let dapp = test_signer(2);
    let (document, _) = store
        .resolve_deterministic(&controller.did(), "demo", None)
        .await?;

    // A validly signed capability, but from someone who does not own the
    // document.
    let capability = delegate(&stranger, &dapp, document).await?;
    let result = store
        .apply_mutation(&write(&dapp, &capability, document, json!({ "foo": 1 })).await?)
        .await;

    assert_eq!(
        result,
        Err(StoreError::NotController {
            controller: controller.did(),
            issuer: stranger.did(),
        })
    );
    Ok(())
}

#[tokio::test]
async fn the_store_verifies_against_its_own_clock() -> TestResult {
    let store = store();
    let controller = test_signer(1);
    let dapp = test_signer(2);
    let (document, _) = store
        .resolve_deterministic(&controller.did(), "demo", None)
        .await?;
    let capability = delegate(&controller, &dapp, document).await?;
    let mutation = write(&dapp, &capability, document, json!({ "foo": "late" })).await?;

    store.clock().advance(Duration::from_secs(3591));
    let result = store.apply_mutation(&mutation).await;

    assert!(matches!(
        result,
        Err(StoreError::Rejected(Rejection::Expired { .. }))
    ));
    let state = store.document(&document).await?.unwrap();
    assert_eq!(state.commits().len(), 1);
    Ok(())
}

#[tokio::test]
async fn stale_heads_conflict() -> TestResult {
    let store = store();
    let controller = test_signer(1);
    let dapp = test_signer(2);
    let (document, genesis) = store
        .resolve_deterministic(&controller.did(), "demo", None)
        .await?;
    let capability = delegate(&controller, &dapp, document).await?;

    let head = store
        .apply_mutation_at(&write(&dapp, &capability, document, json!({ "a": 1 })).await?, Some(genesis))
        .await?;
    let result = store
        .apply_mutation_at(&write(&dapp, &capability, document, json!({ "b": 1 })).await?, Some(genesis))
        .await;

    assert_eq!(
        result,
        Err(StoreError::Conflict {
            expected: genesis,
            actual: head,
        })
    );
    Ok(())
}

#[tokio::test]
async fn a_resubmitted_mutation_cannot_revert_later_writes() -> TestResult {
    let store = store();
    let controller = test_signer(1);
    let dapp = test_signer(2);
    let (document, genesis) = store
        .resolve_deterministic(&controller.did(), "demo", None)
        .await?;
    let capability = delegate(&controller, &dapp, document).await?;

    let bar = write(&dapp, &capability, document, json!({ "foo": "bar" })).await?;
    let baz = write(&dapp, &capability, document, json!({ "foo": "baz" })).await?;
    let first = store.apply_mutation(&bar).await?;
    let second = store.apply_mutation(&baz).await?;

    assert_eq!(
        store.apply_mutation(&bar).await,
        Err(StoreError::Replayed(document))
    );
    assert_eq!(
        store.apply_mutation_at(&bar, Some(second)).await,
        Err(StoreError::Replayed(document))
    );

    let state = store.document(&document).await?.unwrap();
    assert_eq!(state.commits(), &[genesis, first, second]);
    assert_eq!(state.content(), &json!({ "foo": "baz" }));
    Ok(())
}

#[tokio::test]
async fn a_fresh_signature_over_the_same_patch_is_not_a_replay() -> TestResult {
    let store = store();
    let controller = test_signer(1);
    let dapp = test_signer(2);
    let (document, _) = store
        .resolve_deterministic(&controller.did(), "demo", None)
        .await?;
    let first = delegate(&controller, &dapp, document).await?;
    let second = delegate(&controller, &dapp, document).await?;

    store
        .apply_mutation(&write(&dapp, &first, document, json!({ "foo": "bar" })).await?)
        .await?;
    store
        .apply_mutation(&write(&dapp, &second, document, json!({ "foo": "bar" })).await?)
        .await?;

    assert_eq!(store.document(&document).await?.unwrap().commits().len(), 3);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_writers_on_the_same_head_commit_exactly_once() -> TestResult {
    let store = store();
    let controller = test_signer(1);
    let dapp = test_signer(2);
    let (document, genesis) = store
        .resolve_deterministic(&controller.did(), "demo", None)
        .await?;
    let capability = delegate(&controller, &dapp, document).await?;

    let mut mutations = Vec::new();
    for n in 0..8 {
        mutations.push(write(&dapp, &capability, document, json!({ "writer": n })).await?);
    }

    let attempts = mutations.into_iter().map(|mutation| {
        let store = store.clone();
        tokio::spawn(async move { store.apply_mutation_at(&mutation, Some(genesis)).await })
    });
    let results = futures::future::join_all(attempts).await;

    let mut committed = 0;
    for result in results {
        match result? {
            Ok(_) => committed += 1,
            Err(StoreError::Conflict { expected, .. }) => assert_eq!(expected, genesis),
            Err(error) => panic!("unexpected error: {error}"),
        }
    }
    assert_eq!(committed, 1);
    assert_eq!(store.document(&document).await?.unwrap().commits().len(), 2);
    Ok(())
}
