use std::{sync::Arc, time::Duration};

use anyhow::Result;
use quill_capability::{
    Capability, Clock, DocumentIdentifier, FixedClock, Patch, Settings, TimeWindow, Timestamp,
    build_mutation, issue,
};
use quill_credentials::{AccountProof, Ed25519Signer, LocalWallet};
use quill_store::{CommitId, DocumentStore, MemoryStore, StoreError};
use quill_varsig::{Did, Principal};
use serde_json::{Value, json};

/// Seed of the dApp's delegated key. Fixed so the dApp identity is stable
/// across runs.
pub const DAPP_SEED: [u8; 32] = [
    69, 90, 79, 1, 19, 168, 234, 177, 16, 163, 37, 8, 233, 244, 36, 102, 130, 190, 102, 10, 239,
    51, 191, 199, 40, 13, 2, 63, 94, 119, 183, 225,
];

/// Chain the demo wallet is connected to (Ethereum mainnet).
pub const DEMO_CHAIN_ID: u64 = 1;

/// What to do in one run.
#[derive(Debug, Clone)]
pub struct WalkthroughOptions {
    /// Value written to `foo`.
    pub foo: String,
    /// Namespace of the document; random when `None`.
    pub namespace: Option<String>,
    /// Let the capability expire before writing.
    pub expired: bool,
}

impl Default for WalkthroughOptions {
    fn default() -> Self {
        Self {
            foo: "bar".into(),
            namespace: None,
            expired: false,
        }
    }
}

/// Everything a run produced.
#[derive(Debug)]
pub struct Walkthrough {
    /// The wallet account that controls the document.
    pub controller: Did,
    /// The dApp's delegated identity.
    pub dapp: Did,
    /// Namespace the document was derived under.
    pub namespace: String,
    /// The document's address.
    pub document: DocumentIdentifier,
    /// The delegation from controller to dApp.
    pub capability: Capability,
    /// The store's answer to the write.
    pub outcome: Result<CommitId, StoreError>,
    /// The document's commits after the write, oldest first.
    pub commits: Vec<CommitId>,
    /// The document's content after the write.
    pub content: Value,
}

/// A random namespace in the `family` group.
pub fn random_namespace() -> String {
    format!("family-{}", hex::encode(rand::random::<[u8; 4]>()))
}

/// Run the full delegation flow once against a fresh in-memory store.
pub async fn run(settings: Settings, options: WalkthroughOptions) -> Result<Walkthrough> {
    let clock = Arc::new(FixedClock::new(Timestamp::now()));
    let store = MemoryStore::new(settings.clone(), clock.clone());

    let wallet = LocalWallet::generate(DEMO_CHAIN_ID)?;
    let controller = AccountProof::connect(wallet, settings.signer_timeout()).await?;
    tracing::info!(controller = %controller.did(), "wallet connected");

    let namespace = options.namespace.unwrap_or_else(random_namespace);
    let (document, genesis) = store
        .resolve_deterministic(&controller.did(), &namespace, None)
        .await?;
    tracing::info!(%document, %namespace, "document resolved");

    let dapp = Ed25519Signer::import(DAPP_SEED)?;
    let now = clock.now();
    let capability = issue(
        &controller,
        &dapp.did(),
        [document.to_resource_in(&settings.document_scheme)?],
        TimeWindow::starting_at(now, settings.capability_ttl())?,
        now,
    )
    .await?;
    tracing::info!(
        capability = %capability.reference(),
        audience = %capability.audience(),
        window = %capability.window(),
        "capability issued"
    );

    let mutation = build_mutation(
        &dapp,
        &capability,
        document,
        Patch::new(json!({ "foo": options.foo })),
    )
    .await?;

    if options.expired {
        clock.advance(settings.capability_ttl() + Duration::from_secs(1));
    }
    let outcome = store.apply_mutation_at(&mutation, Some(genesis)).await;

    let state = store
        .document(&document)
        .await?
        .ok_or(StoreError::UnknownDocument(document))?;

    Ok(Walkthrough {
        controller: controller.did(),
        dapp: dapp.did(),
        namespace,
        document,
        capability,
        outcome,
        commits: state.commits().to_vec(),
        content: state.content().clone(),
    })
}
