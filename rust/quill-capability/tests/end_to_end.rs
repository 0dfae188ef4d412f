//! The full delegation flow: a wallet-backed controller derives a document,
//! delegates to a dApp key, and the dApp writes within the window.

use pretty_assertions::assert_eq;
use quill_capability::{
    CapabilityError, DocumentIdentifier, ErrorCode, ErrorKind, Patch, Rejection, TimeWindow,
    Timestamp, Verdict, build_mutation, issue, verify,
};
use quill_credentials::{AccountProof, DEFAULT_SIGNER_TIMEOUT, Ed25519Signer, LocalWallet};
use quill_varsig::Principal;
use serde_json::json;
use testresult::TestResult;

const DAPP_SEED: [u8; 32] = [
    69, 90, 79, 1, 19, 168, 234, 177, 16, 163, 37, 8, 233, 244, 36, 102, 130, 190, 102, 10, 239,
    51, 191, 199, 40, 13, 2, 63, 94, 119, 183, 225,
];

#[tokio::test]
async fn it_authorizes_writes_within_the_window_and_expires_after() -> TestResult {
    let t0 = Timestamp::from_unix(1_700_000_000)?;
    let wallet = LocalWallet::from_seed(&[7u8; 32], 1)?;
    let controller = AccountProof::connect(wallet, DEFAULT_SIGNER_TIMEOUT).await?;
    let dapp = Ed25519Signer::import(DAPP_SEED)?;

    let document =
        DocumentIdentifier::derive(controller.did().as_str(), "demo", Some(b"family-salt"))?;
    assert_eq!(
        document,
        DocumentIdentifier::derive(controller.did().as_str(), "demo", Some(b"family-salt"))?
    );

    let capability = issue(
        &controller,
        &dapp.did(),
        [document.to_resource()],
        TimeWindow::new(t0, Timestamp::from_unix(t0.to_unix() + 3600)?)?,
        t0,
    )
    .await?;
    assert_eq!(capability.issuer(), &controller.did());
    assert_eq!(capability.audience(), &dapp.did());

    let mutation = build_mutation(
        &dapp,
        &capability,
        document,
        Patch::new(json!({ "foo": "bar" })),
    )
    .await?;

    let within = Timestamp::from_unix(t0.to_unix() + 10)?;
    assert_eq!(verify(&capability, &mutation, within), Verdict::Accept);

    let after = Timestamp::from_unix(t0.to_unix() + 3601)?;
    let verdict = verify(&capability, &mutation, after);
    assert!(matches!(verdict, Verdict::Reject(Rejection::Expired { .. })));

    let error = verdict.into_result().unwrap_err();
    assert_eq!(error.kind(), ErrorKind::CapabilityInvalid);
    assert_eq!(error.code(), ErrorCode::Expired);
    assert!(matches!(error, CapabilityError::CapabilityInvalid(_)));
    assert!(error.to_string().contains("expired"));
    Ok(())
}

#[tokio::test]
async fn a_rejecting_wallet_cannot_issue() -> TestResult {
    let wallet = LocalWallet::from_seed(&[7u8; 32], 1)?;
    let controller = AccountProof::connect(wallet, DEFAULT_SIGNER_TIMEOUT).await?;
    controller.wallet().set_rejecting(true);
    let dapp = Ed25519Signer::import(DAPP_SEED)?;
    let document = DocumentIdentifier::derive(controller.did().as_str(), "demo", None)?;
    let now = Timestamp::from_unix(1_700_000_000)?;

    let result = issue(
        &controller,
        &dapp.did(),
        [document.to_resource()],
        TimeWindow::new(now, Timestamp::from_unix(now.to_unix() + 60)?)?,
        now,
    )
    .await;

    let error = result.unwrap_err();
    assert_eq!(error.kind(), ErrorKind::AuthenticationFailure);
    Ok(())
}
