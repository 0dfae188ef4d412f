//! Integration tests for native and wallet-backed identities.

use pretty_assertions::assert_eq;
use quill_credentials::{
    AccountProof, Authority, AuthorityError, DidResolver, Ed25519Signer, LocalWallet,
    RootAuthority, SignedAssertion, canonical_did,
};
use quill_varsig::{Did, Principal, Resolver};
use std::time::Duration;
use testresult::TestResult;

fn wallet(seed: u8) -> LocalWallet {
    LocalWallet::from_seed(&[seed; 32], 1).unwrap()
}

// ============================================================================
// Identity stability
// ============================================================================

#[test]
fn native_identity_is_a_function_of_the_seed() -> TestResult {
    let first = Ed25519Signer::import(&[8u8; 32])?;
    let second = Ed25519Signer::import(&[8u8; 32])?;
    let other = Ed25519Signer::import(&[9u8; 32])?;

    assert_eq!(first.did(), second.did());
    assert_ne!(first.did(), other.did());
    Ok(())
}

#[test]
fn account_identity_survives_reparsing() -> TestResult {
    let account = wallet(8).account();
    let did = account.did();
    let reparsed: Did = did.as_str().to_lowercase().parse()?;
    assert_ne!(reparsed, did);
    assert_eq!(canonical_did(&reparsed), did);
    Ok(())
}

// ============================================================================
// Signing through either backing
// ============================================================================

#[tokio::test]
async fn root_authorities_sign_interchangeably() -> TestResult {
    let resolver = DidResolver::default();
    let roots: [RootAuthority<LocalWallet>; 2] = [
        Ed25519Signer::generate()?.into(),
        AccountProof::new(wallet(2).account(), wallet(2)).into(),
    ];

    for root in &roots {
        let signature = root.authorize(b"capability bytes").await?;
        resolver.verify(&root.did(), b"capability bytes", &signature)?;
        assert!(resolver.verify(&root.did(), b"other bytes", &signature).is_err());
    }
    Ok(())
}

#[tokio::test]
async fn assertions_verify_after_a_json_round_trip() -> TestResult {
    let wallet = wallet(6);
    let proof = AccountProof::new(wallet.account(), wallet);

    let assertion = proof
        .prove_control(b"I control this account", Duration::from_secs(5))
        .await?;
    let json = serde_json::to_string(&assertion)?;
    let restored: SignedAssertion = serde_json::from_str(&json)?;

    assert_eq!(restored, assertion);
    restored.verify()?;
    Ok(())
}

#[tokio::test]
async fn a_forged_issuer_does_not_verify() -> TestResult {
    let wallet = wallet(6);
    let proof = AccountProof::new(wallet.account(), wallet);
    let mut assertion = proof
        .prove_control(b"I control this account", Duration::from_secs(5))
        .await?;

    assertion.issuer = self::wallet(7).account().did();
    assert_eq!(assertion.verify(), Err(AuthorityError::InvalidSignature));
    Ok(())
}

#[tokio::test]
async fn a_chain_switch_mid_session_is_caught() -> TestResult {
    let wallet = wallet(6);
    let account = wallet.account();
    let proof = AccountProof::new(account, wallet);

    proof.prove_control(b"first", Duration::from_secs(5)).await?;
    proof.wallet().switch_chain(10);

    let result = proof.prove_control(b"second", Duration::from_secs(5)).await;
    assert!(matches!(result, Err(AuthorityError::NetworkMismatch(_))));
    Ok(())
}
