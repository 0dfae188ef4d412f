//! Issuing capabilities.

use crate::{
    CapabilityError,
    capability::Capability,
    resource::ResourceUri,
    time::{TimeWindow, Timestamp},
};
use quill_credentials::Authority;
use quill_varsig::Did;
use std::collections::BTreeSet;

/// Bytes of randomness in a generated nonce.
const NONCE_SIZE: usize = 12;

/// Issue a capability from `authority` to `audience` over `resources`,
/// valid within `window`.
///
/// A fresh random nonce is drawn, so issuing twice over identical fields
/// yields two distinct capabilities. Nothing is signed unless the inputs are
/// valid, and a failed or cancelled signature leaves nothing behind.
///
/// # Errors
///
/// - [`CapabilityError::EmptyScope`] if `resources` is empty
/// - [`CapabilityError::InvalidWindow`] if the window is already over at
///   `now`
/// - [`CapabilityError::AuthenticationFailure`] if the authority cannot sign
pub async fn issue<A>(
    authority: &A,
    audience: &Did,
    resources: impl IntoIterator<Item = ResourceUri>,
    window: TimeWindow,
    now: Timestamp,
) -> Result<Capability, CapabilityError>
where
    A: Authority + ?Sized,
{
    let nonce = hex::encode(rand::random::<[u8; NONCE_SIZE]>());
    issue_with_nonce(authority, audience, resources, window, now, nonce).await
}

/// [`issue`] with a caller-chosen nonce.
///
/// # Errors
///
/// As [`issue`].
#[tracing::instrument(level = "debug", skip(authority, resources, nonce), fields(issuer))]
pub async fn issue_with_nonce<A>(
    authority: &A,
    audience: &Did,
    resources: impl IntoIterator<Item = ResourceUri>,
    window: TimeWindow,
    now: Timestamp,
    nonce: String,
) -> Result<Capability, CapabilityError>
where
    A: Authority + ?Sized,
{
    let issuer = authority.did();
    tracing::Span::current().record("issuer", tracing::field::display(&issuer));

    let resources: BTreeSet<ResourceUri> = resources.into_iter().collect();
    if resources.is_empty() {
        return Err(CapabilityError::EmptyScope);
    }
    if window.expiration() <= now {
        return Err(CapabilityError::InvalidWindow(format!(
            "expiration {} is not after the current time {now}",
            window.expiration()
        )));
    }

    let payload = Capability::signing_payload(&issuer, audience, &resources, &window, &nonce);
    let signature = authority
        .authorize(&payload.to_bytes()?)
        .await
        .inspect_err(|error| tracing::warn!(%error, "issuer did not sign capability"))?;

    let capability = Capability::assemble(issuer, audience.clone(), resources, window, nonce, signature)?;
    tracing::debug!(
        reference = %capability.reference(),
        window = %capability.window(),
        "issued capability"
    );
    Ok(capability)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentIdentifier;
    use pretty_assertions::assert_eq;
    use quill_credentials::{
        AccountProof, AuthorityError, DidResolver, Ed25519Signer, LocalWallet,
    };
    use quill_varsig::Principal;
    use testresult::TestResult;

    fn at(seconds: u64) -> Timestamp {
        Timestamp::from_unix(seconds).unwrap()
    }

    fn signer(seed: u8) -> Ed25519Signer {
        Ed25519Signer::import(&[seed; 32]).unwrap()
    }

    fn document(controller: &Did) -> ResourceUri {
        DocumentIdentifier::derive(controller.as_str(), "family", None)
            .unwrap()
            .to_resource()
    }

    #[tokio::test]
    async fn it_issues_a_verifiable_capability() -> TestResult {
        let issuer = signer(1);
        let audience = signer(2).did();
        let resource = document(&issuer.did());

        let capability = issue(
            &issuer,
            &audience,
            [resource.clone()],
            TimeWindow::new(at(1000), at(4600))?,
            at(1000),
        )
        .await?;

        assert_eq!(capability.issuer(), &issuer.did());
        assert_eq!(capability.audience(), &audience);
        assert_eq!(capability.resources().iter().collect::<Vec<_>>(), vec![&resource]);
        assert_eq!(capability.not_before(), at(1000));
        assert_eq!(capability.expiration(), at(4600));
        assert_eq!(capability.nonce().len(), NONCE_SIZE * 2);
        capability.verify_signature(&DidResolver::default())?;
        Ok(())
    }

    #[tokio::test]
    async fn fresh_nonces_make_identical_grants_distinct() -> TestResult {
        let issuer = signer(1);
        let audience = signer(2).did();
        let window = TimeWindow::new(at(1000), at(4600))?;

        let one = issue(&issuer, &audience, [document(&issuer.did())], window, at(1000)).await?;
        let two = issue(&issuer, &audience, [document(&issuer.did())], window, at(1000)).await?;
        assert_ne!(one.nonce(), two.nonce());
        assert_ne!(one.reference(), two.reference());
        Ok(())
    }

    #[tokio::test]
    async fn resource_order_does_not_matter() -> TestResult {
        let issuer = signer(1);
        let audience = signer(2).did();
        let window = TimeWindow::new(at(1000), at(4600))?;
        let a: ResourceUri = "doc:ka".parse()?;
        let b: ResourceUri = "doc:kb".parse()?;

        let forward = issue_with_nonce(
            &issuer, &audience, [a.clone(), b.clone()], window, at(1000), "n".into(),
        )
        .await?;
        let backward = issue_with_nonce(
            &issuer, &audience, [b.clone(), a.clone(), b], window, at(1000), "n".into(),
        )
        .await?;
        assert_eq!(forward.signing_input(), backward.signing_input());
        assert_eq!(forward.resources().len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn it_refuses_an_empty_scope() -> TestResult {
        let result = issue(
            &signer(1),
            &signer(2).did(),
            Vec::<ResourceUri>::new(),
            TimeWindow::new(at(1000), at(4600))?,
            at(1000),
        )
        .await;
        assert_eq!(result, Err(CapabilityError::EmptyScope));
        Ok(())
    }

    #[tokio::test]
    async fn it_refuses_a_window_that_is_already_over() -> TestResult {
        let issuer = signer(1);
        let window = TimeWindow::new(at(1000), at(4600))?;

        for now in [at(4600), at(5000)] {
            let result = issue(&issuer, &signer(2).did(), [document(&issuer.did())], window, now).await;
            assert!(matches!(result, Err(CapabilityError::InvalidWindow(_))));
        }
        Ok(())
    }

    #[tokio::test]
    async fn a_wallet_can_issue() -> TestResult {
        let wallet = LocalWallet::from_seed(&[3u8; 32], 1)?;
        let proof = AccountProof::new(wallet.account(), wallet);
        let audience = signer(2).did();

        let capability = issue(
            &proof,
            &audience,
            [document(&proof.did())],
            TimeWindow::new(at(1000), at(4600))?,
            at(1000),
        )
        .await?;
        assert!(capability.issuer().as_str().starts_with("did:pkh:eip155:1:"));
        capability.verify_signature(&DidResolver::default())?;
        Ok(())
    }

    #[tokio::test]
    async fn a_refusing_wallet_issues_nothing() -> TestResult {
        let wallet = LocalWallet::from_seed(&[3u8; 32], 1)?;
        wallet.set_rejecting(true);
        let proof = AccountProof::new(wallet.account(), wallet);

        let result = issue(
            &proof,
            &signer(2).did(),
            [document(&proof.did())],
            TimeWindow::new(at(1000), at(4600))?,
            at(1000),
        )
        .await;
        assert_eq!(
            result,
            Err(CapabilityError::AuthenticationFailure(AuthorityError::UserRejected))
        );
        Ok(())
    }
}
