//! The signing contract shared by every root and delegated identity.

use crate::{
    AccountProof, AnySignature, Ed25519Signer, ExternalSigner, SignerError, signing_statement,
};
use async_trait::async_trait;
use quill_common::ConditionalSync;
use quill_varsig::{Did, Principal, Signer};
use std::time::Duration;

/// Why an [`Authority`] could not produce a signature.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthorityError {
    /// The user declined to sign.
    #[error("user rejected the signature request")]
    UserRejected,

    /// The signer is connected to another chain or account than expected.
    #[error("network mismatch: {0}")]
    NetworkMismatch(String),

    /// The signer did not answer in time.
    #[error("signer did not answer within {0:?}")]
    TimedOut(Duration),

    /// The signer failed for another reason.
    #[error("signing failed: {0}")]
    Signing(String),

    /// The signer answered with a signature that is not the account's.
    #[error("signature does not belong to the expected account")]
    InvalidSignature,
}

impl From<SignerError> for AuthorityError {
    fn from(error: SignerError) -> Self {
        match error {
            SignerError::UserRejected => AuthorityError::UserRejected,
            SignerError::Unavailable(reason) => AuthorityError::Signing(reason),
        }
    }
}

impl From<signature::Error> for AuthorityError {
    fn from(error: signature::Error) -> Self {
        AuthorityError::Signing(error.to_string())
    }
}

/// A principal that can sign payloads.
///
/// Callers only see an [`AnySignature`]; whether it came from a key in
/// memory or from a wallet prompt is the implementation's business.
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
pub trait Authority: Principal + ConditionalSync {
    /// Sign `payload` as [`did`](Principal::did).
    async fn authorize(&self, payload: &[u8]) -> Result<AnySignature, AuthorityError>;
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl Authority for Ed25519Signer {
    async fn authorize(&self, payload: &[u8]) -> Result<AnySignature, AuthorityError> {
        Ok(AnySignature::Ed25519(self.sign(payload).await?))
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl<W: ExternalSigner> Authority for AccountProof<W> {
    async fn authorize(&self, payload: &[u8]) -> Result<AnySignature, AuthorityError> {
        let statement = signing_statement(payload);
        let assertion = self.prove_control(&statement, self.timeout()).await?;
        Ok(AnySignature::Eip191(assertion.signature))
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl<A: Authority + ?Sized> Authority for &A {
    async fn authorize(&self, payload: &[u8]) -> Result<AnySignature, AuthorityError> {
        (**self).authorize(payload).await
    }
}

/// Either kind of root identity behind one type.
///
/// Lets a caller pick the backing at runtime (a key the user imported, or a
/// wallet they connected) without making everything downstream generic over
/// it.
#[derive(Debug)]
pub enum RootAuthority<W> {
    /// A native Ed25519 key.
    NativeKey(Ed25519Signer),
    /// An externally owned account signing through a wallet.
    ExternallyOwnedAccount(AccountProof<W>),
}

impl<W> Principal for RootAuthority<W> {
    fn did(&self) -> Did {
        match self {
            RootAuthority::NativeKey(signer) => signer.did(),
            RootAuthority::ExternallyOwnedAccount(proof) => proof.did(),
        }
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl<W: ExternalSigner> Authority for RootAuthority<W> {
    async fn authorize(&self, payload: &[u8]) -> Result<AnySignature, AuthorityError> {
        match self {
            RootAuthority::NativeKey(signer) => signer.authorize(payload).await,
            RootAuthority::ExternallyOwnedAccount(proof) => proof.authorize(payload).await,
        }
    }
}

impl<W> From<Ed25519Signer> for RootAuthority<W> {
    fn from(signer: Ed25519Signer) -> Self {
        RootAuthority::NativeKey(signer)
    }
}

impl<W> From<AccountProof<W>> for RootAuthority<W> {
    fn from(proof: AccountProof<W>) -> Self {
        RootAuthority::ExternallyOwnedAccount(proof)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DidResolver, LocalWallet};
    use quill_varsig::Resolver;
    use testresult::TestResult;

    async fn sign_with(authority: &impl Authority, payload: &[u8]) -> TestResult<AnySignature> {
        Ok(authority.authorize(payload).await?)
    }

    #[tokio::test]
    async fn both_backings_produce_verifiable_signatures() -> TestResult {
        let wallet = LocalWallet::from_seed(&[5u8; 32], 1)?;
        let roots: Vec<RootAuthority<LocalWallet>> = vec![
            Ed25519Signer::import(&[5u8; 32])?.into(),
            AccountProof::new(wallet.account(), wallet).into(),
        ];

        for root in &roots {
            let signature = sign_with(root, b"payload").await?;
            DidResolver::default().verify(&root.did(), b"payload", &signature)?;
        }
        Ok(())
    }

    #[tokio::test]
    async fn wallet_refusal_surfaces_as_user_rejected() -> TestResult {
        let wallet = LocalWallet::from_seed(&[5u8; 32], 1)?;
        wallet.set_rejecting(true);
        let root: RootAuthority<LocalWallet> = AccountProof::new(wallet.account(), wallet).into();

        assert_eq!(
            root.authorize(b"payload").await,
            Err(AuthorityError::UserRejected)
        );
        Ok(())
    }
}
