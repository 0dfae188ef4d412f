//! Proving control of an externally owned account.

use super::{Eip155Account, ExternalSigner, error::SignerError, recover_address};
use crate::authority::AuthorityError;
use quill_varsig::{Did, Principal, eip191::Eip191Signature};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How long [`AccountProof`] waits for the wallet unless told otherwise.
pub const DEFAULT_SIGNER_TIMEOUT: Duration = Duration::from_secs(120);

/// A message signed by an account, checkable by anyone without contacting
/// the wallet again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedAssertion {
    /// The account DID that signed.
    pub issuer: Did,
    /// The exact bytes that were signed (before EIP-191 framing).
    #[serde(with = "serde_bytes_vec")]
    pub payload: Vec<u8>,
    /// The recoverable signature.
    pub signature: Eip191Signature,
}

impl SignedAssertion {
    /// Recover the signer and check it is [`issuer`](Self::issuer).
    ///
    /// # Errors
    ///
    /// Returns [`AuthorityError::InvalidSignature`] if the issuer is not an
    /// EIP-155 account or the signature was produced by another key.
    pub fn verify(&self) -> Result<(), AuthorityError> {
        let account: Eip155Account = self
            .issuer
            .as_str()
            .parse()
            .map_err(|_| AuthorityError::InvalidSignature)?;
        let signer = recover_address(&self.payload, &self.signature)
            .map_err(|_| AuthorityError::InvalidSignature)?;
        if signer == account.address() {
            Ok(())
        } else {
            Err(AuthorityError::InvalidSignature)
        }
    }
}

mod serde_bytes_vec {
    use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&URL_SAFE_NO_PAD.encode(bytes))
        } else {
            serializer.serialize_bytes(bytes)
        }
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<u8>, D::Error> {
        if deserializer.is_human_readable() {
            let encoded = String::deserialize(deserializer)?;
            URL_SAFE_NO_PAD
                .decode(encoded)
                .map_err(serde::de::Error::custom)
        } else {
            serde_bytes::ByteBuf::deserialize(deserializer).map(serde_bytes::ByteBuf::into_vec)
        }
    }
}

/// An externally owned account acting as a root identity through a wallet.
///
/// Holds no key material: every signature is requested from `wallet`, which
/// must be connected to the account's chain and have the account selected.
#[derive(Debug)]
pub struct AccountProof<W> {
    account: Eip155Account,
    wallet: W,
    timeout: Duration,
}

impl<W: ExternalSigner> AccountProof<W> {
    /// Bind `account` to `wallet`.
    pub fn new(account: Eip155Account, wallet: W) -> Self {
        Self {
            account,
            wallet,
            timeout: DEFAULT_SIGNER_TIMEOUT,
        }
    }

    /// Ask the wallet which account it is connected to and bind to that.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorityError::TimedOut`] if the wallet does not answer in
    /// time, or the wallet's own failure.
    pub async fn connect(wallet: W, timeout: Duration) -> Result<Self, AuthorityError> {
        let query = async {
            let chain_id = wallet.chain_id().await?;
            let address = wallet.address().await?;
            Ok::<_, SignerError>(Eip155Account::new(chain_id, address))
        };
        let account = tokio::time::timeout(timeout, query)
            .await
            .map_err(|_| AuthorityError::TimedOut(timeout))??;
        tracing::debug!(%account, "connected to wallet");
        Ok(Self {
            account,
            wallet,
            timeout,
        })
    }

    /// Use `timeout` for signature requests made through
    /// [`Authority::authorize`](crate::Authority::authorize).
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The account this proof speaks for.
    pub const fn account(&self) -> &Eip155Account {
        &self.account
    }

    /// The wallet backing this proof.
    pub const fn wallet(&self) -> &W {
        &self.wallet
    }

    /// The timeout applied by [`Authority::authorize`](crate::Authority::authorize).
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Have the wallet sign `challenge` and check that the account really
    /// produced the signature.
    ///
    /// The wallet's chain and selected address are checked before anything
    /// is shown to the user. The whole exchange is a single request: if the
    /// returned future is dropped nothing is retained.
    ///
    /// # Errors
    ///
    /// - [`AuthorityError::NetworkMismatch`] if the wallet is on another chain
    ///   or has another account selected
    /// - [`AuthorityError::UserRejected`] if the user declines
    /// - [`AuthorityError::TimedOut`] if the wallet does not answer within
    ///   `timeout`
    /// - [`AuthorityError::InvalidSignature`] if the signature does not
    ///   recover to the account
    #[tracing::instrument(skip(self, challenge), fields(account = %self.account))]
    pub async fn prove_control(
        &self,
        challenge: &[u8],
        timeout: Duration,
    ) -> Result<SignedAssertion, AuthorityError> {
        let exchange = async {
            let chain_id = self.wallet.chain_id().await?;
            if chain_id != self.account.chain_id() {
                return Err(AuthorityError::NetworkMismatch(format!(
                    "wallet is on chain {chain_id}, account lives on chain {}",
                    self.account.chain_id()
                )));
            }

            let address = self.wallet.address().await?;
            if address != self.account.address() {
                return Err(AuthorityError::NetworkMismatch(format!(
                    "wallet has {address} selected, expected {}",
                    self.account.address()
                )));
            }

            Ok::<_, AuthorityError>(self.wallet.request_signature(challenge).await?)
        };

        let signature = match tokio::time::timeout(timeout, exchange).await {
            Ok(Ok(signature)) => signature,
            Ok(Err(error)) => {
                tracing::warn!(%error, "wallet did not sign");
                return Err(error);
            }
            Err(_) => {
                tracing::warn!(?timeout, "wallet did not answer in time");
                return Err(AuthorityError::TimedOut(timeout));
            }
        };

        let assertion = SignedAssertion {
            issuer: self.account.did(),
            payload: challenge.to_vec(),
            signature,
        };
        assertion.verify().inspect_err(|_| {
            tracing::warn!("wallet returned a signature from a different key");
        })?;
        Ok(assertion)
    }
}

impl<W> Principal for AccountProof<W> {
    fn did(&self) -> Did {
        self.account.did()
    }
}
