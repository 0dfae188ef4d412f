//! The wallet collaborator and an in-process implementation of it.

use super::{Address, Eip155Account, address_of, error::SignerError, personal_message_hash};
use async_trait::async_trait;
use k256::ecdsa::SigningKey;
use quill_common::{ConditionalSend, ConditionalSync};
use quill_varsig::eip191::{EIP191_SIGNATURE_SIZE, Eip191Signature};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// A wallet that can `personal_sign` on behalf of one account.
///
/// Every call may cross a process boundary (a browser extension, a mobile
/// wallet over a relay) and may wait on the user, so all of them are async.
/// Implementations must not retry on their own; a refusal is reported as
/// [`SignerError::UserRejected`].
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
pub trait ExternalSigner: ConditionalSend + ConditionalSync {
    /// The chain the wallet is currently connected to.
    async fn chain_id(&self) -> Result<u64, SignerError>;

    /// The currently selected account address.
    async fn address(&self) -> Result<Address, SignerError>;

    /// Ask the wallet to sign `message` with EIP-191 framing.
    async fn request_signature(&self, message: &[u8]) -> Result<Eip191Signature, SignerError>;
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl<W: ExternalSigner + ?Sized> ExternalSigner for Box<W> {
    async fn chain_id(&self) -> Result<u64, SignerError> {
        (**self).chain_id().await
    }

    async fn address(&self) -> Result<Address, SignerError> {
        (**self).address().await
    }

    async fn request_signature(&self, message: &[u8]) -> Result<Eip191Signature, SignerError> {
        (**self).request_signature(message).await
    }
}

/// A secp256k1 key held in process memory, answering signature requests
/// immediately.
///
/// Stands in for a browser wallet in tests and in the demo. The connected
/// chain can be switched and the wallet can be told to refuse requests, which
/// is how a user declining a prompt is simulated.
#[derive(Debug)]
pub struct LocalWallet {
    key: SigningKey,
    chain_id: AtomicU64,
    rejecting: AtomicBool,
}

impl LocalWallet {
    /// Wallet for the secret scalar `seed`, connected to `chain_id`.
    ///
    /// # Errors
    ///
    /// Fails if `seed` is zero or not below the curve order.
    pub fn from_seed(seed: &[u8; 32], chain_id: u64) -> Result<Self, SignerError> {
        let key = SigningKey::from_slice(seed)
            .map_err(|_| SignerError::Unavailable("invalid secp256k1 secret".into()))?;
        Ok(Self {
            key,
            chain_id: AtomicU64::new(chain_id),
            rejecting: AtomicBool::new(false),
        })
    }

    /// Wallet with a freshly generated key.
    ///
    /// # Errors
    ///
    /// Fails if the system RNG is unavailable.
    pub fn generate(chain_id: u64) -> Result<Self, SignerError> {
        loop {
            let mut seed = [0u8; 32];
            getrandom::getrandom(&mut seed)
                .map_err(|error| SignerError::Unavailable(error.to_string()))?;
            // Out-of-range scalars are astronomically rare; draw again.
            if let Ok(wallet) = Self::from_seed(&seed, chain_id) {
                return Ok(wallet);
            }
        }
    }

    /// The account this wallet signs for on its current chain.
    #[must_use]
    pub fn account(&self) -> Eip155Account {
        Eip155Account::new(
            self.chain_id.load(Ordering::Acquire),
            address_of(self.key.verifying_key()),
        )
    }

    /// Switch the connected chain.
    pub fn switch_chain(&self, chain_id: u64) {
        self.chain_id.store(chain_id, Ordering::Release);
    }

    /// Make subsequent signature requests fail with
    /// [`SignerError::UserRejected`] (or succeed again).
    pub fn set_rejecting(&self, rejecting: bool) {
        self.rejecting.store(rejecting, Ordering::Release);
    }

    /// Sign `message` with `personal_sign` framing.
    ///
    /// # Errors
    ///
    /// Fails if the underlying ECDSA operation fails.
    pub fn sign_personal(&self, message: &[u8]) -> Result<Eip191Signature, SignerError> {
        let (signature, recovery_id) = self
            .key
            .sign_prehash_recoverable(&personal_message_hash(message))
            .map_err(|error| SignerError::Unavailable(error.to_string()))?;

        let mut bytes = [0u8; EIP191_SIGNATURE_SIZE];
        bytes[..64].copy_from_slice(&signature.to_bytes());
        bytes[64] = 27 + recovery_id.to_byte();
        Ok(Eip191Signature::from_bytes(bytes))
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl ExternalSigner for LocalWallet {
    async fn chain_id(&self) -> Result<u64, SignerError> {
        Ok(self.chain_id.load(Ordering::Acquire))
    }

    async fn address(&self) -> Result<Address, SignerError> {
        Ok(address_of(self.key.verifying_key()))
    }

    async fn request_signature(&self, message: &[u8]) -> Result<Eip191Signature, SignerError> {
        if self.rejecting.load(Ordering::Acquire) {
            tracing::debug!(account = %self.account(), "local wallet refusing signature request");
            return Err(SignerError::UserRejected);
        }
        self.sign_personal(message)
    }
}
