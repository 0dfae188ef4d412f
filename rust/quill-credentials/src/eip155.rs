//! Externally owned Ethereum accounts identified by `did:pkh:eip155`.
//!
//! An account has no keypair quill can hold. Instead an [`ExternalSigner`]
//! (a wallet) is asked to `personal_sign` a readable [`signing_statement`]
//! of the payload, and anyone can check the result by recovering the
//! signing address from the signature and comparing it with the address in
//! the DID.

mod account;
mod error;
mod proof;
mod resolver;
mod statement;
mod wallet;

pub use account::{Address, Eip155Account};
pub use error::{Eip155DidFromStrError, Eip155ResolveError, SignerError};
pub use proof::{AccountProof, DEFAULT_SIGNER_TIMEOUT, SignedAssertion};
pub use resolver::Eip155Resolver;
pub use statement::signing_statement;
pub use wallet::{ExternalSigner, LocalWallet};

use k256::{ecdsa::VerifyingKey, elliptic_curve::sec1::ToEncodedPoint};
use quill_varsig::eip191::{Eip191Signature, eip191_message};
use sha3::{Digest, Keccak256};

/// Keccak-256 of the `personal_sign` framing of `message`.
#[must_use]
pub fn personal_message_hash(message: &[u8]) -> [u8; 32] {
    Keccak256::digest(eip191_message(message)).into()
}

/// Derives the account address of a secp256k1 public key: the trailing 20
/// bytes of the Keccak-256 of the uncompressed point (without its `0x04`
/// tag).
#[must_use]
pub fn address_of(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    let digest = Keccak256::digest(&point.as_bytes()[1..]);
    let mut address = [0u8; 20];
    address.copy_from_slice(&digest[12..]);
    Address::from(address)
}

/// Recovers the address that produced `signature` over `message`.
///
/// # Errors
///
/// Returns [`signature::Error`] if the signature is malformed or no public
/// key can be recovered from it.
pub fn recover_address(
    message: &[u8],
    signature: &Eip191Signature,
) -> Result<Address, signature::Error> {
    let recovery_id = signature
        .recovery_id()
        .and_then(k256::ecdsa::RecoveryId::from_byte)
        .ok_or_else(signature::Error::new)?;
    let rs = k256::ecdsa::Signature::from_slice(signature.rs())?;
    let key = VerifyingKey::recover_from_prehash(&personal_message_hash(message), &rs, recovery_id)?;
    Ok(address_of(&key))
}
