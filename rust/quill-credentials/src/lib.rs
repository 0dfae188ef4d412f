//! Concrete identities and signing backends for quill.
//!
//! Two kinds of principal can act in quill:
//!
//! - **Native keys** ([`Ed25519Signer`]): an Ed25519 keypair identified by a
//!   `did:key`. dApps hold one of these as their delegated identity.
//! - **Externally owned accounts** ([`AccountProof`]): a blockchain account
//!   identified by a `did:pkh:eip155` DID whose signatures are produced by an
//!   [`ExternalSigner`] (a wallet) using EIP-191 `personal_sign`.
//!
//! Both implement [`Authority`], so anything that needs a signature (issuing
//! a capability, signing a mutation) is agnostic to which one backs the
//! identity. [`DidResolver`] performs the reverse mapping, turning a DID
//! back into a verifier for an [`AnySignature`].

pub mod key;

pub mod ed25519;
pub use ed25519::*;

pub mod eip155;
pub use eip155::*;

mod any;
pub use any::*;

mod authority;
pub use authority::*;
