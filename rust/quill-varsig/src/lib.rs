//! Identity and signature primitives.
//!
//! This includes the [`Did`] string type, the [`Principal`] / [`Signer`] /
//! [`Verifier`] / [`Resolver`] traits that tie a DID to its key material,
//! the signature algorithms understood by quill, and the [canonical] payload
//! encoding that every signature is computed over.
//!
//! [canonical]: codec::CanonicalCodec

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod algorithm;
pub mod codec;
pub mod did;
pub mod principal;
pub mod resolver;
pub mod signature;

pub use algorithm::*;
pub use codec::*;
pub use did::*;
pub use principal::*;
pub use resolver::*;
pub use signature::*;
