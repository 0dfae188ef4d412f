//! Delegated, scoped write authorization for content-addressed documents.
//!
//! A controller (a native key or a wallet-backed account) derives the
//! address of a document, then [issues](issue) a short-lived [`Capability`]
//! naming that document as its scope and a dApp key as its audience. The
//! dApp key signs every write as an [`AuthenticatedMutation`] carrying the
//! capability, and a [`CapabilityVerifier`] decides, from the mutation alone,
//! whether the write is authorized:
//!
//! ```no_run
//! # async fn example() -> Result<(), quill_capability::CapabilityError> {
//! use quill_capability::{
//!     DocumentIdentifier, Patch, TimeWindow, Timestamp, build_mutation, issue, verify,
//! };
//! use quill_credentials::Ed25519Signer;
//! use quill_varsig::Principal;
//! use std::time::Duration;
//!
//! let controller = Ed25519Signer::generate().expect("rng");
//! let dapp = Ed25519Signer::generate().expect("rng");
//! let now = Timestamp::now();
//!
//! let document = DocumentIdentifier::derive(controller.did().as_str(), "demo", None)?;
//! let capability = issue(
//!     &controller,
//!     &dapp.did(),
//!     [document.to_resource()],
//!     TimeWindow::starting_at(now, Duration::from_secs(3600))?,
//!     now,
//! )
//! .await?;
//!
//! let mutation = build_mutation(
//!     &dapp,
//!     &capability,
//!     document,
//!     Patch::new(serde_json::json!({ "foo": "bar" })),
//! )
//! .await?;
//! verify(&capability, &mutation, now).into_result()?;
//! # Ok(())
//! # }
//! ```

mod capability;
mod document;
mod error;
mod issue;
mod mutation;
mod resource;
mod settings;
pub mod time;
mod verify;

pub use capability::{Capability, CapabilityReference};
pub use document::{DOCUMENT_ID_CONTEXT, DOCUMENT_SCHEME, DocumentIdentifier};
pub use error::{CapabilityError, ErrorCode, ErrorKind};
pub use issue::{issue, issue_with_nonce};
pub use mutation::{AuthenticatedMutation, Patch, build_mutation};
pub use resource::{ResourceUri, WILDCARD};
pub use settings::Settings;
pub use time::{Clock, FixedClock, SystemClock, TimeWindow, Timestamp};
pub use verify::{CapabilityVerifier, Rejection, Verdict, verify};
