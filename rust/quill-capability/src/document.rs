//! Deterministic document identifiers.
//!
//! A document's identifier is computed from who controls it and what it is
//! for, never from its content, so any party can work out the address of a
//! document before it has a single commit.

use crate::{CapabilityError, resource::ResourceUri};
use base58::{FromBase58, ToBase58};
use quill_common::Blake3Hash;
use quill_credentials::{DidResolver, canonical_did};
use quill_varsig::{CanonicalPayload, Did, Resolver};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Key-derivation context under which document identifiers are hashed.
pub const DOCUMENT_ID_CONTEXT: &str = "quill 2024 document identifier";

/// Default resource scheme for documents.
pub const DOCUMENT_SCHEME: &str = "doc";

/// Version byte of the current identifier format.
const VERSION: u8 = 0x01;

/// Leading character of a rendered identifier.
const PREFIX: char = 'k';

/// A stable, content-independent document identifier.
///
/// Rendered as `k` followed by the base58btc encoding of a version byte and
/// the 32-byte digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocumentIdentifier(Blake3Hash);

impl DocumentIdentifier {
    /// Derive the identifier of the document `controller` keeps under
    /// `namespace`, optionally separated further by `salt`.
    ///
    /// Identical inputs yield the identical identifier in every process.
    /// The controller is normalized first, so two spellings of the same
    /// account address derive the same document.
    ///
    /// # Errors
    ///
    /// - [`CapabilityError::InvalidController`] if `controller` is empty, not
    ///   a DID, or a DID no supported method can verify
    /// - [`CapabilityError::InvalidInput`] if `namespace` is empty
    pub fn derive(
        controller: &str,
        namespace: &str,
        salt: Option<&[u8]>,
    ) -> Result<Self, CapabilityError> {
        if controller.is_empty() {
            return Err(CapabilityError::InvalidController(
                "controller is empty".into(),
            ));
        }
        let controller: Did = controller
            .parse()
            .map_err(|error| CapabilityError::InvalidController(format!("{error}")))?;
        // A controller nobody can verify could never issue a capability.
        DidResolver::default()
            .resolve(&controller)
            .map_err(|error| CapabilityError::InvalidController(error.to_string()))?;
        if namespace.is_empty() {
            return Err(CapabilityError::InvalidInput("namespace is empty".into()));
        }

        let header = CanonicalPayload::new("document")
            .with("ctl", canonical_did(&controller).as_str())
            .with("ns", namespace)
            .with_optional("salt", salt);
        Ok(Self(Blake3Hash::derive(DOCUMENT_ID_CONTEXT, &header.to_bytes()?)))
    }

    /// The underlying digest.
    pub fn digest(&self) -> &Blake3Hash {
        &self.0
    }

    /// The resource naming this document under the default `doc` scheme.
    pub fn to_resource(&self) -> ResourceUri {
        // Base58 text under a fixed scheme is always a well-formed URI.
        ResourceUri::from_parts(DOCUMENT_SCHEME, &self.to_string())
    }

    /// The resource naming this document under `scheme`.
    ///
    /// # Errors
    ///
    /// Returns [`CapabilityError::InvalidInput`] if `scheme` is not a valid
    /// URI scheme.
    pub fn to_resource_in(&self, scheme: &str) -> Result<ResourceUri, CapabilityError> {
        ResourceUri::new(format!("{scheme}:{self}"))
    }
}

impl fmt::Display for DocumentIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut bytes = Vec::with_capacity(33);
        bytes.push(VERSION);
        bytes.extend_from_slice(self.0.bytes());
        write!(f, "{PREFIX}{}", bytes.to_base58())
    }
}

impl FromStr for DocumentIdentifier {
    type Err = CapabilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| {
            CapabilityError::InvalidInput(format!("invalid document identifier {s:?}: {reason}"))
        };
        let encoded = s
            .strip_prefix(PREFIX)
            .ok_or_else(|| invalid("missing 'k' prefix"))?;
        let bytes = encoded
            .from_base58()
            .map_err(|_| invalid("not base58"))?;
        match bytes.split_first() {
            Some((&VERSION, digest)) => Blake3Hash::try_from(digest)
                .map(Self)
                .map_err(|_| invalid("wrong length")),
            Some((version, _)) => Err(invalid(&format!("unknown version {version:#04x}"))),
            None => Err(invalid("empty")),
        }
    }
}

impl TryFrom<String> for DocumentIdentifier {
    type Error = CapabilityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DocumentIdentifier> for String {
    fn from(id: DocumentIdentifier) -> Self {
        id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use testresult::TestResult;

    const CONTROLLER: &str = "did:pkh:eip155:1:0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";

    #[test]
    fn it_is_deterministic() -> TestResult {
        let one = DocumentIdentifier::derive(CONTROLLER, "family", Some(b"salt"))?;
        let two = DocumentIdentifier::derive(CONTROLLER, "family", Some(b"salt"))?;
        assert_eq!(one, two);
        Ok(())
    }

    #[test]
    fn it_separates_every_input() -> TestResult {
        let base = DocumentIdentifier::derive(CONTROLLER, "family", None)?;
        let other_controller = DocumentIdentifier::derive(
            "did:key:z6MkhaXgBZDvotDkL5257faiztiGiC2QtKLGpbnnEGta2doK",
            "family",
            None,
        )?;
        let other_namespace = DocumentIdentifier::derive(CONTROLLER, "friends", None)?;
        let salted = DocumentIdentifier::derive(CONTROLLER, "family", Some(b""))?;

        assert_ne!(base, other_controller);
        assert_ne!(base, other_namespace);
        assert_ne!(base, salted, "an empty salt is still a salt");
        Ok(())
    }

    #[test]
    fn it_ignores_address_case() -> TestResult {
        let mixed = DocumentIdentifier::derive(CONTROLLER, "family", None)?;
        let lower = DocumentIdentifier::derive(&CONTROLLER.to_lowercase(), "family", None)?;
        assert_eq!(mixed, lower);
        Ok(())
    }

    #[test]
    fn it_rejects_bad_controllers() {
        for bad in ["", "alice", "did:", "did:pkh"] {
            assert!(
                matches!(
                    DocumentIdentifier::derive(bad, "family", None),
                    Err(CapabilityError::InvalidController(_))
                ),
                "{bad:?}"
            );
        }
        assert!(matches!(
            DocumentIdentifier::derive(CONTROLLER, "", None),
            Err(CapabilityError::InvalidInput(_))
        ));
    }

    #[test]
    fn it_rejects_controllers_that_cannot_sign() {
        for unverifiable in [
            "did:web:example.com",
            "did:key:zNotAKey",
            "did:key:z6MkhaXgBZDvotDkL5257faiztiGiC2QtKLGpbnnEGta2do",
            "did:pkh:eip155:1:0x1234",
            "did:pkh:solana:4sGjMW1sUnHzSxGspuhpqLDx6wiyjNtZ",
        ] {
            assert!(
                matches!(
                    DocumentIdentifier::derive(unverifiable, "family", None),
                    Err(CapabilityError::InvalidController(_))
                ),
                "{unverifiable:?}"
            );
        }
    }

    #[test]
    fn it_renders_and_parses() -> TestResult {
        let id = DocumentIdentifier::derive(CONTROLLER, "family", None)?;
        let text = id.to_string();
        assert!(text.starts_with('k'));
        assert_eq!(text.parse::<DocumentIdentifier>()?, id);
        assert_eq!(id.to_resource().as_str(), format!("doc:{text}"));

        assert!("zabc".parse::<DocumentIdentifier>().is_err());
        assert!("k".parse::<DocumentIdentifier>().is_err());
        assert!(format!("k{}", [0x02u8; 33].to_base58()).parse::<DocumentIdentifier>().is_err());
        Ok(())
    }

    proptest! {
        #[test]
        fn derivation_depends_only_on_its_inputs(
            namespace in "[a-z]{1,16}",
            salt in proptest::collection::vec(any::<u8>(), 0..32),
        ) {
            let one = DocumentIdentifier::derive(CONTROLLER, &namespace, Some(&salt)).unwrap();
            let two = DocumentIdentifier::derive(CONTROLLER, &namespace, Some(&salt)).unwrap();
            prop_assert_eq!(one, two);
        }

        #[test]
        fn distinct_salts_give_distinct_documents(
            s1 in proptest::collection::vec(any::<u8>(), 0..32),
            s2 in proptest::collection::vec(any::<u8>(), 0..32),
        ) {
            prop_assume!(s1 != s2);
            let one = DocumentIdentifier::derive(CONTROLLER, "demo", Some(&s1)).unwrap();
            let two = DocumentIdentifier::derive(CONTROLLER, "demo", Some(&s2)).unwrap();
            prop_assert_ne!(one, two);
        }
    }
}
