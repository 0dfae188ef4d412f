//! Signed, scoped, time-bounded delegations.

use crate::{
    CapabilityError,
    resource::ResourceUri,
    time::{TimeWindow, Timestamp},
    verify::Rejection,
};
use quill_common::Blake3Hash;
use quill_credentials::AnySignature;
use quill_varsig::{CanonicalPayload, Did, Field, Resolver};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, fmt, str::FromStr};

/// A signed grant of write access to a set of resources, from an issuer to
/// an audience, within a validity window.
///
/// Capabilities are immutable: the only way to obtain one is to
/// [issue](crate::issue) it or to deserialize one, and both paths validate
/// the invariants (non-empty scope, non-empty window) before a value exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CapabilityFields", into = "CapabilityFields")]
pub struct Capability {
    fields: CapabilityFields,
    window: TimeWindow,
    signing_input: Vec<u8>,
    reference: CapabilityReference,
}

/// The wire form of a [`Capability`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CapabilityFields {
    iss: Did,
    aud: Did,
    res: BTreeSet<ResourceUri>,
    nbf: Timestamp,
    exp: Timestamp,
    nonce: String,
    sig: AnySignature,
}

impl Capability {
    /// The canonical bytes an issuer signs.
    ///
    /// Resources are written sorted and de-duplicated, so the order in which
    /// they were supplied never affects the signature.
    pub fn signing_payload(
        issuer: &Did,
        audience: &Did,
        resources: &BTreeSet<ResourceUri>,
        window: &TimeWindow,
        nonce: &str,
    ) -> CanonicalPayload {
        let resources = resources
            .iter()
            .map(|resource| Field::from(resource.as_str()))
            .collect::<Vec<_>>();
        CanonicalPayload::new("capability")
            .with("iss", issuer.as_str())
            .with("aud", audience.as_str())
            .with("res", resources)
            .with("nbf", window.not_before().to_unix())
            .with("exp", window.expiration().to_unix())
            .with("nonce", nonce)
    }

    pub(crate) fn assemble(
        issuer: Did,
        audience: Did,
        resources: BTreeSet<ResourceUri>,
        window: TimeWindow,
        nonce: String,
        signature: AnySignature,
    ) -> Result<Self, CapabilityError> {
        Self::try_from(CapabilityFields {
            iss: issuer,
            aud: audience,
            res: resources,
            nbf: window.not_before(),
            exp: window.expiration(),
            nonce,
            sig: signature,
        })
    }

    /// The identity that granted this capability.
    pub fn issuer(&self) -> &Did {
        &self.fields.iss
    }

    /// The identity allowed to act under this capability.
    pub fn audience(&self) -> &Did {
        &self.fields.aud
    }

    /// The resources this capability covers.
    pub fn resources(&self) -> &BTreeSet<ResourceUri> {
        &self.fields.res
    }

    /// The validity window.
    pub fn window(&self) -> &TimeWindow {
        &self.window
    }

    /// First valid second.
    pub fn not_before(&self) -> Timestamp {
        self.window.not_before()
    }

    /// Last valid second.
    pub fn expiration(&self) -> Timestamp {
        self.window.expiration()
    }

    /// The random value that makes otherwise identical grants distinct.
    pub fn nonce(&self) -> &str {
        &self.fields.nonce
    }

    /// The issuer's signature over [`signing_input`](Self::signing_input).
    pub fn signature(&self) -> &AnySignature {
        &self.fields.sig
    }

    /// The canonical bytes the issuer signed.
    pub fn signing_input(&self) -> &[u8] {
        &self.signing_input
    }

    /// Content reference binding a mutation to exactly this capability.
    pub fn reference(&self) -> &CapabilityReference {
        &self.reference
    }

    /// Whether any resource in scope grants access to `target`.
    pub fn covers(&self, target: &ResourceUri, allow_wildcards: bool) -> bool {
        self.fields
            .res
            .iter()
            .any(|resource| resource.covers(target, allow_wildcards))
    }

    /// Check the issuer's signature.
    ///
    /// # Errors
    ///
    /// Returns [`Rejection::BadIssuerSignature`] if the issuer DID cannot be
    /// resolved, the signature kind does not match the DID method, or the
    /// signature does not verify over the canonical fields.
    pub fn verify_signature<R>(&self, resolver: &R) -> Result<(), Rejection>
    where
        R: Resolver<AnySignature>,
    {
        resolver
            .verify(&self.fields.iss, &self.signing_input, &self.fields.sig)
            .map_err(|error| Rejection::BadIssuerSignature(error.to_string()))
    }
}

impl TryFrom<CapabilityFields> for Capability {
    type Error = CapabilityError;

    fn try_from(fields: CapabilityFields) -> Result<Self, Self::Error> {
        if fields.res.is_empty() {
            return Err(CapabilityError::EmptyScope);
        }
        let window = TimeWindow::new(fields.nbf, fields.exp)?;
        let signing_input = Self::signing_payload(
            &fields.iss,
            &fields.aud,
            &fields.res,
            &window,
            &fields.nonce,
        )
        .to_bytes()?;
        let reference = CapabilityReference::compute(&signing_input, &fields.sig);

        Ok(Self {
            fields,
            window,
            signing_input,
            reference,
        })
    }
}

impl From<Capability> for CapabilityFields {
    fn from(capability: Capability) -> Self {
        capability.fields
    }
}

/// A content reference to a signed [`Capability`].
///
/// The BLAKE3 digest of the canonical capability payload followed by the
/// encoded issuer signature, rendered as `z` + base58btc.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CapabilityReference(Blake3Hash);

impl CapabilityReference {
    fn compute(signing_input: &[u8], signature: &AnySignature) -> Self {
        let signature = signature.to_vec();
        Self(Blake3Hash::hash_iter(
            [signing_input, signature.as_slice()].into_iter(),
        ))
    }
}

impl fmt::Display for CapabilityReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "z{}", self.0)
    }
}

impl FromStr for CapabilityReference {
    type Err = CapabilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix('z')
            .and_then(|digest| digest.parse().ok())
            .map(Self)
            .ok_or_else(|| CapabilityError::InvalidInput(format!("invalid capability reference {s:?}")))
    }
}

impl TryFrom<String> for CapabilityReference {
    type Error = CapabilityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CapabilityReference> for String {
    fn from(reference: CapabilityReference) -> Self {
        reference.to_string()
    }
}
