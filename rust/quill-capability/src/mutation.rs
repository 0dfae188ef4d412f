//! Authenticated mutations: a patch to one document, signed by the acting
//! identity and carrying the capability that authorizes it.

use crate::{
    CapabilityError,
    capability::{Capability, CapabilityReference},
    document::DocumentIdentifier,
};
use quill_common::Blake3Hash;
use quill_credentials::{AnySignature, Authority, canonical_did};
use quill_varsig::{CanonicalPayload, Did};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A JSON Merge Patch ([RFC 7386]).
///
/// [RFC 7386]: https://www.rfc-editor.org/rfc/rfc7386
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Patch(Value);

impl Patch {
    /// Wrap a JSON value.
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// The patch document.
    pub fn value(&self) -> &Value {
        &self.0
    }

    /// Compact JSON with object keys in ascending order at every level.
    pub fn canonical_json(&self) -> String {
        let mut out = String::new();
        write_canonical(&self.0, &mut out);
        out
    }

    /// Merge this patch into `target`.
    ///
    /// Object members are merged recursively, `null` members delete, and any
    /// non-object patch replaces the target outright.
    pub fn apply_to(&self, target: &mut Value) {
        merge(target, &self.0);
    }
}

impl From<Value> for Patch {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

fn merge(target: &mut Value, patch: &Value) {
    let Value::Object(members) = patch else {
        *target = patch.clone();
        return;
    };
    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    if let Value::Object(existing) = target {
        for (key, value) in members {
            if value.is_null() {
                existing.remove(key);
            } else {
                merge(existing.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
    }
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(members) => {
            let mut entries = members.iter().collect::<Vec<_>>();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (index, (key, value)) in entries.into_iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(value, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (index, item) in items.iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

/// A write request a verifier can check on its own.
///
/// Created per write attempt by [`build_mutation`] and consumed by a
/// verifier; it is never stored once applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedMutation {
    target: DocumentIdentifier,
    patch: Patch,
    actor: Did,
    capability: Capability,
    signature: AnySignature,
}

impl AuthenticatedMutation {
    /// The canonical bytes the acting identity signs.
    pub fn signing_payload(
        target: &DocumentIdentifier,
        patch: &Patch,
        actor: &Did,
        capability: &CapabilityReference,
    ) -> CanonicalPayload {
        CanonicalPayload::new("mutation")
            .with("act", actor.as_str())
            .with("cap", capability.to_string())
            .with("patch", patch.canonical_json())
            .with("target", target.to_string())
    }

    /// The document being written.
    pub fn target(&self) -> &DocumentIdentifier {
        &self.target
    }

    /// The change to apply.
    pub fn patch(&self) -> &Patch {
        &self.patch
    }

    /// The identity that signed this mutation.
    pub fn actor(&self) -> &Did {
        &self.actor
    }

    /// The capability attached as proof.
    pub fn capability(&self) -> &Capability {
        &self.capability
    }

    /// The actor's signature.
    pub fn signature(&self) -> &AnySignature {
        &self.signature
    }

    /// Re-encode the payload the actor signed.
    ///
    /// # Errors
    ///
    /// Returns [`CapabilityError::Encoding`] if encoding fails.
    pub fn signing_input(&self) -> Result<Vec<u8>, CapabilityError> {
        Ok(Self::signing_payload(
            &self.target,
            &self.patch,
            &self.actor,
            self.capability.reference(),
        )
        .to_bytes()?)
    }

    /// Identifies this exact signed write.
    ///
    /// Covers the signed payload and the signature, so two mutations share a
    /// digest only if one is a copy of the other.
    ///
    /// # Errors
    ///
    /// Returns [`CapabilityError::Encoding`] if encoding fails.
    pub fn digest(&self) -> Result<Blake3Hash, CapabilityError> {
        let input = self.signing_input()?;
        let signature = self.signature.to_vec();
        Ok(Blake3Hash::hash_iter(
            [input.as_slice(), signature.as_slice()].into_iter(),
        ))
    }
}

/// Sign `patch` to `target` as `acting`, attaching `capability`.
///
/// The acting identity must be the capability's audience. That is checked
/// before anything is signed so that a mutation doomed to rejection is never
/// produced.
///
/// # Errors
///
/// - [`CapabilityError::AudienceMismatch`] if `acting` is not the audience
/// - [`CapabilityError::AuthenticationFailure`] if signing fails
pub async fn build_mutation<A>(
    acting: &A,
    capability: &Capability,
    target: DocumentIdentifier,
    patch: Patch,
) -> Result<AuthenticatedMutation, CapabilityError>
where
    A: Authority + ?Sized,
{
    let actor = acting.did();
    if canonical_did(&actor) != canonical_did(capability.audience()) {
        return Err(CapabilityError::AudienceMismatch {
            expected: capability.audience().clone(),
            actual: actor,
        });
    }

    let payload =
        AuthenticatedMutation::signing_payload(&target, &patch, &actor, capability.reference());
    let signature = acting.authorize(&payload.to_bytes()?).await?;
    tracing::debug!(%target, %actor, capability = %capability.reference(), "signed mutation");

    Ok(AuthenticatedMutation {
        target,
        patch,
        actor,
        capability: capability.clone(),
        signature,
    })
}
