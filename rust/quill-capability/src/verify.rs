//! Checking that a mutation is authorized by its capability.
//!
//! Verification is a pure function of the capability, the mutation, the
//! time, and the public key material named by the DIDs involved. Any third
//! party holding the same inputs reaches the same verdict.

use crate::{
    CapabilityError, ErrorCode,
    capability::{Capability, CapabilityReference},
    mutation::AuthenticatedMutation,
    resource::ResourceUri,
    settings::Settings,
    time::Timestamp,
};
use quill_credentials::{AnySignature, DidResolver, canonical_did};
use quill_varsig::{Did, Resolver};
use std::fmt;

/// The specific check a mutation failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    /// The capability's issuer signature does not verify.
    #[error("bad issuer signature: {0}")]
    BadIssuerSignature(String),

    /// The capability's window has not opened yet.
    #[error("not yet valid: window opens at {not_before}, now is {now}")]
    NotYetValid {
        /// First valid second.
        not_before: Timestamp,
        /// Verification time.
        now: Timestamp,
    },

    /// The capability's window has closed.
    #[error("expired: window closed at {expiration}, now is {now}")]
    Expired {
        /// Last valid second.
        expiration: Timestamp,
        /// Verification time.
        now: Timestamp,
    },

    /// The mutation was signed by someone other than the audience.
    #[error("audience mismatch: capability is for {audience}, mutation is by {actor}")]
    AudienceMismatch {
        /// The capability's audience.
        audience: Did,
        /// The mutation's acting identity.
        actor: Did,
    },

    /// The target document is not among the capability's resources.
    #[error("scope not covered: {target} is not granted")]
    ScopeNotCovered {
        /// The resource derived from the mutation's target.
        target: ResourceUri,
    },

    /// The mutation was signed over a different capability than the one
    /// supplied.
    #[error("capability mismatch: mutation references {found}, supplied {expected}")]
    CapabilityMismatch {
        /// The supplied capability.
        expected: CapabilityReference,
        /// The capability the mutation carries.
        found: CapabilityReference,
    },

    /// The acting identity's signature does not verify.
    #[error("bad mutation signature: {0}")]
    BadMutationSignature(String),
}

impl Rejection {
    /// Whether the capability (rather than the mutation) is at fault.
    pub fn is_capability_failure(&self) -> bool {
        !matches!(
            self,
            Rejection::CapabilityMismatch { .. } | Rejection::BadMutationSignature(_)
        )
    }

    /// Short name of the failed check, for logs.
    pub fn check(&self) -> &'static str {
        match self {
            Rejection::BadIssuerSignature(_) => "issuer_signature",
            Rejection::NotYetValid { .. } => "not_before",
            Rejection::Expired { .. } => "expiration",
            Rejection::AudienceMismatch { .. } => "audience",
            Rejection::ScopeNotCovered { .. } => "scope",
            Rejection::CapabilityMismatch { .. } => "capability_reference",
            Rejection::BadMutationSignature(_) => "mutation_signature",
        }
    }

    /// The stable error code of this rejection.
    pub fn code(&self) -> ErrorCode {
        match self {
            Rejection::BadIssuerSignature(_) => ErrorCode::SignatureInvalid,
            Rejection::NotYetValid { .. } => ErrorCode::NotYetValid,
            Rejection::Expired { .. } => ErrorCode::Expired,
            Rejection::AudienceMismatch { .. } => ErrorCode::AudienceMismatch,
            Rejection::ScopeNotCovered { .. } => ErrorCode::ScopeNotCovered,
            Rejection::CapabilityMismatch { .. } => ErrorCode::CapabilityMismatch,
            Rejection::BadMutationSignature(_) => ErrorCode::MutationSignatureInvalid,
        }
    }
}

/// The outcome of verifying a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Verdict {
    /// Every check passed.
    Accept,
    /// The named check failed.
    Reject(Rejection),
}

impl Verdict {
    /// Whether the mutation was accepted.
    pub fn is_accept(&self) -> bool {
        matches!(self, Verdict::Accept)
    }

    /// The rejection, if any.
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Verdict::Accept => None,
            Verdict::Reject(rejection) => Some(rejection),
        }
    }

    /// Convert into a `Result`, classifying the rejection.
    ///
    /// # Errors
    ///
    /// Returns [`CapabilityError::CapabilityInvalid`] or
    /// [`CapabilityError::MutationInvalid`] for a rejection.
    pub fn into_result(self) -> Result<(), CapabilityError> {
        match self {
            Verdict::Accept => Ok(()),
            Verdict::Reject(rejection) => Err(rejection.into()),
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Accept => f.write_str("accept"),
            Verdict::Reject(rejection) => write!(f, "reject ({rejection})"),
        }
    }
}

/// Checks mutations against capabilities.
///
/// Holds no session state; one verifier can serve any number of concurrent
/// checks.
#[derive(Debug, Clone, Default)]
pub struct CapabilityVerifier<R = DidResolver> {
    resolver: R,
    settings: Settings,
}

impl CapabilityVerifier<DidResolver> {
    /// Verifier for every supported DID method with `settings`.
    pub fn new(settings: Settings) -> Self {
        Self::with_resolver(DidResolver::default(), settings)
    }
}

impl<R: Resolver<AnySignature>> CapabilityVerifier<R> {
    /// Verifier resolving DIDs through `resolver`.
    pub fn with_resolver(resolver: R, settings: Settings) -> Self {
        Self { resolver, settings }
    }

    /// The active settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Decide whether `mutation` is authorized by `capability` at `now`.
    ///
    /// Checks run in this order and stop at the first failure:
    ///
    /// 1. the issuer's signature over the capability
    /// 2. `not_before <= now <= expiration`
    /// 3. the mutation's actor is the capability's audience
    /// 4. the target document's resource is covered by the capability
    /// 5. the mutation was signed over this capability
    /// 6. the actor's signature over the mutation
    pub fn verify(
        &self,
        capability: &Capability,
        mutation: &AuthenticatedMutation,
        now: Timestamp,
    ) -> Verdict {
        match self.check(capability, mutation, now) {
            Ok(()) => {
                tracing::debug!(
                    target_document = %mutation.target(),
                    actor = %mutation.actor(),
                    capability = %capability.reference(),
                    "mutation accepted"
                );
                Verdict::Accept
            }
            Err(rejection) => {
                tracing::warn!(
                    check = rejection.check(),
                    target_document = %mutation.target(),
                    actor = %mutation.actor(),
                    capability = %capability.reference(),
                    %rejection,
                    "mutation rejected"
                );
                Verdict::Reject(rejection)
            }
        }
    }

    /// [`verify`](Self::verify) against the capability the mutation carries.
    pub fn verify_attached(&self, mutation: &AuthenticatedMutation, now: Timestamp) -> Verdict {
        self.verify(mutation.capability(), mutation, now)
    }

    fn check(
        &self,
        capability: &Capability,
        mutation: &AuthenticatedMutation,
        now: Timestamp,
    ) -> Result<(), Rejection> {
        capability.verify_signature(&self.resolver)?;

        if now < capability.not_before() {
            return Err(Rejection::NotYetValid {
                not_before: capability.not_before(),
                now,
            });
        }
        if now > capability.expiration() {
            return Err(Rejection::Expired {
                expiration: capability.expiration(),
                now,
            });
        }

        if canonical_did(mutation.actor()) != canonical_did(capability.audience()) {
            return Err(Rejection::AudienceMismatch {
                audience: capability.audience().clone(),
                actor: mutation.actor().clone(),
            });
        }

        let target = mutation
            .target()
            .to_resource_in(&self.settings.document_scheme)
            .map_err(|_| Rejection::ScopeNotCovered {
                target: mutation.target().to_resource(),
            })?;
        if !capability.covers(&target, self.settings.allow_wildcards) {
            return Err(Rejection::ScopeNotCovered { target });
        }

        if capability.reference() != mutation.capability().reference() {
            return Err(Rejection::CapabilityMismatch {
                expected: *capability.reference(),
                found: *mutation.capability().reference(),
            });
        }

        let payload = mutation
            .signing_input()
            .map_err(|error| Rejection::BadMutationSignature(error.to_string()))?;
        self.resolver
            .verify(mutation.actor(), &payload, mutation.signature())
            .map_err(|error| Rejection::BadMutationSignature(error.to_string()))
    }
}

/// Verify with default settings and every supported DID method.
///
/// Shorthand for `CapabilityVerifier::new(Settings::default()).verify(..)`.
pub fn verify(capability: &Capability, mutation: &AuthenticatedMutation, now: Timestamp) -> Verdict {
    CapabilityVerifier::new(Settings::default()).verify(capability, mutation, now)
}
