//! Resource URIs and scope matching.

use crate::CapabilityError;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Marks a resource as a prefix pattern when it is the final character.
pub const WILDCARD: char = '*';

/// A resource a capability can grant access to, written `<scheme>:<rest>`.
///
/// Documents are addressed as `doc:<document identifier>`. A resource that
/// ends in `*` is a prefix pattern (for example `doc:*`); patterns only
/// match when the verifier is configured to honor them.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceUri(String);

impl ResourceUri {
    /// Parse and validate a resource URI.
    ///
    /// # Errors
    ///
    /// Returns [`CapabilityError::InvalidInput`] if the scheme is missing or
    /// malformed, the remainder is empty or contains whitespace or control
    /// characters, or `*` appears anywhere but at the end.
    pub fn new(uri: impl Into<String>) -> Result<Self, CapabilityError> {
        let uri = uri.into();
        let invalid = |reason: &str| CapabilityError::InvalidInput(format!("{reason}: {uri:?}"));

        let Some((scheme, rest)) = uri.split_once(':') else {
            return Err(invalid("resource URI has no scheme"));
        };
        if !is_valid_scheme(scheme) {
            return Err(invalid("invalid resource URI scheme"));
        }
        if rest.is_empty() {
            return Err(invalid("resource URI has nothing after the scheme"));
        }
        if rest.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(invalid("resource URI contains whitespace or control characters"));
        }
        if rest
            .char_indices()
            .any(|(index, c)| c == WILDCARD && index + 1 != rest.len())
        {
            return Err(invalid("'*' may only end a resource URI"));
        }
        Ok(Self(uri))
    }

    /// Join a known-good scheme and remainder without re-validating them.
    pub(crate) fn from_parts(scheme: &str, rest: &str) -> Self {
        Self(format!("{scheme}:{rest}"))
    }

    /// The URI scheme (before the first `:`).
    pub fn scheme(&self) -> &str {
        self.0.split_once(':').map_or("", |(scheme, _)| scheme)
    }

    /// The full URI.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this resource is a prefix pattern.
    pub fn is_pattern(&self) -> bool {
        self.0.ends_with(WILDCARD)
    }

    /// Whether this resource grants access to `target`.
    ///
    /// Matching is exact string equality. When `allow_wildcards` is set, a
    /// pattern additionally covers every resource that starts with the
    /// pattern's text before the `*`; since the scheme is part of that text
    /// a pattern never crosses schemes. A pattern is never a valid target.
    pub fn covers(&self, target: &ResourceUri, allow_wildcards: bool) -> bool {
        if target.is_pattern() {
            return false;
        }
        if self == target {
            return true;
        }
        if !allow_wildcards || !self.is_pattern() {
            return false;
        }
        let prefix = &self.0[..self.0.len() - WILDCARD.len_utf8()];
        target.0.starts_with(prefix)
    }
}

fn is_valid_scheme(scheme: &str) -> bool {
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '+' | '.' | '-'))
}

impl FromStr for ResourceUri {
    type Err = CapabilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceUri::new(s)
    }
}

impl TryFrom<String> for ResourceUri {
    type Error = CapabilityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ResourceUri::new(value)
    }
}

impl From<ResourceUri> for String {
    fn from(uri: ResourceUri) -> Self {
        uri.0
    }
}

impl fmt::Display for ResourceUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
