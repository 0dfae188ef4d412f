//! Decentralized identifiers.
//!
//! Quill names every party by a DID: native keys as `did:key`, wallet
//! accounts as `did:pkh`. A [`Did`] only guarantees the generic
//! `did:<method>:<id>` shape; whether the identifier resolves to key
//! material is up to a [`Resolver`](crate::Resolver).

use base58::ToBase58;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// A syntactically valid [DID](https://www.w3.org/TR/did-core/) string.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Did(String);

impl Did {
    /// `did:key` for a multicodec-prefixed public key, base58btc encoded.
    #[must_use]
    pub fn key(multicodec_key: &[u8]) -> Self {
        Did(format!("did:key:z{}", multicodec_key.to_base58()))
    }

    /// `did:pkh` for a [CAIP-10] account, e.g. `("eip155", "1", "0xab16...")`.
    ///
    /// [CAIP-10]: https://github.com/ChainAgnostic/CAIPs/blob/main/CAIPs/caip-10.md
    #[must_use]
    pub fn pkh(namespace: &str, reference: &str, address: &str) -> Self {
        Did(format!("did:pkh:{namespace}:{reference}:{address}"))
    }

    /// The DID as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The method name, `key` for `did:key:...`.
    #[must_use]
    pub fn method(&self) -> &str {
        self.parts().0
    }

    /// Everything after `did:<method>:`.
    #[must_use]
    pub fn method_specific_id(&self) -> &str {
        self.parts().1
    }

    fn parts(&self) -> (&str, &str) {
        // Parsing guarantees the prefix and the separator.
        self.0
            .get("did:".len()..)
            .and_then(|rest| rest.split_once(':'))
            .unwrap_or_default()
    }
}

impl fmt::Debug for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Did({})", self.0)
    }
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Why a string is not a DID.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DidParseError {
    /// The string does not start with `did:`.
    #[error("{0:?} does not start with \"did:\"")]
    MissingScheme(String),
    /// The method is empty or not lowercase alphanumeric.
    #[error("{0:?} has an invalid method")]
    InvalidMethod(String),
    /// The method-specific identifier is empty or contains whitespace or
    /// control characters.
    #[error("{0:?} has an invalid identifier")]
    InvalidIdentifier(String),
}

impl FromStr for Did {
    type Err = DidParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix("did:")
            .ok_or_else(|| DidParseError::MissingScheme(s.into()))?;
        let (method, id) = rest
            .split_once(':')
            .ok_or_else(|| DidParseError::InvalidIdentifier(s.into()))?;

        let method_ok = !method.is_empty()
            && method
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit());
        if !method_ok {
            return Err(DidParseError::InvalidMethod(s.into()));
        }
        if id.is_empty() || id.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(DidParseError::InvalidIdentifier(s.into()));
        }
        Ok(Did(s.to_string()))
    }
}

impl TryFrom<String> for Did {
    type Error = DidParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Did> for String {
    fn from(did: Did) -> Self {
        did.0
    }
}
