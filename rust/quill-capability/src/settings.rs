//! Verifier and issuer configuration.

use crate::document::DOCUMENT_SCHEME;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables shared by issuers, verifiers, and stores.
///
/// Every field has a default, so a configuration file only needs to name
/// what it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Scheme used to turn a document identifier into a resource URI.
    pub document_scheme: String,
    /// Lifetime of newly issued capabilities, in seconds.
    pub capability_ttl_secs: u64,
    /// How long to wait on an external signer, in seconds.
    pub signer_timeout_secs: u64,
    /// Whether resources ending in `*` match by prefix. Off by default:
    /// only exact resources are honored.
    pub allow_wildcards: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            document_scheme: DOCUMENT_SCHEME.to_string(),
            capability_ttl_secs: 3600,
            signer_timeout_secs: 120,
            allow_wildcards: false,
        }
    }
}

impl Settings {
    /// Lifetime of newly issued capabilities.
    pub fn capability_ttl(&self) -> Duration {
        Duration::from_secs(self.capability_ttl_secs)
    }

    /// Timeout for external signer requests.
    pub fn signer_timeout(&self) -> Duration {
        Duration::from_secs(self.signer_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use testresult::TestResult;

    #[test]
    fn partial_files_keep_the_defaults() -> TestResult {
        let settings: Settings = toml::from_str("allow_wildcards = true\n")?;
        assert_eq!(
            settings,
            Settings {
                allow_wildcards: true,
                ..Settings::default()
            }
        );
        assert_eq!(settings.capability_ttl(), Duration::from_secs(3600));
        Ok(())
    }
}
