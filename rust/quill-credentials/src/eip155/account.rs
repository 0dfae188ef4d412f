//! Account addresses and `did:pkh:eip155` identifiers.

use super::error::Eip155DidFromStrError;
use quill_varsig::{Did, Principal};
use serde::{Deserialize, Deserializer, Serialize};
use sha3::{Digest, Keccak256};
use std::{fmt, str::FromStr};

/// A 20-byte Ethereum account address.
///
/// Displays with the [EIP-55] mixed-case checksum and parses
/// case-insensitively, so two renderings of the same account compare equal.
///
/// [EIP-55]: https://eips.ethereum.org/EIPS/eip-55
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address([u8; 20]);

impl Address {
    /// The raw address bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// The EIP-55 checksummed form, e.g. `0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed`.
    #[must_use]
    pub fn to_checksum(&self) -> String {
        let lower = hex::encode(self.0);
        let digest = Keccak256::digest(lower.as_bytes());

        let mut out = String::with_capacity(42);
        out.push_str("0x");
        for (index, c) in lower.chars().enumerate() {
            let byte = digest[index / 2];
            let nibble = if index % 2 == 0 { byte >> 4 } else { byte & 0x0f };
            if nibble >= 8 {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
        }
        out
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Address(bytes)
    }
}

impl FromStr for Address {
    type Err = Eip155DidFromStrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or(Eip155DidFromStrError::InvalidAddress)?;
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|_| Eip155DidFromStrError::InvalidAddress)?;
        Ok(Address(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_checksum())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_checksum())
    }
}

/// A [CAIP-10] account on an EIP-155 chain, identified as
/// `did:pkh:eip155:<chain id>:<address>`.
///
/// [CAIP-10]: https://github.com/ChainAgnostic/CAIPs/blob/main/CAIPs/caip-10.md
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Eip155Account {
    chain_id: u64,
    address: Address,
}

impl Eip155Account {
    /// Account `address` on chain `chain_id`.
    #[must_use]
    pub const fn new(chain_id: u64, address: Address) -> Self {
        Self { chain_id, address }
    }

    /// The EIP-155 chain id (1 for Ethereum mainnet).
    #[must_use]
    pub const fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// The account address.
    #[must_use]
    pub const fn address(&self) -> Address {
        self.address
    }
}

impl Principal for Eip155Account {
    fn did(&self) -> Did {
        Did::pkh(
            "eip155",
            &self.chain_id.to_string(),
            &self.address.to_checksum(),
        )
    }
}

impl fmt::Display for Eip155Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.did().as_str())
    }
}

impl FromStr for Eip155Account {
    type Err = Eip155DidFromStrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix("did:pkh:eip155:")
            .ok_or(Eip155DidFromStrError::InvalidDidHeader)?;
        let (chain_id, address) = rest
            .split_once(':')
            .ok_or(Eip155DidFromStrError::InvalidAddress)?;
        if chain_id.is_empty() || !chain_id.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Eip155DidFromStrError::InvalidChainId);
        }
        let chain_id = chain_id
            .parse()
            .map_err(|_| Eip155DidFromStrError::InvalidChainId)?;
        Ok(Self::new(chain_id, address.parse()?))
    }
}

impl Serialize for Eip155Account {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.did().as_str())
    }
}

impl<'de> Deserialize<'de> for Eip155Account {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use testresult::TestResult;

    #[test]
    fn it_renders_eip55_checksums() -> TestResult {
        // Test vectors from EIP-55.
        for expected in [
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
            "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359",
            "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB",
            "0xD1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb",
        ] {
            let address: Address = expected.to_lowercase().parse()?;
            assert_eq!(address.to_checksum(), expected);
        }
        Ok(())
    }

    #[test]
    fn it_compares_addresses_case_insensitively() -> TestResult {
        let upper: Eip155Account = "did:pkh:eip155:1:0x5AAEB6053F3E94C9B9A09F33669435E7EF1BEAED".parse()?;
        let lower: Eip155Account = "did:pkh:eip155:1:0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed".parse()?;
        assert_eq!(upper, lower);
        assert_eq!(
            upper.did().as_str(),
            "did:pkh:eip155:1:0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"
        );
        Ok(())
    }

    #[test]
    fn it_rejects_malformed_account_dids() {
        let cases = [
            ("did:key:z6Mk", Eip155DidFromStrError::InvalidDidHeader),
            ("did:pkh:eip155:one:0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed", Eip155DidFromStrError::InvalidChainId),
            ("did:pkh:eip155:-1:0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed", Eip155DidFromStrError::InvalidChainId),
            ("did:pkh:eip155:1:0x5aaeb6", Eip155DidFromStrError::InvalidAddress),
            ("did:pkh:eip155:1:5aaeb6053f3e94c9b9a09f33669435e7ef1beaed", Eip155DidFromStrError::InvalidAddress),
            ("did:pkh:eip155:1", Eip155DidFromStrError::InvalidAddress),
        ];
        for (input, expected) in cases {
            assert_eq!(input.parse::<Eip155Account>(), Err(expected), "{input}");
        }
    }
}
