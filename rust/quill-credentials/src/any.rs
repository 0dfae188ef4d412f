//! Runtime dispatch over every signature algorithm and DID method quill
//! understands.

use crate::{
    Ed25519KeyResolver, Ed25519ResolveError, Ed25519Verifier, Eip155Account, Eip155ResolveError,
    Eip155Resolver,
};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use quill_varsig::{
    Did, Resolver, Signature, SignatureAlgorithm, Verifier,
    eddsa::{ED25519_TAG, Ed25519, Ed25519Signature},
    eip191::{ECDSA_TAG, Eip191, Eip191Signature},
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use signature::SignatureEncoding;

/// One of the supported signature algorithms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum AnyAlgorithm {
    /// EdDSA over Curve25519.
    #[default]
    Ed25519,
    /// Recoverable secp256k1 ECDSA with `personal_sign` framing.
    Eip191,
}

impl SignatureAlgorithm for AnyAlgorithm {
    fn prefix(&self) -> u64 {
        match self {
            AnyAlgorithm::Ed25519 => Ed25519.prefix(),
            AnyAlgorithm::Eip191 => Eip191.prefix(),
        }
    }

    fn config_tags(&self) -> Vec<u64> {
        match self {
            AnyAlgorithm::Ed25519 => Ed25519.config_tags(),
            AnyAlgorithm::Eip191 => Eip191.config_tags(),
        }
    }

    fn try_from_tags(tags: &[u64]) -> Option<(Self, &[u64])> {
        if let Some((_, rest)) = Ed25519::try_from_tags(tags) {
            return Some((AnyAlgorithm::Ed25519, rest));
        }
        Eip191::try_from_tags(tags).map(|(_, rest)| (AnyAlgorithm::Eip191, rest))
    }
}

/// A signature produced by any [`crate::Authority`].
///
/// Encodes as the algorithm's LEB128 tag sequence followed by the raw
/// signature bytes. Serde uses that encoding directly for binary formats and
/// its unpadded base64url form for human-readable ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnySignature {
    /// Signed by a `did:key` Ed25519 key.
    Ed25519(Ed25519Signature),
    /// Signed by a `did:pkh:eip155` account.
    Eip191(Eip191Signature),
}

impl AnySignature {
    /// The algorithm that produced this signature.
    #[must_use]
    pub const fn algorithm(&self) -> AnyAlgorithm {
        match self {
            AnySignature::Ed25519(_) => AnyAlgorithm::Ed25519,
            AnySignature::Eip191(_) => AnyAlgorithm::Eip191,
        }
    }

    /// The signature bytes without the algorithm header.
    #[must_use]
    pub fn raw_bytes(&self) -> &[u8] {
        match self {
            AnySignature::Ed25519(signature) => &signature.as_bytes()[..],
            AnySignature::Eip191(signature) => &signature.as_bytes()[..],
        }
    }

    /// Encode as algorithm tags followed by the raw signature.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.raw_bytes().len() + 8);
        for tag in self.algorithm().tags() {
            // Writing into a Vec cannot fail.
            let _ = leb128::write::unsigned(&mut out, tag);
        }
        out.extend_from_slice(self.raw_bytes());
        out
    }
}

impl From<Ed25519Signature> for AnySignature {
    fn from(signature: Ed25519Signature) -> Self {
        AnySignature::Ed25519(signature)
    }
}

impl From<Eip191Signature> for AnySignature {
    fn from(signature: Eip191Signature) -> Self {
        AnySignature::Eip191(signature)
    }
}

impl TryFrom<&[u8]> for AnySignature {
    type Error = signature::Error;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let mut rest = bytes;
        let prefix = leb128::read::unsigned(&mut rest).map_err(|_| signature::Error::new())?;
        let tag_count = match prefix {
            ED25519_TAG => AnyAlgorithm::Ed25519.tags().len(),
            ECDSA_TAG => AnyAlgorithm::Eip191.tags().len(),
            _ => return Err(signature::Error::new()),
        };

        let mut tags = vec![prefix];
        for _ in 1..tag_count {
            tags.push(leb128::read::unsigned(&mut rest).map_err(|_| signature::Error::new())?);
        }

        match AnyAlgorithm::try_from_tags(&tags) {
            Some((AnyAlgorithm::Ed25519, [])) => {
                Ok(AnySignature::Ed25519(Ed25519Signature::try_from(rest)?))
            }
            Some((AnyAlgorithm::Eip191, [])) => {
                Ok(AnySignature::Eip191(Eip191Signature::try_from(rest)?))
            }
            _ => Err(signature::Error::new()),
        }
    }
}

impl From<AnySignature> for Vec<u8> {
    fn from(signature: AnySignature) -> Self {
        signature.to_vec()
    }
}

impl SignatureEncoding for AnySignature {
    type Repr = Vec<u8>;
}

impl Signature for AnySignature {
    type Algorithm = AnyAlgorithm;
}

impl Serialize for AnySignature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&URL_SAFE_NO_PAD.encode(self.to_vec()))
        } else {
            serializer.serialize_bytes(&self.to_vec())
        }
    }
}

impl<'de> Deserialize<'de> for AnySignature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bytes = if deserializer.is_human_readable() {
            let encoded = String::deserialize(deserializer)?;
            URL_SAFE_NO_PAD
                .decode(encoded)
                .map_err(serde::de::Error::custom)?
        } else {
            serde_bytes::ByteBuf::deserialize(deserializer)?.into_vec()
        };
        AnySignature::try_from(bytes.as_slice())
            .map_err(|_| serde::de::Error::custom("unrecognized signature encoding"))
    }
}

/// The verifier a [`DidResolver`] produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnyVerifier {
    /// A `did:key` Ed25519 public key.
    Ed25519(Ed25519Verifier),
    /// A `did:pkh:eip155` account.
    Eip155(Eip155Account),
}

impl Verifier<AnySignature> for AnyVerifier {
    fn verify(&self, payload: &[u8], signature: &AnySignature) -> Result<(), signature::Error> {
        match (self, signature) {
            (AnyVerifier::Ed25519(key), AnySignature::Ed25519(signature)) => {
                key.verify(payload, signature)
            }
            (AnyVerifier::Eip155(account), AnySignature::Eip191(signature)) => {
                account.verify(payload, signature)
            }
            // A key can only vouch for signatures of its own kind.
            _ => Err(signature::Error::new()),
        }
    }
}

/// Errors from [`DidResolver`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DidResolveError {
    /// The DID method is not one quill can verify.
    #[error("unsupported DID method: {0}")]
    UnsupportedMethod(String),

    /// The `did:key` is malformed or not an Ed25519 key.
    #[error(transparent)]
    Ed25519(#[from] Ed25519ResolveError),

    /// The `did:pkh` is malformed or not an EIP-155 account.
    #[error(transparent)]
    Eip155(#[from] Eip155ResolveError),
}

/// Resolves any supported DID to an [`AnyVerifier`], dispatching on the
/// DID method.
#[derive(Debug, Clone, Copy, Default)]
pub struct DidResolver {
    ed25519: Ed25519KeyResolver,
    eip155: Eip155Resolver,
}

impl Resolver<AnySignature> for DidResolver {
    type Error = DidResolveError;
    type Verifier = AnyVerifier;

    fn resolve(&self, did: &Did) -> Result<AnyVerifier, Self::Error> {
        match did.method() {
            "key" => Ok(AnyVerifier::Ed25519(
                Resolver::<Ed25519Signature>::resolve(&self.ed25519, did)?,
            )),
            "pkh" => Ok(AnyVerifier::Eip155(
                Resolver::<Eip191Signature>::resolve(&self.eip155, did)?,
            )),
            other => Err(DidResolveError::UnsupportedMethod(other.to_string())),
        }
    }
}

/// Normalizes a DID so that two spellings of the same identity compare
/// equal.
///
/// `did:pkh:eip155` addresses are case-insensitive and are rewritten to
/// their EIP-55 form; every other DID is returned unchanged.
#[must_use]
pub fn canonical_did(did: &Did) -> Did {
    use quill_varsig::Principal;

    match did.as_str().parse::<Eip155Account>() {
        Ok(account) => account.did(),
        Err(_) => did.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Ed25519Signer, LocalWallet};
    use pretty_assertions::assert_eq;
    use quill_varsig::{Principal, Signer};
    use testresult::TestResult;

    async fn ed25519_signature() -> TestResult<(Did, AnySignature)> {
        let signer = Ed25519Signer::import(&[1u8; 32])?;
        Ok((signer.did(), signer.sign(b"payload").await?.into()))
    }

    fn eip191_signature() -> TestResult<(Did, AnySignature)> {
        let wallet = LocalWallet::from_seed(&[1u8; 32], 1)?;
        let signature = wallet.sign_personal(&crate::signing_statement(b"payload"))?;
        Ok((wallet.account().did(), signature.into()))
    }

    #[tokio::test]
    async fn it_encodes_signatures_with_their_algorithm() -> TestResult {
        let (_, ed) = ed25519_signature().await?;
        let (_, eth) = eip191_signature()?;

        for signature in [ed, eth] {
            let bytes = signature.to_vec();
            assert_eq!(AnySignature::try_from(bytes.as_slice())?, signature);
        }
        assert_eq!(&ed.to_vec()[..3], &[0xed, 0x01, 0x13]);
        Ok(())
    }

    #[test]
    fn it_rejects_unknown_or_truncated_encodings() -> TestResult {
        let (_, eth) = eip191_signature()?;
        let bytes = eth.to_vec();
        assert!(AnySignature::try_from(&bytes[..bytes.len() - 1]).is_err());
        assert!(AnySignature::try_from(&[0x12, 0x00][..]).is_err());
        assert!(AnySignature::try_from(&[][..]).is_err());
        Ok(())
    }

    #[tokio::test]
    async fn it_serializes_as_text_or_bytes() -> TestResult {
        let (_, signature) = ed25519_signature().await?;

        let json = serde_json::to_string(&signature)?;
        assert!(json.starts_with('"'));
        assert_eq!(serde_json::from_str::<AnySignature>(&json)?, signature);

        let cbor = serde_ipld_dagcbor::to_vec(&signature)?;
        assert_eq!(serde_ipld_dagcbor::from_slice::<AnySignature>(&cbor)?, signature);
        Ok(())
    }

    #[tokio::test]
    async fn it_resolves_each_method_to_its_verifier() -> TestResult {
        let resolver = DidResolver::default();

        let (key_did, ed) = ed25519_signature().await?;
        let (pkh_did, eth) = eip191_signature()?;

        resolver.verify(&key_did, b"payload", &ed)?;
        resolver.verify(&pkh_did, b"payload", &eth)?;

        // A signature of the wrong kind never verifies.
        assert!(resolver.verify(&key_did, b"payload", &eth).is_err());
        assert!(resolver.verify(&pkh_did, b"payload", &ed).is_err());
        Ok(())
    }

    #[test]
    fn it_refuses_unknown_methods() {
        let did: Did = "did:web:example.com".parse().unwrap();
        assert_eq!(
            DidResolver::default().resolve(&did),
            Err(DidResolveError::UnsupportedMethod("web".into()))
        );
    }

    #[test]
    fn it_canonicalizes_account_dids() {
        let lower: Did = "did:pkh:eip155:1:0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed"
            .parse()
            .unwrap();
        assert_eq!(
            canonical_did(&lower).as_str(),
            "did:pkh:eip155:1:0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"
        );

        let key: Did = "did:key:z6MkhaXgBZDvotDkL5257faiztiGiC2QtKLGpbnnEGta2doK"
            .parse()
            .unwrap();
        assert_eq!(canonical_did(&key), key);
    }
}
