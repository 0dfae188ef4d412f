//! Signature algorithm configuration.
//!
//! Each algorithm is identified on the wire by a short sequence of
//! [multicodec] tags: the algorithm prefix followed by its configuration.
//!
//! [multicodec]: https://github.com/multiformats/multicodec

pub mod eddsa;
pub mod eip191;

/// Tags that identify a signature algorithm in an encoded signature header.
pub trait SignatureAlgorithm: Sized + Default {
    /// The leading algorithm tag.
    fn prefix(&self) -> u64;

    /// Tags that follow the prefix (curve, hash, wrapping scheme).
    fn config_tags(&self) -> Vec<u64>;

    /// Try to read this algorithm from the head of `tags`, returning the
    /// unconsumed remainder.
    fn try_from_tags(tags: &[u64]) -> Option<(Self, &[u64])>;

    /// The full tag sequence: prefix followed by configuration tags.
    fn tags(&self) -> Vec<u64> {
        let mut tags = vec![self.prefix()];
        tags.extend(self.config_tags());
        tags
    }
}
