//! Key export types.

/// Secret key material for import/export.
///
/// Only raw seeds are supported: every backend quill ships keeps its secret
/// in process memory.
#[derive(Clone, PartialEq, Eq)]
pub enum KeyExport {
    /// Raw seed bytes.
    Extractable(Vec<u8>),
}

impl KeyExport {
    /// The exported seed bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            KeyExport::Extractable(bytes) => bytes,
        }
    }
}

impl From<&[u8; 32]> for KeyExport {
    fn from(seed: &[u8; 32]) -> Self {
        KeyExport::Extractable(seed.to_vec())
    }
}

impl From<[u8; 32]> for KeyExport {
    fn from(seed: [u8; 32]) -> Self {
        KeyExport::Extractable(seed.to_vec())
    }
}

impl std::fmt::Debug for KeyExport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyExport::Extractable(bytes) => f
                .debug_tuple("Extractable")
                .field(&format_args!("<{} bytes redacted>", bytes.len()))
                .finish(),
        }
    }
}
