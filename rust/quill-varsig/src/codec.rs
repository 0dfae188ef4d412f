//! Canonical payload encoding.
//!
//! Every signature in quill is computed over a [`CanonicalPayload`]: a
//! domain tag plus a map of field name → [`Field`], encoded by
//! [`CanonicalCodec`]. The encoding is a pure function of the logical
//! payload, so two independent implementations produce byte-identical
//! signing input:
//!
//! ```text
//! payload := bytes("quill/1") bytes(domain) varint(field count) field*
//! field   := bytes(name) value
//! value   := 0x01 bytes(utf-8 text)
//!          | 0x02 varint(integer)
//!          | 0x03 bytes(raw bytes)
//!          | 0x04 varint(element count) value*
//! bytes   := varint(length) length*u8
//! ```
//!
//! Varints are unsigned LEB128. Fields are written in ascending byte order
//! of their names; every variable-length part is length prefixed, so no
//! delimiter is ever ambiguous.

use std::{
    collections::BTreeMap,
    error::Error,
    io::{self, BufRead, Write},
};

/// Leading bytes of every canonical payload.
pub const CANONICAL_MAGIC: &[u8] = b"quill/1";

const TEXT_TAG: u8 = 0x01;
const INTEGER_TAG: u8 = 0x02;
const BYTES_TAG: u8 = 0x03;
const LIST_TAG: u8 = 0x04;

const MAX_LIST_DEPTH: usize = 4;

/// Codec trait for encoding and decoding payloads.
///
/// Specifically this allows an application to accept multiple codecs
/// and distinguish with a runtime enum, since a verifier must re-encode a
/// payload exactly as the signer did.
pub trait Codec<T> {
    /// Encoding error type.
    type EncodingError: Error;

    /// Decoding error type.
    type DecodingError: Error;

    /// Encode the payload to the given buffer.
    ///
    /// # Errors
    ///
    /// If the encoding fails, it returns an error of type `Self::EncodingError`.
    fn encode_payload<W: Write>(
        &self,
        payload: &T,
        buffer: &mut W,
    ) -> Result<(), Self::EncodingError>;

    /// Decode the payload from the given reader.
    ///
    /// # Errors
    ///
    /// If the decoding fails, it returns an error of type `Self::DecodingError`.
    fn decode_payload<R: BufRead>(&self, reader: &mut R) -> Result<T, Self::DecodingError>;
}

/// A single value in a [`CanonicalPayload`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    /// UTF-8 text.
    Text(String),
    /// An unsigned integer.
    Integer(u64),
    /// Opaque bytes.
    Bytes(Vec<u8>),
    /// An ordered list of values.
    List(Vec<Field>),
}

impl From<&str> for Field {
    fn from(value: &str) -> Self {
        Field::Text(value.to_string())
    }
}

impl From<String> for Field {
    fn from(value: String) -> Self {
        Field::Text(value)
    }
}

impl From<u64> for Field {
    fn from(value: u64) -> Self {
        Field::Integer(value)
    }
}

impl From<&[u8]> for Field {
    fn from(value: &[u8]) -> Self {
        Field::Bytes(value.to_vec())
    }
}

impl From<Vec<Field>> for Field {
    fn from(value: Vec<Field>) -> Self {
        Field::List(value)
    }
}

/// A domain-separated, field-sorted signing payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalPayload {
    domain: String,
    fields: BTreeMap<String, Field>,
}

impl CanonicalPayload {
    /// Start an empty payload for the given signing domain
    /// (e.g. `"capability"`).
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Add (or replace) a field.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Field>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Add a field only when `value` is present.
    #[must_use]
    pub fn with_optional(self, name: impl Into<String>, value: Option<impl Into<Field>>) -> Self {
        match value {
            Some(value) => self.with(name, value),
            None => self,
        }
    }

    /// The signing domain.
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Look up a field by name.
    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    /// Fields in canonical (ascending name) order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.fields.iter().map(|(name, field)| (name.as_str(), field))
    }

    /// Encode with [`CanonicalCodec`].
    ///
    /// # Errors
    ///
    /// Only fails if a length does not fit in a varint, which cannot happen
    /// for in-memory values on supported targets.
    pub fn to_bytes(&self) -> Result<Vec<u8>, io::Error> {
        let mut buffer = Vec::new();
        CanonicalCodec.encode_payload(self, &mut buffer)?;
        Ok(buffer)
    }
}

/// Errors produced while decoding a canonical payload.
#[derive(Debug, thiserror::Error)]
pub enum CanonicalDecodeError {
    /// The payload does not start with [`CANONICAL_MAGIC`].
    #[error("missing canonical payload header")]
    MissingMagic,

    /// The input ended before the payload was complete.
    #[error("unexpected end of payload")]
    UnexpectedEnd,

    /// A text value or field name is not valid UTF-8.
    #[error("invalid utf-8 in payload")]
    InvalidUtf8,

    /// A value carries an unknown type tag.
    #[error("unknown value tag {0:#04x}")]
    UnknownTag(u8),

    /// Field names are not strictly ascending.
    #[error("field {0:?} is out of canonical order")]
    OutOfOrder(String),

    /// Lists nest deeper than the codec allows.
    #[error("lists nested too deeply")]
    TooDeep,

    /// Bytes remain after the last field.
    #[error("{0} trailing bytes after payload")]
    TrailingBytes(usize),

    /// A varint is malformed or overflows.
    #[error("malformed varint: {0}")]
    Varint(String),

    /// The underlying reader failed.
    #[error("read failed: {0}")]
    Io(#[from] io::Error),
}

/// The canonical field codec described in the [module docs](self).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CanonicalCodec;

impl CanonicalCodec {
    /// Decode a payload from a byte slice, rejecting trailing bytes.
    ///
    /// # Errors
    ///
    /// Returns a [`CanonicalDecodeError`] if the bytes are not a canonical
    /// payload.
    pub fn from_slice(&self, bytes: &[u8]) -> Result<CanonicalPayload, CanonicalDecodeError> {
        let mut reader = SliceReader { bytes, position: 0 };

        if reader.read_bytes()? != CANONICAL_MAGIC {
            return Err(CanonicalDecodeError::MissingMagic);
        }

        let domain = reader.read_text()?;
        let count = reader.read_varint()?;
        let mut fields = BTreeMap::new();
        let mut previous: Option<String> = None;

        for _ in 0..count {
            let name = reader.read_text()?;
            if previous.as_deref().is_some_and(|prior| prior >= name.as_str()) {
                return Err(CanonicalDecodeError::OutOfOrder(name));
            }
            let value = reader.read_field(0)?;
            previous = Some(name.clone());
            fields.insert(name, value);
        }

        let remaining = bytes.len() - reader.position;
        if remaining > 0 {
            return Err(CanonicalDecodeError::TrailingBytes(remaining));
        }

        Ok(CanonicalPayload { domain, fields })
    }
}

impl Codec<CanonicalPayload> for CanonicalCodec {
    type EncodingError = io::Error;
    type DecodingError = CanonicalDecodeError;

    fn encode_payload<W: Write>(
        &self,
        payload: &CanonicalPayload,
        buffer: &mut W,
    ) -> Result<(), Self::EncodingError> {
        write_bytes(buffer, CANONICAL_MAGIC)?;
        write_bytes(buffer, payload.domain.as_bytes())?;
        write_varint(buffer, payload.fields.len())?;
        for (name, value) in &payload.fields {
            write_bytes(buffer, name.as_bytes())?;
            write_field(buffer, value)?;
        }
        Ok(())
    }

    fn decode_payload<R: BufRead>(
        &self,
        reader: &mut R,
    ) -> Result<CanonicalPayload, Self::DecodingError> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        self.from_slice(&bytes)
    }
}

fn write_varint<W: Write>(buffer: &mut W, value: usize) -> io::Result<()> {
    let value = u64::try_from(value)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    leb128::write::unsigned(buffer, value)?;
    Ok(())
}

fn write_bytes<W: Write>(buffer: &mut W, bytes: &[u8]) -> io::Result<()> {
    write_varint(buffer, bytes.len())?;
    buffer.write_all(bytes)
}

fn write_field<W: Write>(buffer: &mut W, field: &Field) -> io::Result<()> {
    match field {
        Field::Text(text) => {
            buffer.write_all(&[TEXT_TAG])?;
            write_bytes(buffer, text.as_bytes())
        }
        Field::Integer(value) => {
            buffer.write_all(&[INTEGER_TAG])?;
            leb128::write::unsigned(buffer, *value)?;
            Ok(())
        }
        Field::Bytes(bytes) => {
            buffer.write_all(&[BYTES_TAG])?;
            write_bytes(buffer, bytes)
        }
        Field::List(items) => {
            buffer.write_all(&[LIST_TAG])?;
            write_varint(buffer, items.len())?;
            for item in items {
                write_field(buffer, item)?;
            }
            Ok(())
        }
    }
}

struct SliceReader<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> SliceReader<'a> {
    fn read_varint(&mut self) -> Result<u64, CanonicalDecodeError> {
        let mut rest = &self.bytes[self.position..];
        let before = rest.len();
        let value = leb128::read::unsigned(&mut rest).map_err(|e| match e {
            leb128::read::Error::IoError(_) => CanonicalDecodeError::UnexpectedEnd,
            leb128::read::Error::Overflow => CanonicalDecodeError::Varint(e.to_string()),
        })?;
        self.position += before - rest.len();
        Ok(value)
    }

    fn take(&mut self, length: u64) -> Result<&'a [u8], CanonicalDecodeError> {
        let length = usize::try_from(length).map_err(|_| CanonicalDecodeError::UnexpectedEnd)?;
        let end = self
            .position
            .checked_add(length)
            .filter(|end| *end <= self.bytes.len())
            .ok_or(CanonicalDecodeError::UnexpectedEnd)?;
        let slice = &self.bytes[self.position..end];
        self.position = end;
        Ok(slice)
    }

    fn read_bytes(&mut self) -> Result<&'a [u8], CanonicalDecodeError> {
        let length = self.read_varint()?;
        self.take(length)
    }

    fn read_text(&mut self) -> Result<String, CanonicalDecodeError> {
        let bytes = self.read_bytes()?;
        String::from_utf8(bytes.to_vec()).map_err(|_| CanonicalDecodeError::InvalidUtf8)
    }

    fn read_field(&mut self, depth: usize) -> Result<Field, CanonicalDecodeError> {
        let tag = *self.take(1)?.first().ok_or(CanonicalDecodeError::UnexpectedEnd)?;
        match tag {
            TEXT_TAG => Ok(Field::Text(self.read_text()?)),
            INTEGER_TAG => Ok(Field::Integer(self.read_varint()?)),
            BYTES_TAG => Ok(Field::Bytes(self.read_bytes()?.to_vec())),
            LIST_TAG => {
                if depth >= MAX_LIST_DEPTH {
                    return Err(CanonicalDecodeError::TooDeep);
                }
                let count = self.read_varint()?;
                let mut items = Vec::new();
                for _ in 0..count {
                    items.push(self.read_field(depth + 1)?);
                }
                Ok(Field::List(items))
            }
            other => Err(CanonicalDecodeError::UnknownTag(other)),
        }
    }
}
