//! Binary encoding of fetch results for transport between nodes.
//!
//! Integers are LEB128 unsigned varints. Strings are a varint byte length followed
//! by UTF-8. Collections are a varint count followed by their items, and optional
//! parts are preceded by a presence byte (0 or 1).

use std::collections::BTreeMap;

use glint_highlight::HighlightOffsets;

use crate::{ChildrenResult, HighlightField, HitHighlights, WireError};

/// Longest encoding of a `u64` varint.
const MAX_VARINT_BYTES: usize = 10;

/// Appends encoded values to a buffer.
#[derive(Debug, Default)]
pub struct WireWriter {
    /// Encoded bytes.
    buf: Vec<u8>,
}

impl WireWriter {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes an unsigned varint.
    pub fn write_vint(&mut self, mut value: u64) {
        while value >= 0x80 {
            self.buf.push((value as u8 & 0x7F) | 0x80);
            value >>= 7;
        }
        self.buf.push(value as u8);
    }

    /// Writes a length or count.
    pub fn write_len(&mut self, len: usize) {
        self.write_vint(len as u64);
    }

    /// Writes a length-prefixed UTF-8 string.
    pub fn write_str(&mut self, s: &str) {
        self.write_len(s.len());
        self.buf.extend_from_slice(s.as_bytes());
    }

    /// Writes a presence byte.
    pub fn write_flag(&mut self, present: bool) {
        self.buf.push(u8::from(present));
    }

    /// Returns the encoded bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Reads encoded values from a byte slice.
#[derive(Debug)]
pub struct WireReader<'a> {
    /// Input bytes.
    bytes: &'a [u8],
    /// Read position.
    pos: usize,
}

impl<'a> WireReader<'a> {
    /// Creates a reader at the start of `bytes`.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    /// Number of bytes not read yet.
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    /// Reads one byte.
    fn read_byte(&mut self) -> Result<u8, WireError> {
        let byte = *self
            .bytes
            .get(self.pos)
            .ok_or(WireError::Truncated(self.pos))?;
        self.pos += 1;
        Ok(byte)
    }

    /// Reads an unsigned varint.
    pub fn read_vint(&mut self) -> Result<u64, WireError> {
        let start = self.pos;
        let mut value = 0u64;
        for i in 0..MAX_VARINT_BYTES {
            let byte = self.read_byte()?;
            let bits = u64::from(byte & 0x7F);
            // The tenth byte may only carry the top bit of a u64.
            if i == MAX_VARINT_BYTES - 1 && bits > 1 {
                return Err(WireError::VarintOverflow(start));
            }
            value |= bits << (7 * i);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(WireError::VarintOverflow(start))
    }

    /// Reads a length or count.
    pub fn read_len(&mut self) -> Result<usize, WireError> {
        let len = self.read_vint()?;
        usize::try_from(len).map_err(|_| WireError::LengthTooLarge(len))
    }

    /// Reads a length-prefixed UTF-8 string.
    pub fn read_string(&mut self) -> Result<String, WireError> {
        let len = self.read_len()?;
        if len > self.remaining() {
            return Err(WireError::Truncated(self.bytes.len()));
        }
        let bytes = self.bytes[self.pos..self.pos + len].to_vec();
        self.pos += len;
        Ok(String::from_utf8(bytes)?)
    }

    /// Reads a presence byte.
    pub fn read_flag(&mut self) -> Result<bool, WireError> {
        match self.read_byte()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(WireError::InvalidFlag(other)),
        }
    }

    /// Reads a count-prefixed sequence.
    fn read_seq<T: Streamable>(&mut self) -> Result<Vec<T>, WireError> {
        let count = self.read_len()?;
        // Every item takes at least one byte.
        if count > self.remaining() {
            return Err(WireError::Truncated(self.bytes.len()));
        }
        (0..count).map(|_| T::read_from(self)).collect()
    }
}

/// A value with a wire encoding.
pub trait Streamable: Sized {
    /// Appends the encoding of `self`.
    fn write_to(&self, out: &mut WireWriter);

    /// Decodes a value.
    fn read_from(input: &mut WireReader<'_>) -> Result<Self, WireError>;
}

/// Encodes a value.
pub fn encode<T: Streamable>(value: &T) -> Vec<u8> {
    let mut out = WireWriter::new();
    value.write_to(&mut out);
    out.into_bytes()
}

/// Decodes a value that spans all of `bytes`.
pub fn decode<T: Streamable>(bytes: &[u8]) -> Result<T, WireError> {
    let mut input = WireReader::new(bytes);
    let value = T::read_from(&mut input)?;
    match input.remaining() {
        0 => Ok(value),
        n => Err(WireError::TrailingBytes(n)),
    }
}

/// Writes a count-prefixed sequence.
fn write_seq<'a, T: Streamable + 'a>(
    out: &mut WireWriter,
    items: impl ExactSizeIterator<Item = &'a T>,
) {
    out.write_len(items.len());
    for item in items {
        item.write_to(out);
    }
}

/// Reads count-prefixed highlight fields into a map keyed by field name.
fn read_field_map(
    input: &mut WireReader<'_>,
) -> Result<BTreeMap<String, HighlightField>, WireError> {
    Ok(input
        .read_seq::<HighlightField>()?
        .into_iter()
        .map(|field| (field.name.clone(), field))
        .collect())
}

impl Streamable for HighlightOffsets {
    fn write_to(&self, out: &mut WireWriter) {
        out.write_len(self.start);
        out.write_len(self.end);
    }

    fn read_from(input: &mut WireReader<'_>) -> Result<Self, WireError> {
        let start = input.read_len()?;
        let end = input.read_len()?;
        Ok(Self::new(start, end))
    }
}

impl Streamable for String {
    fn write_to(&self, out: &mut WireWriter) {
        out.write_str(self);
    }

    fn read_from(input: &mut WireReader<'_>) -> Result<Self, WireError> {
        input.read_string()
    }
}

impl Streamable for HighlightField {
    fn write_to(&self, out: &mut WireWriter) {
        out.write_str(&self.name);
        write_seq(out, self.fragments.iter());
    }

    fn read_from(input: &mut WireReader<'_>) -> Result<Self, WireError> {
        let name = input.read_string()?;
        let fragments = input.read_seq()?;
        Ok(Self { name, fragments })
    }
}

impl Streamable for ChildrenResult {
    fn write_to(&self, out: &mut WireWriter) {
        out.write_str(&self.id);
        out.write_str(&self.doc_type);
        write_seq(out, self.highlight_fields.values());
    }

    fn read_from(input: &mut WireReader<'_>) -> Result<Self, WireError> {
        let id = input.read_string()?;
        let doc_type = input.read_string()?;
        let highlight_fields = read_field_map(input)?;
        Ok(Self {
            doc_type,
            id,
            highlight_fields,
        })
    }
}

impl Streamable for HitHighlights {
    fn write_to(&self, out: &mut WireWriter) {
        out.write_str(&self.doc_type);
        out.write_str(&self.id);
        write_seq(out, self.fields.values());

        out.write_flag(self.offsets.is_some());
        if let Some(offsets) = &self.offsets {
            out.write_len(offsets.len());
            for (field, ranges) in offsets {
                out.write_str(field);
                write_seq(out, ranges.iter());
            }
        }

        out.write_flag(self.children.is_some());
        if let Some(children) = &self.children {
            write_seq(out, children.iter());
        }
    }

    fn read_from(input: &mut WireReader<'_>) -> Result<Self, WireError> {
        let doc_type = input.read_string()?;
        let id = input.read_string()?;
        let fields = read_field_map(input)?;

        let offsets = if input.read_flag()? {
            let count = input.read_len()?;
            let mut offsets = BTreeMap::new();
            for _ in 0..count {
                let field = input.read_string()?;
                offsets.insert(field, input.read_seq()?);
            }
            Some(offsets)
        } else {
            None
        };

        let children = if input.read_flag()? {
            Some(input.read_seq()?)
        } else {
            None
        };

        Ok(Self {
            doc_type,
            id,
            fields,
            offsets,
            children,
        })
    }
}
