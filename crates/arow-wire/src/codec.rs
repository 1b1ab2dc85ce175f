// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Byte-level writer and reader.
//!
//! Keys and lengths are ULEB128 varints so the end-of-record marker is a single `0x00`;
//! scalars are fixed-width little-endian. The field-level primitives generated code calls
//! (`write_i32(key, v)`, `read_i32()`, ...) live in [`crate::scalar`].

use thiserror::Error;

use crate::key::WireKey;
use crate::tag::DataTypeTag;

/// Default bound for string, byte and array lengths (16 MiB).
pub const DEFAULT_MAX_LEN: usize = 16 * 1024 * 1024;

/// Default bound for nested record depth.
pub const DEFAULT_MAX_DEPTH: usize = 64;

const MAX_VARINT_BYTES: usize = 10;

/// Errors produced by codec readers and writers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodecError {
    /// Attempted to read beyond the end of the buffer.
    #[error("buffer too short")]
    OutOfBounds,
    /// UTF-8 decoding failed.
    #[error("invalid utf-8")]
    InvalidUtf8,
    /// A `char` payload is not a Unicode scalar value.
    #[error("invalid char scalar {0:#x}")]
    InvalidChar(u32),
    /// A `bool` payload is neither 0 nor 1.
    #[error("invalid bool byte {0:#x}")]
    InvalidBool(u8),
    /// Length prefix exceeded the reader's bound, or a length does not fit the wire.
    #[error("length too large")]
    LengthTooLarge,
    /// Varint ran past 10 bytes or overflowed 64 bits.
    #[error("varint overflow")]
    VarintOverflow,
    /// Tag byte is not a known [`DataTypeTag`].
    #[error("unknown data type tag {0:#x}")]
    UnknownTag(u8),
    /// Timestamp outside the representable range.
    #[error("invalid date-time {0} ns")]
    InvalidDateTime(i128),
    /// Time span whose nanosecond part is not below one second.
    #[error("invalid time span {secs}s + {nanos}ns")]
    InvalidTimeSpan {
        /// Whole seconds read from the wire.
        secs: u64,
        /// Sub-second part read from the wire.
        nanos: u32,
    },
    /// Nested records exceeded the reader's depth bound.
    #[error("nesting deeper than {0} records")]
    NestingTooDeep(usize),
    /// No serializer pair registered for the row type.
    #[error("no serialization core registered for {0}")]
    UnregisteredType(&'static str),
    /// Bytes remain after the top-level record.
    #[error("{0} trailing bytes after end of record")]
    TrailingBytes(usize),
}

/// Growable byte sink.
#[derive(Debug, Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    /// Create a writer with a pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Bytes written so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consume the writer and return the buffer.
    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        self.buf
    }

    /// Write raw bytes.
    pub fn write_raw_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Write a single byte.
    pub fn write_raw_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    /// Write an unsigned LEB128 varint.
    pub fn write_varint(&mut self, mut value: u64) {
        loop {
            let low = (value & 0x7F) as u8;
            value >>= 7;
            if value == 0 {
                self.buf.push(low);
                return;
            }
            self.buf.push(low | 0x80);
        }
    }

    /// Write a length prefix.
    pub fn write_len(&mut self, len: usize) -> Result<(), CodecError> {
        let len = u64::try_from(len).map_err(|_| CodecError::LengthTooLarge)?;
        self.write_varint(len);
        Ok(())
    }

    /// Write length-prefixed bytes.
    pub fn write_len_prefixed(&mut self, bytes: &[u8]) -> Result<(), CodecError> {
        self.write_len(bytes.len())?;
        self.write_raw_bytes(bytes);
        Ok(())
    }

    /// Write a field key.
    pub fn write_name(&mut self, key: WireKey) {
        self.write_varint(key.0);
    }

    /// Write a data type tag.
    pub fn write_tag(&mut self, tag: DataTypeTag) {
        self.write_raw_u8(tag.code());
    }

    /// Write a key and its tag.
    pub fn write_header(&mut self, key: WireKey, tag: DataTypeTag) {
        self.write_name(key);
        self.write_tag(tag);
    }

    /// Write an explicit null for `key`.
    pub fn write_null(&mut self, key: WireKey) {
        self.write_header(key, DataTypeTag::Null);
    }

    /// Terminate the current record.
    pub fn write_end(&mut self) {
        self.write_name(WireKey::END);
    }
}

/// Bounds a [`Reader`] enforces on untrusted input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderLimits {
    /// Largest accepted string/bytes/array length.
    pub max_len: usize,
    /// Deepest accepted record nesting.
    pub max_depth: usize,
}

impl Default for ReaderLimits {
    fn default() -> Self {
        Self {
            max_len: DEFAULT_MAX_LEN,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Cursor over an encoded byte slice.
#[derive(Debug)]
pub struct Reader<'a> {
    bytes: &'a [u8],
    offset: usize,
    depth: usize,
    limits: ReaderLimits,
}

impl<'a> Reader<'a> {
    /// Create a reader with default limits.
    #[must_use]
    pub fn new(bytes: &'a [u8]) -> Self {
        Self::with_limits(bytes, ReaderLimits::default())
    }

    /// Create a reader with explicit limits.
    #[must_use]
    pub fn with_limits(bytes: &'a [u8], limits: ReaderLimits) -> Self {
        Self {
            bytes,
            offset: 0,
            depth: 0,
            limits,
        }
    }

    /// Current byte offset.
    pub fn position(&self) -> usize {
        self.offset
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }

    /// Fail unless every byte has been consumed.
    pub fn finish(&self) -> Result<(), CodecError> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(CodecError::TrailingBytes(n)),
        }
    }

    /// Take the next `len` raw bytes.
    pub fn take(&mut self, len: usize) -> Result<&'a [u8], CodecError> {
        let end = self
            .offset
            .checked_add(len)
            .ok_or(CodecError::OutOfBounds)?;
        if end > self.bytes.len() {
            return Err(CodecError::OutOfBounds);
        }
        let out = &self.bytes[self.offset..end];
        self.offset = end;
        Ok(out)
    }

    /// Take exactly `N` raw bytes.
    pub fn take_array<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        let chunk = self.take(N)?;
        chunk.try_into().map_err(|_| CodecError::OutOfBounds)
    }

    /// Read a single raw byte.
    pub fn read_raw_u8(&mut self) -> Result<u8, CodecError> {
        let [b] = self.take_array::<1>()?;
        Ok(b)
    }

    /// Read an unsigned LEB128 varint.
    pub fn read_varint(&mut self) -> Result<u64, CodecError> {
        let mut value = 0u64;
        for i in 0..MAX_VARINT_BYTES {
            let byte = self.read_raw_u8()?;
            let bits = u64::from(byte & 0x7F);
            let shift = 7 * i;
            if shift == 63 && bits > 1 {
                return Err(CodecError::VarintOverflow);
            }
            value |= bits << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(CodecError::VarintOverflow)
    }

    /// Read a length prefix, bounded by [`ReaderLimits::max_len`].
    pub fn read_len(&mut self) -> Result<usize, CodecError> {
        let raw = self.read_varint()?;
        let len = usize::try_from(raw).map_err(|_| CodecError::LengthTooLarge)?;
        if len > self.limits.max_len {
            return Err(CodecError::LengthTooLarge);
        }
        Ok(len)
    }

    /// Read a length-prefixed byte slice.
    pub fn read_len_prefixed(&mut self) -> Result<&'a [u8], CodecError> {
        let len = self.read_len()?;
        self.take(len)
    }

    /// Read a field key.
    pub fn read_name(&mut self) -> Result<WireKey, CodecError> {
        self.read_varint().map(WireKey)
    }

    /// Read a data type tag.
    pub fn read_tag(&mut self) -> Result<DataTypeTag, CodecError> {
        DataTypeTag::try_from(self.read_raw_u8()?)
    }

    /// Read an array length; alias of [`Reader::read_len`] kept for symmetry with the
    /// array writers.
    pub fn read_array_len(&mut self) -> Result<usize, CodecError> {
        self.read_len()
    }

    /// Run `f` one row or array level deeper, enforcing [`ReaderLimits::max_depth`].
    pub fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, CodecError>,
    ) -> Result<T, CodecError> {
        if self.depth >= self.limits.max_depth {
            return Err(CodecError::NestingTooDeep(self.limits.max_depth));
        }
        self.depth += 1;
        let out = f(self);
        self.depth -= 1;
        out
    }
}
