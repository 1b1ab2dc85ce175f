// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Scalar payloads and the field-level primitives generated code calls.
//!
//! Every scalar kind has a writer `write_<kind>(key, value)` that emits key, tag and
//! payload, and a reader `read_<kind>()` that reads the payload only (the key and tag
//! were already consumed by the read loop).

use std::time::Duration;

use time::OffsetDateTime;
use uuid::Uuid;

use crate::codec::{CodecError, Reader, Writer};
use crate::key::WireKey;
use crate::tag::DataTypeTag;

/// A Rust type with a fixed scalar wire representation.
pub trait WireScalar: Sized {
    /// Tag written ahead of the payload.
    const TAG: DataTypeTag;

    /// Write the bare payload.
    fn write_raw(&self, w: &mut Writer) -> Result<(), CodecError>;

    /// Read the bare payload.
    fn read_raw(r: &mut Reader<'_>) -> Result<Self, CodecError>;
}

macro_rules! le_scalar {
    ($($ty:ty => $tag:ident),* $(,)?) => {
        $(
            impl WireScalar for $ty {
                const TAG: DataTypeTag = DataTypeTag::$tag;

                fn write_raw(&self, w: &mut Writer) -> Result<(), CodecError> {
                    w.write_raw_bytes(&self.to_le_bytes());
                    Ok(())
                }

                fn read_raw(r: &mut Reader<'_>) -> Result<Self, CodecError> {
                    r.take_array().map(<$ty>::from_le_bytes)
                }
            }
        )*
    };
}

le_scalar! {
    i8 => Int8,
    u8 => UInt8,
    i16 => Int16,
    u16 => UInt16,
    i32 => Int32,
    u32 => UInt32,
    i64 => Int64,
    u64 => UInt64,
    f32 => Float32,
    f64 => Float64,
}

impl WireScalar for bool {
    const TAG: DataTypeTag = DataTypeTag::Bool;

    fn write_raw(&self, w: &mut Writer) -> Result<(), CodecError> {
        w.write_raw_u8(u8::from(*self));
        Ok(())
    }

    fn read_raw(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        match r.read_raw_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(CodecError::InvalidBool(other)),
        }
    }
}

impl WireScalar for char {
    const TAG: DataTypeTag = DataTypeTag::Char;

    fn write_raw(&self, w: &mut Writer) -> Result<(), CodecError> {
        w.write_raw_bytes(&u32::from(*self).to_le_bytes());
        Ok(())
    }

    fn read_raw(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        let code = u32::from_le_bytes(r.take_array()?);
        char::from_u32(code).ok_or(CodecError::InvalidChar(code))
    }
}

impl WireScalar for String {
    const TAG: DataTypeTag = DataTypeTag::String;

    fn write_raw(&self, w: &mut Writer) -> Result<(), CodecError> {
        w.write_len_prefixed(self.as_bytes())
    }

    fn read_raw(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        let bytes = r.read_len_prefixed()?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| CodecError::InvalidUtf8)
    }
}

impl WireScalar for Vec<u8> {
    const TAG: DataTypeTag = DataTypeTag::Bytes;

    fn write_raw(&self, w: &mut Writer) -> Result<(), CodecError> {
        w.write_len_prefixed(self)
    }

    fn read_raw(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        r.read_len_prefixed().map(<[u8]>::to_vec)
    }
}

impl WireScalar for OffsetDateTime {
    const TAG: DataTypeTag = DataTypeTag::DateTime;

    fn write_raw(&self, w: &mut Writer) -> Result<(), CodecError> {
        w.write_raw_bytes(&self.unix_timestamp_nanos().to_le_bytes());
        Ok(())
    }

    fn read_raw(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        let nanos = i128::from_le_bytes(r.take_array()?);
        OffsetDateTime::from_unix_timestamp_nanos(nanos)
            .map_err(|_| CodecError::InvalidDateTime(nanos))
    }
}

impl WireScalar for Duration {
    const TAG: DataTypeTag = DataTypeTag::TimeSpan;

    fn write_raw(&self, w: &mut Writer) -> Result<(), CodecError> {
        w.write_raw_bytes(&self.as_secs().to_le_bytes());
        w.write_raw_bytes(&self.subsec_nanos().to_le_bytes());
        Ok(())
    }

    fn read_raw(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        let secs = u64::from_le_bytes(r.take_array()?);
        let nanos = u32::from_le_bytes(r.take_array()?);
        // Duration::new carries excess nanoseconds into seconds and panics on overflow.
        if nanos >= 1_000_000_000 {
            return Err(CodecError::InvalidTimeSpan { secs, nanos });
        }
        Ok(Duration::new(secs, nanos))
    }
}

impl WireScalar for Uuid {
    const TAG: DataTypeTag = DataTypeTag::Guid;

    fn write_raw(&self, w: &mut Writer) -> Result<(), CodecError> {
        w.write_raw_bytes(self.as_bytes());
        Ok(())
    }

    fn read_raw(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        r.take_array().map(Uuid::from_bytes)
    }
}

macro_rules! field_primitives {
    ($($write:ident / $read:ident : $ty:ty),* $(,)?) => {
        impl Writer {
            $(
                #[doc = concat!("Write a `", stringify!($ty), "` field: key, tag, payload.")]
                pub fn $write(&mut self, key: WireKey, value: $ty) -> Result<(), CodecError> {
                    self.write_value(key, &value)
                }
            )*
        }

        impl Reader<'_> {
            $(
                #[doc = concat!("Read a `", stringify!($ty), "` payload.")]
                pub fn $read(&mut self) -> Result<$ty, CodecError> {
                    <$ty as WireScalar>::read_raw(self)
                }
            )*
        }
    };
}

field_primitives! {
    write_bool / read_bool: bool,
    write_char / read_char: char,
    write_i8 / read_i8: i8,
    write_u8 / read_u8: u8,
    write_i16 / read_i16: i16,
    write_u16 / read_u16: u16,
    write_i32 / read_i32: i32,
    write_u32 / read_u32: u32,
    write_i64 / read_i64: i64,
    write_u64 / read_u64: u64,
    write_f32 / read_f32: f32,
    write_f64 / read_f64: f64,
    write_date_time / read_date_time: OffsetDateTime,
    write_time_span / read_time_span: Duration,
    write_guid / read_guid: Uuid,
}

impl Writer {
    /// Write any scalar field: key, tag, payload.
    pub fn write_value<V: WireScalar>(
        &mut self,
        key: WireKey,
        value: &V,
    ) -> Result<(), CodecError> {
        self.write_header(key, V::TAG);
        value.write_raw(self)
    }

    /// Write a string field.
    pub fn write_str(&mut self, key: WireKey, value: &str) -> Result<(), CodecError> {
        self.write_header(key, DataTypeTag::String);
        self.write_len_prefixed(value.as_bytes())
    }

    /// Write a bytes field.
    pub fn write_bytes(&mut self, key: WireKey, value: &[u8]) -> Result<(), CodecError> {
        self.write_header(key, DataTypeTag::Bytes);
        self.write_len_prefixed(value)
    }

    /// Write a scalar array field: key, `Array`, element tag, length, payloads.
    pub fn write_array<V: WireScalar>(
        &mut self,
        key: WireKey,
        values: &[V],
    ) -> Result<(), CodecError> {
        self.write_header(key, DataTypeTag::Array);
        self.write_tag(V::TAG);
        self.write_len(values.len())?;
        for value in values {
            value.write_raw(self)?;
        }
        Ok(())
    }
}

impl Reader<'_> {
    /// Read a string payload.
    pub fn read_string(&mut self) -> Result<String, CodecError> {
        String::read_raw(self)
    }

    /// Read a bytes payload.
    pub fn read_bytes(&mut self) -> Result<Vec<u8>, CodecError> {
        <Vec<u8>>::read_raw(self)
    }

    /// Read any scalar payload.
    pub fn read_value<V: WireScalar>(&mut self) -> Result<V, CodecError> {
        V::read_raw(self)
    }

    /// Read a scalar array body: length then payloads. The element tag has already been
    /// read and checked by the caller.
    pub fn read_array_values<V: WireScalar>(&mut self) -> Result<Vec<V>, CodecError> {
        let len = self.read_array_len()?;
        let mut out = Vec::with_capacity(len.min(self.remaining()));
        for _ in 0..len {
            out.push(V::read_raw(self)?);
        }
        Ok(out)
    }
}

/// Owned scalar of any kind, for callers that only know the tag at runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// `bool`.
    Bool(bool),
    /// `char`.
    Char(char),
    /// UTF-8 string.
    String(String),
    /// Opaque bytes.
    Bytes(Vec<u8>),
    /// `i8`.
    Int8(i8),
    /// `u8`.
    UInt8(u8),
    /// `i16`.
    Int16(i16),
    /// `u16`.
    UInt16(u16),
    /// `i32`.
    Int32(i32),
    /// `u32`.
    UInt32(u32),
    /// `i64`.
    Int64(i64),
    /// `u64`.
    UInt64(u64),
    /// `f32`.
    Float32(f32),
    /// `f64`.
    Float64(f64),
    /// Instant.
    DateTime(OffsetDateTime),
    /// Duration.
    TimeSpan(Duration),
    /// UUID.
    Guid(Uuid),
}

impl Scalar {
    /// Tag this value is written under.
    pub fn tag(&self) -> DataTypeTag {
        match self {
            Scalar::Bool(_) => DataTypeTag::Bool,
            Scalar::Char(_) => DataTypeTag::Char,
            Scalar::String(_) => DataTypeTag::String,
            Scalar::Bytes(_) => DataTypeTag::Bytes,
            Scalar::Int8(_) => DataTypeTag::Int8,
            Scalar::UInt8(_) => DataTypeTag::UInt8,
            Scalar::Int16(_) => DataTypeTag::Int16,
            Scalar::UInt16(_) => DataTypeTag::UInt16,
            Scalar::Int32(_) => DataTypeTag::Int32,
            Scalar::UInt32(_) => DataTypeTag::UInt32,
            Scalar::Int64(_) => DataTypeTag::Int64,
            Scalar::UInt64(_) => DataTypeTag::UInt64,
            Scalar::Float32(_) => DataTypeTag::Float32,
            Scalar::Float64(_) => DataTypeTag::Float64,
            Scalar::DateTime(_) => DataTypeTag::DateTime,
            Scalar::TimeSpan(_) => DataTypeTag::TimeSpan,
            Scalar::Guid(_) => DataTypeTag::Guid,
        }
    }

    /// Write the bare payload.
    pub fn write_raw(&self, w: &mut Writer) -> Result<(), CodecError> {
        match self {
            Scalar::Bool(v) => v.write_raw(w),
            Scalar::Char(v) => v.write_raw(w),
            Scalar::String(v) => v.write_raw(w),
            Scalar::Bytes(v) => v.write_raw(w),
            Scalar::Int8(v) => v.write_raw(w),
            Scalar::UInt8(v) => v.write_raw(w),
            Scalar::Int16(v) => v.write_raw(w),
            Scalar::UInt16(v) => v.write_raw(w),
            Scalar::Int32(v) => v.write_raw(w),
            Scalar::UInt32(v) => v.write_raw(w),
            Scalar::Int64(v) => v.write_raw(w),
            Scalar::UInt64(v) => v.write_raw(w),
            Scalar::Float32(v) => v.write_raw(w),
            Scalar::Float64(v) => v.write_raw(w),
            Scalar::DateTime(v) => v.write_raw(w),
            Scalar::TimeSpan(v) => v.write_raw(w),
            Scalar::Guid(v) => v.write_raw(w),
        }
    }

    /// Write a complete field: key, tag, payload.
    pub fn write_field(&self, w: &mut Writer, key: WireKey) -> Result<(), CodecError> {
        w.write_header(key, self.tag());
        self.write_raw(w)
    }

    /// Read the payload for a scalar `tag`. Returns `None` for `Null`, `Row` and `Array`.
    pub fn read_raw(tag: DataTypeTag, r: &mut Reader<'_>) -> Result<Option<Self>, CodecError> {
        let value = match tag {
            DataTypeTag::Bool => Scalar::Bool(r.read_bool()?),
            DataTypeTag::Char => Scalar::Char(r.read_char()?),
            DataTypeTag::String => Scalar::String(r.read_string()?),
            DataTypeTag::Bytes => Scalar::Bytes(r.read_bytes()?),
            DataTypeTag::Int8 => Scalar::Int8(r.read_i8()?),
            DataTypeTag::UInt8 => Scalar::UInt8(r.read_u8()?),
            DataTypeTag::Int16 => Scalar::Int16(r.read_i16()?),
            DataTypeTag::UInt16 => Scalar::UInt16(r.read_u16()?),
            DataTypeTag::Int32 => Scalar::Int32(r.read_i32()?),
            DataTypeTag::UInt32 => Scalar::UInt32(r.read_u32()?),
            DataTypeTag::Int64 => Scalar::Int64(r.read_i64()?),
            DataTypeTag::UInt64 => Scalar::UInt64(r.read_u64()?),
            DataTypeTag::Float32 => Scalar::Float32(r.read_f32()?),
            DataTypeTag::Float64 => Scalar::Float64(r.read_f64()?),
            DataTypeTag::DateTime => Scalar::DateTime(r.read_date_time()?),
            DataTypeTag::TimeSpan => Scalar::TimeSpan(r.read_time_span()?),
            DataTypeTag::Guid => Scalar::Guid(r.read_guid()?),
            DataTypeTag::Null | DataTypeTag::Row | DataTypeTag::Array => return Ok(None),
        };
        Ok(Some(value))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn field_writer_emits_key_tag_payload() {
        let mut w = Writer::default();
        w.write_i32(WireKey(0x41), -2).unwrap();
        assert_eq!(w.as_bytes(), &[0x41, 9, 0xFE, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn string_and_bytes_are_length_prefixed() {
        let mut w = Writer::default();
        w.write_str(WireKey(0x41), "hi").unwrap();
        w.write_bytes(WireKey(0x42), &[7]).unwrap();
        assert_eq!(w.as_bytes(), &[0x41, 3, 2, b'h', b'i', 0x42, 4, 1, 7]);
    }

    #[test]
    fn scalar_array_layout() {
        let mut w = Writer::default();
        w.write_array(WireKey(0x41), &[1u16, 2]).unwrap();
        assert_eq!(w.as_bytes(), &[0x41, 65, 8, 2, 1, 0, 2, 0]);

        let mut r = Reader::new(&w.as_bytes()[3..]);
        assert_eq!(r.read_array_values::<u16>().unwrap(), vec![1, 2]);
    }

    #[test]
    fn rich_scalars_round_trip() {
        let when = OffsetDateTime::from_unix_timestamp_nanos(1_700_000_000_123_456_789).unwrap();
        let span = Duration::new(90, 5);
        let id = Uuid::from_u128(0x0123_4567_89ab_cdef_0123_4567_89ab_cdef);
        let mut w = Writer::default();
        when.write_raw(&mut w).unwrap();
        span.write_raw(&mut w).unwrap();
        id.write_raw(&mut w).unwrap();
        'é'.write_raw(&mut w).unwrap();
        let bytes = w.into_vec();

        let mut r = Reader::new(&bytes);
        assert_eq!(r.read_date_time().unwrap(), when);
        assert_eq!(r.read_time_span().unwrap(), span);
        assert_eq!(r.read_guid().unwrap(), id);
        assert_eq!(r.read_char().unwrap(), 'é');
        r.finish().unwrap();
    }

    #[test]
    fn invalid_payloads_are_rejected() {
        let mut r = Reader::new(&[2]);
        assert_eq!(r.read_bool(), Err(CodecError::InvalidBool(2)));

        let surrogate = 0xD800u32.to_le_bytes();
        let mut r = Reader::new(&surrogate);
        assert_eq!(r.read_char(), Err(CodecError::InvalidChar(0xD800)));

        let mut r = Reader::new(&[2, 0xC3, 0x28]);
        assert_eq!(r.read_string(), Err(CodecError::InvalidUtf8));
    }

    #[test]
    fn time_span_nanos_must_stay_below_one_second() {
        let mut bytes = 7u64.to_le_bytes().to_vec();
        bytes.extend(1_000_000_000u32.to_le_bytes());
        let mut r = Reader::new(&bytes);
        assert_eq!(
            r.read_time_span(),
            Err(CodecError::InvalidTimeSpan {
                secs: 7,
                nanos: 1_000_000_000
            })
        );
    }

    #[test]
    fn dynamic_scalar_matches_typed_writer() {
        let mut typed = Writer::default();
        typed.write_f64(WireKey(0x46), 1.5).unwrap();
        let mut dynamic = Writer::default();
        Scalar::Float64(1.5)
            .write_field(&mut dynamic, WireKey(0x46))
            .unwrap();
        assert_eq!(typed.as_bytes(), dynamic.as_bytes());

        let mut r = Reader::new(&dynamic.as_bytes()[2..]);
        assert_eq!(
            Scalar::read_raw(DataTypeTag::Float64, &mut r).unwrap(),
            Some(Scalar::Float64(1.5))
        );
    }
}
