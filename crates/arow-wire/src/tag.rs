// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Data type tags written ahead of every field value.

use crate::codec::CodecError;

/// Wire-level type marker.
///
/// Discriminants are part of the format and must never be renumbered.
#[repr(u8)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum DataTypeTag {
    /// Explicit absent value; no payload follows.
    Null = 0,
    /// `bool`, one byte.
    Bool = 1,
    /// `char`, u32 scalar value.
    Char = 2,
    /// UTF-8 string, length-prefixed.
    String = 3,
    /// Opaque bytes, length-prefixed.
    Bytes = 4,
    /// `i8`.
    Int8 = 5,
    /// `u8`.
    UInt8 = 6,
    /// `i16`.
    Int16 = 7,
    /// `u16`.
    UInt16 = 8,
    /// `i32`.
    Int32 = 9,
    /// `u32`.
    UInt32 = 10,
    /// `i64`.
    Int64 = 11,
    /// `u64`.
    UInt64 = 12,
    /// `f32`.
    Float32 = 13,
    /// `f64`.
    Float64 = 14,
    /// Instant as i128 Unix nanoseconds.
    DateTime = 15,
    /// Duration as u64 seconds + u32 nanoseconds.
    TimeSpan = 16,
    /// 16-byte UUID.
    Guid = 17,
    /// Nested record terminated by key 0.
    Row = 64,
    /// Element tag, length, then that many elements.
    Array = 65,
}

impl DataTypeTag {
    /// Every tag, in discriminant order.
    pub const ALL: [DataTypeTag; 20] = [
        DataTypeTag::Null,
        DataTypeTag::Bool,
        DataTypeTag::Char,
        DataTypeTag::String,
        DataTypeTag::Bytes,
        DataTypeTag::Int8,
        DataTypeTag::UInt8,
        DataTypeTag::Int16,
        DataTypeTag::UInt16,
        DataTypeTag::Int32,
        DataTypeTag::UInt32,
        DataTypeTag::Int64,
        DataTypeTag::UInt64,
        DataTypeTag::Float32,
        DataTypeTag::Float64,
        DataTypeTag::DateTime,
        DataTypeTag::TimeSpan,
        DataTypeTag::Guid,
        DataTypeTag::Row,
        DataTypeTag::Array,
    ];

    /// Raw tag byte.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Payload width for fixed-size tags, `None` for variable-size ones.
    pub fn fixed_width(self) -> Option<usize> {
        match self {
            DataTypeTag::Null => Some(0),
            DataTypeTag::Bool | DataTypeTag::Int8 | DataTypeTag::UInt8 => Some(1),
            DataTypeTag::Int16 | DataTypeTag::UInt16 => Some(2),
            DataTypeTag::Char
            | DataTypeTag::Int32
            | DataTypeTag::UInt32
            | DataTypeTag::Float32 => Some(4),
            DataTypeTag::Int64 | DataTypeTag::UInt64 | DataTypeTag::Float64 => Some(8),
            DataTypeTag::TimeSpan => Some(12),
            DataTypeTag::DateTime | DataTypeTag::Guid => Some(16),
            DataTypeTag::String | DataTypeTag::Bytes | DataTypeTag::Row | DataTypeTag::Array => {
                None
            }
        }
    }

    /// True for tags that carry a single primitive value.
    pub fn is_scalar(self) -> bool {
        !matches!(
            self,
            DataTypeTag::Null | DataTypeTag::Row | DataTypeTag::Array
        )
    }
}

impl TryFrom<u8> for DataTypeTag {
    type Error = CodecError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        DataTypeTag::ALL
            .iter()
            .copied()
            .find(|tag| tag.code() == code)
            .ok_or(CodecError::UnknownTag(code))
    }
}

impl std::fmt::Display for DataTypeTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip() {
        for tag in DataTypeTag::ALL {
            assert_eq!(DataTypeTag::try_from(tag.code()), Ok(tag));
        }
    }

    #[test]
    fn unknown_code_is_rejected() {
        assert_eq!(DataTypeTag::try_from(200), Err(CodecError::UnknownTag(200)));
    }

    #[test]
    fn compound_tags_have_no_fixed_width() {
        assert_eq!(DataTypeTag::Row.fixed_width(), None);
        assert_eq!(DataTypeTag::Array.fixed_width(), None);
        assert_eq!(DataTypeTag::Null.fixed_width(), Some(0));
        assert!(!DataTypeTag::Null.is_scalar());
        assert!(DataTypeTag::Guid.is_scalar());
    }
}
