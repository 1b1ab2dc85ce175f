// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Type mapping table: semantic scalar type to wire tag, Rust type and the literal
//! `Writer` / `Reader` primitives the renderer emits.

use arow_wire::DataTypeTag;

/// Semantic scalar types with a direct wire representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum ScalarType {
    Bool,
    Char,
    String,
    Bytes,
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float32,
    Float64,
    DateTime,
    TimeSpan,
    Guid,
}

/// One row of the mapping table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeMapping {
    /// Semantic type.
    pub ty: ScalarType,
    /// Type expressions in the IR that select this row.
    pub names: &'static [&'static str],
    /// Tag written ahead of the value.
    pub tag: DataTypeTag,
    /// Rust type of the record member, as a path.
    pub rust_type: &'static str,
    /// `Writer` method taking `(key, value)`.
    pub writer: &'static str,
    /// `Reader` method returning the value.
    pub reader: &'static str,
    /// Writer takes the value by reference (owned heap types).
    pub by_ref: bool,
}

const fn row(
    ty: ScalarType,
    names: &'static [&'static str],
    tag: DataTypeTag,
    rust_type: &'static str,
    writer: &'static str,
    reader: &'static str,
) -> TypeMapping {
    TypeMapping {
        ty,
        names,
        tag,
        rust_type,
        writer,
        reader,
        by_ref: false,
    }
}

const fn by_ref(mapping: TypeMapping) -> TypeMapping {
    TypeMapping {
        by_ref: true,
        ..mapping
    }
}

/// The complete table.
pub static MAPPINGS: [TypeMapping; 17] = [
    row(
        ScalarType::Bool,
        &["bool", "boolean"],
        DataTypeTag::Bool,
        "bool",
        "write_bool",
        "read_bool",
    ),
    row(ScalarType::Char, &["char"], DataTypeTag::Char, "char", "write_char", "read_char"),
    by_ref(row(
        ScalarType::String,
        &["string", "str", "String"],
        DataTypeTag::String,
        "String",
        "write_str",
        "read_string",
    )),
    by_ref(row(
        ScalarType::Bytes,
        &["bytes", "Vec<u8>"],
        DataTypeTag::Bytes,
        "Vec<u8>",
        "write_bytes",
        "read_bytes",
    )),
    row(ScalarType::Int8, &["i8", "int8", "sbyte"], DataTypeTag::Int8, "i8", "write_i8", "read_i8"),
    row(
        ScalarType::UInt8,
        &["u8", "uint8", "byte"],
        DataTypeTag::UInt8,
        "u8",
        "write_u8",
        "read_u8",
    ),
    row(ScalarType::Int16, &["i16", "int16"], DataTypeTag::Int16, "i16", "write_i16", "read_i16"),
    row(
        ScalarType::UInt16,
        &["u16", "uint16"],
        DataTypeTag::UInt16,
        "u16",
        "write_u16",
        "read_u16",
    ),
    row(ScalarType::Int32, &["i32", "int32"], DataTypeTag::Int32, "i32", "write_i32", "read_i32"),
    row(
        ScalarType::UInt32,
        &["u32", "uint32"],
        DataTypeTag::UInt32,
        "u32",
        "write_u32",
        "read_u32",
    ),
    row(ScalarType::Int64, &["i64", "int64"], DataTypeTag::Int64, "i64", "write_i64", "read_i64"),
    row(
        ScalarType::UInt64,
        &["u64", "uint64"],
        DataTypeTag::UInt64,
        "u64",
        "write_u64",
        "read_u64",
    ),
    row(
        ScalarType::Float32,
        &["f32", "float32"],
        DataTypeTag::Float32,
        "f32",
        "write_f32",
        "read_f32",
    ),
    row(
        ScalarType::Float64,
        &["f64", "float64"],
        DataTypeTag::Float64,
        "f64",
        "write_f64",
        "read_f64",
    ),
    row(
        ScalarType::DateTime,
        &["datetime", "DateTime", "OffsetDateTime"],
        DataTypeTag::DateTime,
        "::arow_wire::time::OffsetDateTime",
        "write_date_time",
        "read_date_time",
    ),
    row(
        ScalarType::TimeSpan,
        &["timespan", "TimeSpan", "duration", "Duration"],
        DataTypeTag::TimeSpan,
        "::std::time::Duration",
        "write_time_span",
        "read_time_span",
    ),
    row(
        ScalarType::Guid,
        &["guid", "Guid", "uuid", "Uuid"],
        DataTypeTag::Guid,
        "::arow_wire::uuid::Uuid",
        "write_guid",
        "read_guid",
    ),
];

/// Find the row for an IR type expression.
pub fn lookup(name: &str) -> Option<&'static TypeMapping> {
    let name = name.trim();
    MAPPINGS.iter().find(|m| m.names.contains(&name))
}

impl ScalarType {
    /// The table row for this type.
    pub fn mapping(self) -> &'static TypeMapping {
        // The table lists every variant once, in declaration order.
        &MAPPINGS[self as usize]
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn table_is_in_variant_order() {
        for (i, m) in MAPPINGS.iter().enumerate() {
            assert_eq!(m.ty as usize, i, "{:?}", m.ty);
            assert_eq!(m.ty.mapping(), m);
        }
    }

    #[test]
    fn names_and_tags_are_unique() {
        let mut names = HashSet::new();
        let mut tags = HashSet::new();
        for m in &MAPPINGS {
            assert!(tags.insert(m.tag));
            assert!(m.tag.is_scalar());
            for n in m.names {
                assert!(names.insert(*n), "{n} listed twice");
            }
        }
    }

    #[test]
    fn lookup_resolves_aliases() {
        assert_eq!(lookup("int32").map(|m| m.ty), Some(ScalarType::Int32));
        assert_eq!(lookup(" Vec<u8> ").map(|m| m.ty), Some(ScalarType::Bytes));
        assert_eq!(lookup("uuid").map(|m| m.tag), Some(DataTypeTag::Guid));
        assert!(lookup("string").is_some_and(|m| m.by_ref));
        assert!(lookup("Order").is_none());
    }

    #[test]
    fn rust_types_parse() {
        for m in &MAPPINGS {
            syn::parse_str::<syn::Type>(m.rust_type).unwrap();
            syn::parse_str::<syn::Ident>(m.writer).unwrap();
            syn::parse_str::<syn::Ident>(m.reader).unwrap();
        }
    }
}
