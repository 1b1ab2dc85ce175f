// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Field classifier.
//!
//! Decides whether a field participates on the wire and, if it does, which kind of
//! field it is. Excluded fields are dropped before their type is looked at, so a field
//! of an unsupported type is fine as long as it has no backend name.

use std::fmt;

use arow_wire::{DataTypeTag, WireKey};

use crate::error::GenError;
use crate::schema::{ensure_ident, FieldDef, Namespace, RecordSchema, SchemaSet, TypeTarget};
use crate::types::{lookup, TypeMapping};

/// Fully qualified name of a declared record or enum.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypePath {
    /// Module path.
    pub namespace: Namespace,
    /// Type name.
    pub name: String,
}

impl fmt::Display for TypePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.namespace.qualify(&self.name))
    }
}

impl From<TypeTarget<'_>> for TypePath {
    fn from(target: TypeTarget<'_>) -> Self {
        match target {
            TypeTarget::Record(r) => Self {
                namespace: r.namespace.clone(),
                name: r.name.clone(),
            },
            TypeTarget::Enum(e) => Self {
                namespace: e.namespace.clone(),
                name: e.name.clone(),
            },
        }
    }
}

/// What a participating field is, as far as the wire is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// Always written with the scalar's tag.
    Scalar(&'static TypeMapping),
    /// `Option<scalar>`; `None` travels as `Null`.
    NullableScalar(&'static TypeMapping),
    /// Enum written as `Int32`.
    Enum(TypePath),
    /// `Option<enum>`.
    NullableEnum(TypePath),
    /// `Option<Box<Record>>` written as `Row`.
    NestedRecord(TypePath),
    /// `Option<Box<[Record]>>` written as `Array` of `Row`.
    ArrayOfRecord(TypePath),
    /// `Option<Vec<Record>>` written as `Array` of `Row`.
    ListOfRecord(TypePath),
    /// `Option<Box<[scalar]>>` written as `Array` of the scalar's tag.
    ArrayOfScalar(&'static TypeMapping),
    /// `Option<Vec<scalar>>` written as `Array` of the scalar's tag.
    ListOfScalar(&'static TypeMapping),
}

impl FieldKind {
    /// The field may be absent and then travels as `Null`.
    pub fn is_optional(&self) -> bool {
        !matches!(self, FieldKind::Scalar(_) | FieldKind::Enum(_))
    }

    /// Tag the field value is written under.
    pub fn tag(&self) -> DataTypeTag {
        match self {
            FieldKind::Scalar(m) | FieldKind::NullableScalar(m) => m.tag,
            FieldKind::Enum(_) | FieldKind::NullableEnum(_) => DataTypeTag::Int32,
            FieldKind::NestedRecord(_) => DataTypeTag::Row,
            FieldKind::ArrayOfRecord(_)
            | FieldKind::ListOfRecord(_)
            | FieldKind::ArrayOfScalar(_)
            | FieldKind::ListOfScalar(_) => DataTypeTag::Array,
        }
    }

    /// Element tag following an `Array` tag.
    pub fn element_tag(&self) -> Option<DataTypeTag> {
        match self {
            FieldKind::ArrayOfRecord(_) | FieldKind::ListOfRecord(_) => Some(DataTypeTag::Row),
            FieldKind::ArrayOfScalar(m) | FieldKind::ListOfScalar(m) => Some(m.tag),
            _ => None,
        }
    }

    /// Value shape, dropping the nullability distinction.
    pub fn shape(&self) -> Shape<'_> {
        match self {
            FieldKind::Scalar(m) | FieldKind::NullableScalar(m) => Shape::Scalar(m),
            FieldKind::Enum(p) | FieldKind::NullableEnum(p) => Shape::Enum(p),
            FieldKind::NestedRecord(p) => Shape::Row(p),
            FieldKind::ArrayOfRecord(p) => Shape::RowSeq { element: p, list: false },
            FieldKind::ListOfRecord(p) => Shape::RowSeq { element: p, list: true },
            FieldKind::ArrayOfScalar(m) => Shape::ScalarSeq { mapping: m, list: false },
            FieldKind::ListOfScalar(m) => Shape::ScalarSeq { mapping: m, list: true },
        }
    }

    /// Record type this field embeds, if any.
    pub fn record(&self) -> Option<&TypePath> {
        match self {
            FieldKind::NestedRecord(p)
            | FieldKind::ArrayOfRecord(p)
            | FieldKind::ListOfRecord(p) => Some(p),
            _ => None,
        }
    }
}

/// How a field value is laid out, shared by the write and read synthesizers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape<'a> {
    /// One scalar payload.
    Scalar(&'static TypeMapping),
    /// `Int32` discriminant.
    Enum(&'a TypePath),
    /// Nested record.
    Row(&'a TypePath),
    /// Records; `list` selects `Vec` over a boxed slice.
    RowSeq {
        /// Element record type.
        element: &'a TypePath,
        /// `Vec<T>` rather than `Box<[T]>`.
        list: bool,
    },
    /// Scalars; `list` selects `Vec` over a boxed slice.
    ScalarSeq {
        /// Element scalar type.
        mapping: &'static TypeMapping,
        /// `Vec<T>` rather than `Box<[T]>`.
        list: bool,
    },
}

/// A field that participates on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireField {
    /// Rust member name.
    pub member: String,
    /// Backend name as declared.
    pub backend: String,
    /// Packed backend name.
    pub key: WireKey,
    /// Classified kind.
    pub kind: FieldKind,
}

enum TypeExpr<'a> {
    Named(&'a str),
    Array(&'a str),
    List(&'a str),
}

fn parse_expr(text: &str) -> TypeExpr<'_> {
    let text = text.trim();
    if let Some(inner) = text.strip_prefix('[').and_then(|t| t.strip_suffix(']')) {
        return TypeExpr::Array(inner.trim());
    }
    let list = ["Vec<", "List<"]
        .iter()
        .find_map(|open| text.strip_prefix(open).and_then(|t| t.strip_suffix('>')));
    match list {
        Some(inner) => TypeExpr::List(inner.trim()),
        None => TypeExpr::Named(text),
    }
}

/// Wire key of `field`, or `None` when the field stays off the wire.
///
/// No backend name, a blank one, or one that packs to key 0 all mean excluded.
pub fn participation(record: &RecordSchema, field: &FieldDef) -> Result<Option<WireKey>, GenError> {
    let Some(backend) = field.backend.as_deref() else {
        return Ok(None);
    };
    if backend.trim().is_empty() {
        return Ok(None);
    }
    let key = WireKey::encode(backend).map_err(|source| GenError::NameEncoding {
        record: record.qualified_name(),
        field: field.member.clone(),
        source,
    })?;
    Ok((!key.is_end()).then_some(key))
}

/// Kind of a participating field.
pub fn classify_kind(
    set: &SchemaSet,
    record: &RecordSchema,
    field: &FieldDef,
) -> Result<FieldKind, GenError> {
    if let Some(mapping) = lookup(&field.ty) {
        return Ok(if field.nullable {
            FieldKind::NullableScalar(mapping)
        } else {
            FieldKind::Scalar(mapping)
        });
    }

    let unsupported = || GenError::UnsupportedMemberType {
        record: record.qualified_name(),
        field: field.member.clone(),
        ty: field.ty.clone(),
    };
    let ns = &record.namespace;
    let kind = match parse_expr(&field.ty) {
        TypeExpr::Named(name) => match set.resolve(name, ns)? {
            Some(target @ TypeTarget::Enum(_)) if field.nullable => {
                FieldKind::NullableEnum(target.into())
            }
            Some(target @ TypeTarget::Enum(_)) => FieldKind::Enum(target.into()),
            Some(target @ TypeTarget::Record(_)) => FieldKind::NestedRecord(target.into()),
            None => return Err(unsupported()),
        },
        TypeExpr::Array(inner) => match element(set, ns, inner)? {
            Some(Element::Record(path)) => FieldKind::ArrayOfRecord(path),
            Some(Element::Scalar(mapping)) => FieldKind::ArrayOfScalar(mapping),
            None => return Err(unsupported()),
        },
        TypeExpr::List(inner) => match element(set, ns, inner)? {
            Some(Element::Record(path)) => FieldKind::ListOfRecord(path),
            Some(Element::Scalar(mapping)) => FieldKind::ListOfScalar(mapping),
            None => return Err(unsupported()),
        },
    };
    Ok(kind)
}

enum Element {
    Record(TypePath),
    Scalar(&'static TypeMapping),
}

fn element(set: &SchemaSet, ns: &Namespace, inner: &str) -> Result<Option<Element>, GenError> {
    if let Some(target @ TypeTarget::Record(_)) = set.resolve(inner, ns)? {
        return Ok(Some(Element::Record(target.into())));
    }
    Ok(lookup(inner).map(Element::Scalar))
}

/// Classify one field. `Ok(None)` means the field is excluded from the wire.
pub fn classify(
    set: &SchemaSet,
    record: &RecordSchema,
    field: &FieldDef,
) -> Result<Option<WireField>, GenError> {
    let Some(key) = participation(record, field)? else {
        return Ok(None);
    };
    ensure_ident(&field.member)?;
    let kind = classify_kind(set, record, field)?;
    Ok(Some(WireField {
        member: field.member.clone(),
        backend: field.backend.clone().unwrap_or_default(),
        key,
        kind,
    }))
}
