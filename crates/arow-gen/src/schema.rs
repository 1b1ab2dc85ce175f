// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Record schemas as supplied by the schema provider.
//!
//! These are immutable inputs for one generation run. Namespace and record name decide
//! output grouping and the Rust path of the record type; they never reach the wire.

use std::collections::BTreeSet;
use std::fmt;

use crate::error::GenError;

/// Dotted or `::`-separated module path of a record or enum.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Namespace {
    segments: Vec<String>,
}

impl Namespace {
    /// Parse `a.b`, `a::b` or the empty string (root).
    pub fn parse(text: &str) -> Result<Self, GenError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(Self::default());
        }
        let segments = trimmed
            .split("::")
            .flat_map(|part| part.split('.'))
            .map(|segment| {
                let segment = segment.trim();
                ensure_ident(segment)?;
                Ok(segment.to_owned())
            })
            .collect::<Result<Vec<_>, GenError>>()?;
        Ok(Self { segments })
    }

    /// Module path segments, outermost first.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// True for the root namespace.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// `ns::Name`, or just `Name` in the root namespace.
    pub fn qualify(&self, name: &str) -> String {
        if self.is_root() {
            name.to_owned()
        } else {
            format!("{self}::{name}")
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("::"))
    }
}

/// Fail unless `text` parses as a plain (non-keyword) Rust identifier.
pub fn ensure_ident(text: &str) -> Result<(), GenError> {
    syn::parse_str::<syn::Ident>(text)
        .map(|_| ())
        .map_err(|_| GenError::InvalidIdentifier(text.to_owned()))
}

/// One field of a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    /// Rust field name on the record struct.
    pub member: String,
    /// Type expression: a mapping-table name, an enum or record name, `[T]` or `Vec<T>`.
    pub ty: String,
    /// Scalar and enum fields are `Option<_>` when set.
    pub nullable: bool,
    /// Backend name packed into the wire key; `None` keeps the field off the wire.
    pub backend: Option<String>,
}

/// One record type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSchema {
    /// Module path of the record type.
    pub namespace: Namespace,
    /// Type name.
    pub name: String,
    /// Fields in serialization order.
    pub fields: Vec<FieldDef>,
}

impl RecordSchema {
    /// `ns::Name`.
    pub fn qualified_name(&self) -> String {
        self.namespace.qualify(&self.name)
    }
}

/// One enum type usable as a field type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumSchema {
    /// Module path of the enum type.
    pub namespace: Namespace,
    /// Type name.
    pub name: String,
}

impl EnumSchema {
    /// `ns::Name`.
    pub fn qualified_name(&self) -> String {
        self.namespace.qualify(&self.name)
    }
}

/// A declared type a field's type expression resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeTarget<'a> {
    /// A record type.
    Record(&'a RecordSchema),
    /// An enum type.
    Enum(&'a EnumSchema),
}

impl TypeTarget<'_> {
    fn namespace(&self) -> &Namespace {
        match self {
            TypeTarget::Record(r) => &r.namespace,
            TypeTarget::Enum(e) => &e.namespace,
        }
    }

    fn name(&self) -> &str {
        match self {
            TypeTarget::Record(r) => &r.name,
            TypeTarget::Enum(e) => &e.name,
        }
    }
}

/// The ordered set of records (and the enums they refer to) for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaSet {
    records: Vec<RecordSchema>,
    enums: Vec<EnumSchema>,
}

impl SchemaSet {
    /// Validate and wrap a schema source.
    ///
    /// Record and enum names must be identifiers and every qualified name must be
    /// unique across records and enums.
    pub fn new(records: Vec<RecordSchema>, enums: Vec<EnumSchema>) -> Result<Self, GenError> {
        let mut seen = BTreeSet::new();
        let names = records
            .iter()
            .map(|r| (&r.name, r.qualified_name()))
            .chain(enums.iter().map(|e| (&e.name, e.qualified_name())));
        for (name, qualified) in names {
            if name.trim().is_empty() {
                return Err(GenError::Argument("type with an empty name".into()));
            }
            ensure_ident(name)?;
            if !seen.insert(qualified.clone()) {
                return Err(GenError::Argument(format!(
                    "type `{qualified}` is declared more than once"
                )));
            }
        }
        Ok(Self { records, enums })
    }

    /// Records in provider order.
    pub fn records(&self) -> &[RecordSchema] {
        &self.records
    }

    /// Declared enums.
    pub fn enums(&self) -> &[EnumSchema] {
        &self.enums
    }

    /// Resolve a type name used by a field declared in namespace `from`.
    ///
    /// A qualified name (`a::b::Name` or `a.b.Name`) must match exactly. A bare name
    /// prefers `from`, then a single match anywhere else; several matches elsewhere are
    /// ambiguous.
    pub fn resolve(
        &self,
        text: &str,
        from: &Namespace,
    ) -> Result<Option<TypeTarget<'_>>, GenError> {
        let text = text.trim();
        let mut targets = self
            .records
            .iter()
            .map(TypeTarget::Record)
            .chain(self.enums.iter().map(TypeTarget::Enum));

        let split = text
            .rfind("::")
            .map(|at| (at, 2))
            .into_iter()
            .chain(text.rfind('.').map(|at| (at, 1)))
            .max();
        if let Some((at, width)) = split {
            let Ok(namespace) = Namespace::parse(&text[..at]) else {
                return Ok(None);
            };
            let name = &text[at + width..];
            return Ok(targets.find(|t| t.name() == name && *t.namespace() == namespace));
        }

        let matches: Vec<_> = targets.filter(|t| t.name() == text).collect();
        if let Some(local) = matches.iter().find(|t| t.namespace() == from) {
            return Ok(Some(*local));
        }
        match matches.as_slice() {
            [] => Ok(None),
            [only] => Ok(Some(*only)),
            _ => Err(GenError::Argument(format!(
                "type `{text}` is ambiguous; qualify it with its namespace"
            ))),
        }
    }

    /// True when there is nothing to generate.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn namespace_accepts_both_separators() {
        let dotted = Namespace::parse("shop.orders").unwrap();
        let pathed = Namespace::parse("shop::orders").unwrap();
        assert_eq!(dotted, pathed);
        assert_eq!(dotted.to_string(), "shop::orders");
        assert_eq!(dotted.qualify("Order"), "shop::orders::Order");
        assert!(Namespace::parse("").unwrap().is_root());
    }

    #[test]
    fn namespace_rejects_keywords_and_garbage() {
        assert!(matches!(
            Namespace::parse("shop.fn"),
            Err(GenError::InvalidIdentifier(s)) if s == "fn"
        ));
        assert!(Namespace::parse("a..b").is_err());
    }

    #[test]
    fn duplicate_types_are_rejected() {
        let record = RecordSchema {
            namespace: Namespace::parse("a").unwrap(),
            name: "X".into(),
            fields: vec![],
        };
        let err = SchemaSet::new(vec![record.clone(), record], vec![]).unwrap_err();
        assert!(matches!(err, GenError::Argument(msg) if msg.contains("a::X")));
    }

    fn sample() -> SchemaSet {
        let record = |ns: &str, name: &str| RecordSchema {
            namespace: Namespace::parse(ns).unwrap(),
            name: name.into(),
            fields: vec![],
        };
        SchemaSet::new(
            vec![record("a", "Line"), record("b", "Line"), record("b", "Order")],
            vec![EnumSchema {
                namespace: Namespace::parse("b").unwrap(),
                name: "Status".into(),
            }],
        )
        .unwrap()
    }

    #[test]
    fn bare_names_prefer_the_local_namespace() {
        let set = sample();
        let a = Namespace::parse("a").unwrap();
        let c = Namespace::parse("c").unwrap();
        match set.resolve("Line", &a).unwrap() {
            Some(TypeTarget::Record(r)) => assert_eq!(r.qualified_name(), "a::Line"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(set.resolve("Status", &a), Ok(Some(TypeTarget::Enum(_)))));
        assert!(set.resolve("Line", &c).is_err());
        assert_eq!(set.resolve("Nope", &a).unwrap(), None);
    }

    #[test]
    fn qualified_names_match_exactly() {
        let set = sample();
        let root = Namespace::default();
        match set.resolve("b.Line", &root).unwrap() {
            Some(TypeTarget::Record(r)) => assert_eq!(r.qualified_name(), "b::Line"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(set.resolve("a::Order", &root).unwrap().is_none());
    }

    #[test]
    fn enum_and_record_share_the_name_space() {
        let record = RecordSchema {
            namespace: Namespace::default(),
            name: "Kind".into(),
            fields: vec![],
        };
        let en = EnumSchema {
            namespace: Namespace::default(),
            name: "Kind".into(),
        };
        assert!(SchemaSet::new(vec![record], vec![en]).is_err());
    }
}
