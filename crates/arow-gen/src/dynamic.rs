// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Plan-interpreting codec.
//!
//! Runs the same write steps and read arms the renderer turns into Rust, directly over a
//! [`PlanSet`]. Used by `arow-gen decode` to inspect payloads without compiling generated
//! code, and by tests to check generated code against the plans it came from.

use std::collections::BTreeMap;

use arow_wire::{CodecError, DataTypeTag, Reader, ReaderLimits, Scalar, Writer};
use serde_json::{json, Value};
use time::format_description::well_known::Rfc3339;

use crate::classify::{Shape, TypePath};
use crate::deserializer::{self, Decision};
use crate::error::GenError;
use crate::plan::{PlanSet, RecordPlan};
use crate::serializer::{self, Presence, WriteOp};

/// A field value with no static Rust type behind it.
#[derive(Debug, Clone, PartialEq)]
pub enum DynamicValue {
    /// Explicit absent value.
    Null,
    /// Scalar field.
    Scalar(Scalar),
    /// Enum discriminant.
    Enum(i32),
    /// Nested record.
    Row(DynamicRow),
    /// Array or list of records.
    Rows(Vec<DynamicRow>),
    /// Array or list of scalars.
    Scalars(Vec<Scalar>),
}

/// A record as member → value. Members never seen on the wire are absent.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicRow {
    /// Record type.
    pub record: TypePath,
    /// Field values by member name.
    pub fields: BTreeMap<String, DynamicValue>,
}

impl DynamicRow {
    /// Empty row of `record`.
    pub fn new(record: TypePath) -> Self {
        Self {
            record,
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field setter.
    pub fn with(mut self, member: &str, value: DynamicValue) -> Self {
        self.fields.insert(member.to_owned(), value);
        self
    }

    /// JSON view: an object of members; nested records become nested objects.
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.fields
                .iter()
                .map(|(member, value)| (member.clone(), value.to_json()))
                .collect(),
        )
    }
}

impl DynamicValue {
    /// JSON view of this value.
    pub fn to_json(&self) -> Value {
        match self {
            DynamicValue::Null => Value::Null,
            DynamicValue::Scalar(s) => scalar_json(s),
            DynamicValue::Enum(v) => json!(v),
            DynamicValue::Row(row) => row.to_json(),
            DynamicValue::Rows(rows) => rows.iter().map(DynamicRow::to_json).collect(),
            DynamicValue::Scalars(values) => values.iter().map(scalar_json).collect(),
        }
    }
}

fn scalar_json(scalar: &Scalar) -> Value {
    match scalar {
        Scalar::Bool(v) => json!(v),
        Scalar::Char(v) => json!(v.to_string()),
        Scalar::String(v) => json!(v),
        Scalar::Bytes(v) => json!(v),
        Scalar::Int8(v) => json!(v),
        Scalar::UInt8(v) => json!(v),
        Scalar::Int16(v) => json!(v),
        Scalar::UInt16(v) => json!(v),
        Scalar::Int32(v) => json!(v),
        Scalar::UInt32(v) => json!(v),
        Scalar::Int64(v) => json!(v),
        Scalar::UInt64(v) => json!(v),
        Scalar::Float32(v) => json!(v),
        Scalar::Float64(v) => json!(v),
        Scalar::DateTime(v) => v
            .format(&Rfc3339)
            .map_or_else(|_| json!(v.unix_timestamp_nanos().to_string()), Value::String),
        Scalar::TimeSpan(v) => json!({ "secs": v.as_secs(), "nanos": v.subsec_nanos() }),
        Scalar::Guid(v) => json!(v.hyphenated().to_string()),
    }
}

/// Encoder/decoder driven by record plans.
#[derive(Debug, Clone, Copy)]
pub struct DynamicCodec<'p> {
    plans: &'p PlanSet,
    limits: ReaderLimits,
}

impl<'p> DynamicCodec<'p> {
    /// Codec over `plans` with default reader limits.
    pub fn new(plans: &'p PlanSet) -> Self {
        Self {
            plans,
            limits: ReaderLimits::default(),
        }
    }

    /// Override reader limits.
    pub fn with_limits(mut self, limits: ReaderLimits) -> Self {
        self.limits = limits;
        self
    }

    fn plan(&self, path: &TypePath) -> Result<&'p RecordPlan, CodecError> {
        self.plans
            .get(path)
            .ok_or(CodecError::UnregisteredType("record outside the plan set"))
    }

    /// Decode one top-level record of `plan`, rejecting trailing bytes.
    pub fn decode(&self, plan: &RecordPlan, bytes: &[u8]) -> Result<DynamicRow, GenError> {
        let mut r = Reader::with_limits(bytes, self.limits);
        let row = r.nested(|r| self.read_row(plan, r))?;
        r.finish()?;
        Ok(row)
    }

    fn read_row(&self, plan: &RecordPlan, r: &mut Reader<'_>) -> Result<DynamicRow, CodecError> {
        let read_loop = deserializer::synthesize(plan);
        let mut row = DynamicRow::new(plan.path.clone());
        loop {
            let key = r.read_name()?;
            if key.is_end() {
                return Ok(row);
            }
            let tag = r.read_tag()?;
            let mut inner = None;
            if let Some(arm) = read_loop.arm(key) {
                match arm.decide(tag) {
                    Decision::Clear => {
                        row.fields.insert(arm.member.to_owned(), DynamicValue::Null);
                        continue;
                    }
                    Decision::Read => {
                        let value = self.read_value(arm.shape, tag, r)?;
                        row.fields.insert(arm.member.to_owned(), value);
                        continue;
                    }
                    Decision::CheckElement => {
                        let element = r.read_tag()?;
                        if arm.accepts_element(element) {
                            let value = self.read_elements(arm.shape, element, r)?;
                            row.fields.insert(arm.member.to_owned(), value);
                            continue;
                        }
                        inner = Some(element);
                    }
                    Decision::Skip => {}
                }
            }
            r.consume_unmatched(key, tag, inner)?;
        }
    }

    fn read_value(
        &self,
        shape: Shape<'_>,
        tag: DataTypeTag,
        r: &mut Reader<'_>,
    ) -> Result<DynamicValue, CodecError> {
        Ok(match shape {
            Shape::Enum(_) => DynamicValue::Enum(r.read_i32()?),
            Shape::Row(path) => {
                let plan = self.plan(path)?;
                DynamicValue::Row(r.nested(|r| self.read_row(plan, r))?)
            }
            _ => match Scalar::read_raw(tag, r)? {
                Some(s) => DynamicValue::Scalar(s),
                None => return Err(CodecError::UnknownTag(tag.code())),
            },
        })
    }

    fn read_elements(
        &self,
        shape: Shape<'_>,
        element: DataTypeTag,
        r: &mut Reader<'_>,
    ) -> Result<DynamicValue, CodecError> {
        let len = r.read_array_len()?;
        if let Shape::RowSeq { element: path, .. } = shape {
            let plan = self.plan(path)?;
            let mut rows = Vec::with_capacity(len.min(r.remaining()));
            for _ in 0..len {
                rows.push(r.nested(|r| self.read_row(plan, r))?);
            }
            return Ok(DynamicValue::Rows(rows));
        }
        let mut values = Vec::with_capacity(len.min(r.remaining()));
        for _ in 0..len {
            match Scalar::read_raw(element, r)? {
                Some(s) => values.push(s),
                None => return Err(CodecError::UnknownTag(element.code())),
            }
        }
        Ok(DynamicValue::Scalars(values))
    }

    /// Encode `row` with the plan of its record type.
    pub fn encode(&self, row: &DynamicRow) -> Result<Vec<u8>, GenError> {
        let mut w = Writer::default();
        self.write_row(row, &mut w)?;
        Ok(w.into_vec())
    }

    fn write_row(&self, row: &DynamicRow, w: &mut Writer) -> Result<(), GenError> {
        let plan = self.plan(&row.record)?;
        for op in serializer::synthesize(plan) {
            let step = match op {
                WriteOp::Field(step) => step,
                WriteOp::EndOfRecord => {
                    w.write_end();
                    continue;
                }
            };
            let mismatch = || {
                GenError::Argument(format!(
                    "{}.{}: value does not fit a {:?} field",
                    row.record, step.member, step.tag
                ))
            };
            match (row.fields.get(step.member), step.presence) {
                (None | Some(DynamicValue::Null), Presence::IfPresent) => w.write_null(step.key),
                (None | Some(DynamicValue::Null), Presence::Always) => {
                    return Err(GenError::Argument(format!(
                        "{}.{}: required member has no value",
                        row.record, step.member
                    )))
                }
                (Some(DynamicValue::Scalar(s)), _) if s.tag() == step.tag => {
                    s.write_field(w, step.key)?;
                }
                (Some(DynamicValue::Enum(v)), _) if matches!(step.shape, Shape::Enum(_)) => {
                    w.write_i32(step.key, *v)?;
                }
                (Some(DynamicValue::Row(nested)), _)
                    if matches!(step.shape, Shape::Row(p) if *p == nested.record) =>
                {
                    w.write_header(step.key, DataTypeTag::Row);
                    self.write_row(nested, w)?;
                }
                (Some(DynamicValue::Rows(rows)), _) => {
                    let Shape::RowSeq { element, .. } = step.shape else {
                        return Err(mismatch());
                    };
                    w.write_header(step.key, DataTypeTag::Array);
                    w.write_tag(DataTypeTag::Row);
                    w.write_len(rows.len())?;
                    for nested in rows {
                        if nested.record != *element {
                            return Err(mismatch());
                        }
                        self.write_row(nested, w)?;
                    }
                }
                (Some(DynamicValue::Scalars(values)), _) => {
                    let Shape::ScalarSeq { mapping, .. } = step.shape else {
                        return Err(mismatch());
                    };
                    w.write_header(step.key, DataTypeTag::Array);
                    w.write_tag(mapping.tag);
                    w.write_len(values.len())?;
                    for value in values {
                        if value.tag() != mapping.tag {
                            return Err(mismatch());
                        }
                        value.write_raw(w)?;
                    }
                }
                _ => return Err(mismatch()),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use arow_wire::WireKey;

    use super::*;
    use crate::ir::load_schema;

    const IR: &str = r#"{ "ir_version": "arow-ir/v1",
        "enums": [ { "name": "Mode" } ],
        "records": [
            { "name": "Tag", "fields": [ { "name": "label", "type": "string", "backend": "LB" } ] },
            { "name": "Person", "fields": [
                { "name": "id", "type": "i32", "backend": "ID" },
                { "name": "name", "type": "string", "nullable": true, "backend": "NM" },
                { "name": "mode", "type": "Mode", "backend": "MD" },
                { "name": "tags", "type": "Vec<Tag>", "backend": "TG" },
                { "name": "scores", "type": "[f32]", "backend": "SC" }
            ] } ] }"#;

    fn plans() -> PlanSet {
        PlanSet::build(&load_schema(IR).unwrap()).unwrap()
    }

    #[test]
    fn id_and_name_bytes() {
        let set = load_schema(
            r#"{ "ir_version": "arow-ir/v1", "records": [ { "name": "P", "fields": [
                { "name": "id", "type": "i32", "backend": "ID" },
                { "name": "name", "type": "string", "nullable": true, "backend": "NM" } ] } ] }"#,
        )
        .unwrap();
        let small = PlanSet::build(&set).unwrap();
        let codec = DynamicCodec::new(&small);
        let plan = small.by_name("P").unwrap();

        let row = DynamicRow::new(plan.path.clone())
            .with("id", DynamicValue::Scalar(Scalar::Int32(5)))
            .with("name", DynamicValue::Null);
        let bytes = codec.encode(&row).unwrap();
        let mut expected = vec![0xc4, 0x92, 0x01, 9, 5, 0, 0, 0];
        expected.extend([0xcd, 0x9c, 0x01, 0, 0]);
        assert_eq!(bytes, expected);
        assert_eq!(codec.decode(plan, &bytes).unwrap(), row);
    }

    #[test]
    fn nested_round_trip_and_json() {
        let plans = plans();
        let codec = DynamicCodec::new(&plans);
        let person = plans.by_name("Person").unwrap();
        let tag = plans.by_name("Tag").unwrap();
        let row = DynamicRow::new(person.path.clone())
            .with("id", DynamicValue::Scalar(Scalar::Int32(1)))
            .with("name", DynamicValue::Scalar(Scalar::String("Ada".into())))
            .with("mode", DynamicValue::Enum(2))
            .with(
                "tags",
                DynamicValue::Rows(vec![DynamicRow::new(tag.path.clone())
                    .with("label", DynamicValue::Scalar(Scalar::String("x".into())))]),
            )
            .with("scores", DynamicValue::Scalars(vec![Scalar::Float32(0.5)]));
        let bytes = codec.encode(&row).unwrap();
        let back = codec.decode(person, &bytes).unwrap();
        assert_eq!(back, row);
        assert_eq!(
            back.to_json(),
            json!({
                "id": 1,
                "name": "Ada",
                "mode": 2,
                "tags": [ { "label": "x" } ],
                "scores": [0.5]
            })
        );
    }

    #[test]
    fn unknown_and_mistyped_fields_are_skipped() {
        let plans = plans();
        let codec = DynamicCodec::new(&plans);
        let person = plans.by_name("Person").unwrap();
        let mut w = Writer::default();
        w.write_str(WireKey(0x5858), "junk").unwrap();
        w.write_str(WireKey::encode("ID").unwrap(), "not an int").unwrap();
        w.write_array(WireKey::encode("SC").unwrap(), &[1i64, 2]).unwrap();
        w.write_i32(WireKey::encode("ID").unwrap(), 7).unwrap();
        w.write_end();
        let row = codec.decode(person, w.as_bytes()).unwrap();
        assert_eq!(row.fields.len(), 1);
        assert_eq!(row.fields["id"], DynamicValue::Scalar(Scalar::Int32(7)));
    }

    #[test]
    fn required_members_must_be_set() {
        let plans = plans();
        let codec = DynamicCodec::new(&plans);
        let row = DynamicRow::new(plans.by_name("Person").unwrap().path.clone());
        assert!(matches!(
            codec.encode(&row),
            Err(GenError::Argument(msg)) if msg.contains("Person.id")
        ));
    }

    #[test]
    fn depth_limit_applies() {
        let plans = plans();
        let codec = DynamicCodec::new(&plans).with_limits(ReaderLimits {
            max_depth: 1,
            ..ReaderLimits::default()
        });
        let person = plans.by_name("Person").unwrap();
        let mut w = Writer::default();
        w.write_header(WireKey::encode("TG").unwrap(), DataTypeTag::Array);
        w.write_tag(DataTypeTag::Row);
        w.write_len(1).unwrap();
        w.write_end();
        w.write_end();
        assert!(matches!(
            codec.decode(person, w.as_bytes()),
            Err(GenError::Codec(CodecError::NestingTooDeep(1)))
        ));
    }

    proptest::proptest! {
        #[test]
        fn encoded_rows_decode_unchanged(
            id in proptest::num::i32::ANY,
            name in proptest::option::of("[a-zA-Z ]{0,12}"),
            mode in proptest::num::i32::ANY,
            labels in proptest::collection::vec(".{0,8}", 0..4),
            scores in proptest::collection::vec(-1.0e6f32..1.0e6, 0..6),
        ) {
            let plans = plans();
            let codec = DynamicCodec::new(&plans);
            let person = plans.by_name("Person").unwrap();
            let tag = plans.by_name("Tag").unwrap();
            let row = DynamicRow::new(person.path.clone())
                .with("id", DynamicValue::Scalar(Scalar::Int32(id)))
                .with(
                    "name",
                    name.map_or(DynamicValue::Null, |n| DynamicValue::Scalar(Scalar::String(n))),
                )
                .with("mode", DynamicValue::Enum(mode))
                .with(
                    "tags",
                    DynamicValue::Rows(
                        labels
                            .into_iter()
                            .map(|l| {
                                DynamicRow::new(tag.path.clone())
                                    .with("label", DynamicValue::Scalar(Scalar::String(l)))
                            })
                            .collect(),
                    ),
                )
                .with(
                    "scores",
                    DynamicValue::Scalars(scores.into_iter().map(Scalar::Float32).collect()),
                );
            let bytes = codec.encode(&row).unwrap();
            proptest::prop_assert_eq!(codec.decode(person, &bytes).unwrap(), row);
        }
    }
}
