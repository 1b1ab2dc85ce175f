// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Deserializer synthesizer: the key-dispatched arms of one record's read loop.

use arow_wire::{DataTypeTag, WireKey};

use crate::classify::{Shape, WireField};
use crate::plan::RecordPlan;

/// One arm of the read loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadArm<'a> {
    /// Field key the arm matches.
    pub key: WireKey,
    /// Member assigned.
    pub member: &'a str,
    /// `Null` clears the member.
    pub accepts_null: bool,
    /// Tag that selects the read path.
    pub expect: DataTypeTag,
    /// Element tag required after `Array`.
    pub element: Option<DataTypeTag>,
    /// Member is an `Option` and a read value is wrapped in `Some`.
    pub optional: bool,
    /// Value layout.
    pub shape: Shape<'a>,
}

/// What the loop does with a field once its key matched an arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Set the member to `None`.
    Clear,
    /// Read a value of the expected tag.
    Read,
    /// Tag is `Array`; the element tag must be read and checked next.
    CheckElement,
    /// Tag does not fit: hand the field to the unknown-value consumer.
    Skip,
}

impl ReadArm<'_> {
    /// Decide on the field tag.
    pub fn decide(&self, tag: DataTypeTag) -> Decision {
        if tag == DataTypeTag::Null && self.accepts_null {
            Decision::Clear
        } else if tag != self.expect {
            Decision::Skip
        } else if self.element.is_some() {
            Decision::CheckElement
        } else {
            Decision::Read
        }
    }

    /// Whether an array's element tag fits this arm.
    pub fn accepts_element(&self, element: DataTypeTag) -> bool {
        self.element == Some(element)
    }
}

/// The read loop of one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadLoop<'a> {
    /// Arms in schema order.
    pub arms: Vec<ReadArm<'a>>,
}

impl<'a> ReadLoop<'a> {
    /// Arm for a key.
    pub fn arm(&self, key: WireKey) -> Option<&ReadArm<'a>> {
        self.arms.iter().find(|a| a.key == key)
    }

    /// Any arm reads an element tag, so the loop has to remember it for the skip path.
    pub fn reads_elements(&self) -> bool {
        self.arms.iter().any(|a| a.element.is_some())
    }
}

fn arm(field: &WireField) -> ReadArm<'_> {
    let optional = field.kind.is_optional();
    ReadArm {
        key: field.key,
        member: &field.member,
        accepts_null: optional,
        expect: field.kind.tag(),
        element: field.kind.element_tag(),
        optional,
        shape: field.kind.shape(),
    }
}

/// One arm per participating field.
pub fn synthesize(plan: &RecordPlan) -> ReadLoop<'_> {
    ReadLoop {
        arms: plan.fields().iter().map(arm).collect(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ir::load_schema;
    use crate::plan::PlanSet;

    fn person() -> PlanSet {
        let set = load_schema(
            r#"{ "ir_version": "arow-ir/v1", "records": [
                { "name": "Tag", "fields": [] },
                { "name": "Person", "fields": [
                    { "name": "id", "type": "i32", "backend": "ID" },
                    { "name": "name", "type": "string", "nullable": true, "backend": "NM" },
                    { "name": "tags", "type": "[Tag]", "backend": "TG" }
                ] } ] }"#,
        )
        .unwrap();
        PlanSet::build(&set).unwrap()
    }

    #[test]
    fn non_nullable_scalar_never_accepts_null() {
        let plans = person();
        let read = synthesize(plans.by_name("Person").unwrap());
        let id = read.arm(WireKey(0x4944)).unwrap();
        assert_eq!(id.decide(DataTypeTag::Int32), Decision::Read);
        assert_eq!(id.decide(DataTypeTag::Null), Decision::Skip);
        assert_eq!(id.decide(DataTypeTag::Int64), Decision::Skip);
    }

    #[test]
    fn nullable_and_compound_fields_clear_on_null() {
        let plans = person();
        let read = synthesize(plans.by_name("Person").unwrap());
        let name = read.arm(WireKey(0x4e4d)).unwrap();
        assert_eq!(name.decide(DataTypeTag::Null), Decision::Clear);
        assert_eq!(name.decide(DataTypeTag::String), Decision::Read);

        let tags = read.arm(WireKey(0x5447)).unwrap();
        assert_eq!(tags.decide(DataTypeTag::Null), Decision::Clear);
        assert_eq!(tags.decide(DataTypeTag::Array), Decision::CheckElement);
        assert_eq!(tags.decide(DataTypeTag::Row), Decision::Skip);
        assert!(tags.accepts_element(DataTypeTag::Row));
        assert!(!tags.accepts_element(DataTypeTag::Int32));
        assert!(read.reads_elements());
    }

    #[test]
    fn unknown_keys_have_no_arm() {
        let plans = person();
        let read = synthesize(plans.by_name("Person").unwrap());
        assert!(read.arm(WireKey(0x5a)).is_none());
        assert!(synthesize(plans.by_name("Tag").unwrap()).arms.is_empty());
    }
}
