// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Serializer synthesizer: the ordered write steps for one record.
//!
//! Steps are language-agnostic; [`crate::render`] turns them into Rust and
//! [`crate::dynamic`] executes them directly.

use arow_wire::{DataTypeTag, WireKey};

use crate::classify::{Shape, WireField};
use crate::plan::RecordPlan;

/// When a step writes its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// The member is not optional: always `(key, tag, value)`.
    Always,
    /// The member is an `Option`: `(key, tag, value)` when `Some`, `(key, Null)` otherwise.
    IfPresent,
}

/// One field write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteStep<'a> {
    /// Member read from the record.
    pub member: &'a str,
    /// Backend name, for annotations.
    pub backend: &'a str,
    /// Field key.
    pub key: WireKey,
    /// Tag written when the value is present.
    pub tag: DataTypeTag,
    /// Element tag written after `Array`.
    pub element: Option<DataTypeTag>,
    /// Absent handling.
    pub presence: Presence,
    /// Value layout.
    pub shape: Shape<'a>,
}

/// Serializer program for one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp<'a> {
    /// Write one field.
    Field(WriteStep<'a>),
    /// Write key 0 with no tag.
    EndOfRecord,
}

fn step(field: &WireField) -> WriteStep<'_> {
    WriteStep {
        member: &field.member,
        backend: &field.backend,
        key: field.key,
        tag: field.kind.tag(),
        element: field.kind.element_tag(),
        presence: if field.kind.is_optional() {
            Presence::IfPresent
        } else {
            Presence::Always
        },
        shape: field.kind.shape(),
    }
}

/// One step per participating field in schema order, then the end marker.
pub fn synthesize(plan: &RecordPlan) -> Vec<WriteOp<'_>> {
    plan.fields()
        .iter()
        .map(|f| WriteOp::Field(step(f)))
        .chain(std::iter::once(WriteOp::EndOfRecord))
        .collect()
}
